//! Template definitions and conversion of template functions into call nodes.
//!
//! A template is a published contract exposing functions. Functions whose
//! first argument is `self` are methods and must be invoked on a component;
//! the others are constructors or static functions called on the template.

use serde::{Deserialize, Serialize};

use crate::edge::RETURN_HANDLE;
use crate::id::NodeId;
use crate::node::{CallMetadata, InputParam, OperationKind, OperationNode, OutputParam};
use crate::types::ParamType;

/// One argument of a template function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgDef {
    pub name: String,
    pub arg_type: ParamType,
}

/// A function exported by a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ArgDef>,
    pub output: ParamType,
}

impl FunctionDef {
    /// Returns `true` if the function takes `self` first.
    pub fn is_method(&self) -> bool {
        self.arguments.first().is_some_and(|arg| arg.name == "self")
    }
}

/// A template's exported interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub template_name: String,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
}

/// Builds call nodes for the functions of one published template.
#[derive(Debug, Clone)]
pub struct TemplateReader {
    template: TemplateDef,
    template_address: String,
}

impl TemplateReader {
    pub fn new(template: TemplateDef, template_address: impl Into<String>) -> Self {
        TemplateReader {
            template,
            template_address: template_address.into(),
        }
    }

    pub fn template_name(&self) -> &str {
        &self.template.template_name
    }

    /// Creates a call node for `function_name`, or `None` if the template
    /// does not export it.
    ///
    /// A `self` argument becomes the receiver input; every other argument
    /// becomes a positional parameter. The return value is exposed under
    /// [`RETURN_HANDLE`].
    pub fn call_node(&self, id: impl Into<NodeId>, function_name: &str) -> Option<OperationNode> {
        let function = self
            .template
            .functions
            .iter()
            .find(|f| f.name == function_name)?;

        let inputs = function
            .arguments
            .iter()
            .map(|arg| {
                if arg.name == "self" {
                    InputParam::component_address()
                } else {
                    InputParam::parameter(arg.name.clone(), arg.arg_type.clone())
                }
            })
            .collect();

        let metadata = CallMetadata {
            is_method: function.is_method(),
            template_name: self.template.template_name.clone(),
            template_address: self.template_address.clone(),
            function: function.clone(),
        };

        let mut node = OperationNode::new(id, OperationKind::Call(metadata)).with_title(function_name);
        node.inputs = inputs;
        node.output = Some(OutputParam::new(RETURN_HANDLE, function.output.clone()));
        Some(node)
    }
}
