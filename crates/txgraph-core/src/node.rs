//! Flow graph nodes.
//!
//! A graph holds two kinds of node:
//! - [`OperationNode`]: one step of the transaction (a template call, an
//!   emitted log, an address allocation, or the start marker). It declares
//!   typed inputs, at most one output, and optional control-flow points.
//! - [`InputBankNode`]: a titled set of externally supplied parameters that
//!   feed operation inputs through data edges. Banks never take part in
//!   control flow.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::id::{NodeId, ParamId};
use crate::template::FunctionDef;
use crate::types::ParamType;
use crate::value::ParsedValue;

/// Name of the receiver input that a method call node declares first.
pub const COMPONENT_ADDRESS_INPUT: &str = "__component_address__";

/// Output name of a component address allocation.
pub const COMPONENT_ALLOCATION_OUTPUT: &str = "component_address_allocation";

/// Output name of a resource address allocation.
pub const RESOURCE_ALLOCATION_OUTPUT: &str = "resource_address_allocation";

/// Levels accepted by the emit-log instruction.
pub const LOG_LEVELS: [&str; 4] = ["Error", "Warn", "Info", "Debug"];

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// How an input parameter is supplied and lowered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    /// A constant typed directly into the node; never a call argument slot
    /// of its own.
    None,
    /// A positional argument.
    #[default]
    Parameter,
    /// The subject (`self`) of a method call. Lowered as the call's
    /// receiver rather than as a positional argument.
    ComponentAddress,
}

/// A declared input of an operation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub role: InputRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Closed set of accepted values, for inputs rendered as a select box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_values: Option<Vec<String>>,
}

impl InputParam {
    /// A positional call argument.
    pub fn parameter(name: impl Into<String>, param_type: ParamType) -> Self {
        InputParam {
            name: name.into(),
            param_type,
            role: InputRole::Parameter,
            label: None,
            valid_values: None,
        }
    }

    /// A constant configured on the node itself.
    pub fn constant(name: impl Into<String>, label: &str, param_type: ParamType) -> Self {
        InputParam {
            name: name.into(),
            param_type,
            role: InputRole::None,
            label: Some(label.to_string()),
            valid_values: None,
        }
    }

    /// The receiver of a method call.
    pub fn component_address() -> Self {
        InputParam {
            name: COMPONENT_ADDRESS_INPUT.to_string(),
            param_type: ParamType::Other {
                name: "Component".into(),
            },
            role: InputRole::ComponentAddress,
            label: Some("Component Address".into()),
            valid_values: None,
        }
    }
}

/// The single output of an operation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl OutputParam {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        OutputParam {
            name: name.into(),
            param_type,
            label: None,
        }
    }

    /// Type carried by an output handle: the whole value under the output's
    /// own name, or one half of a 2-tuple under the tuple handles.
    pub fn handle_type(&self, handle: &str) -> Option<&ParamType> {
        if handle == self.name {
            return Some(&self.param_type);
        }
        let slot = crate::edge::TupleSlot::from_handle(handle)?;
        let (first, second) = self.param_type.tuple_pair()?;
        Some(match slot {
            crate::edge::TupleSlot::First => first,
            crate::edge::TupleSlot::Second => second,
        })
    }
}

// ---------------------------------------------------------------------------
// Operation nodes
// ---------------------------------------------------------------------------

/// Template call details stored on a call node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMetadata {
    /// `true` when the function takes `self` and is invoked on a component.
    pub is_method: bool,
    pub template_name: String,
    pub template_address: String,
    pub function: FunctionDef,
}

/// What an operation node does. Closed set; lowering matches it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// Marks where the flow begins. Emits nothing.
    Start,
    /// Calls a template function or a component method.
    Call(CallMetadata),
    /// Emits a log line at a given level.
    EmitLog,
    /// Asserts that a bucket holds a minimum amount of a resource.
    AssertBucketContains,
    /// Reserves a component address in the transaction workspace.
    AllocateComponentAddress,
    /// Reserves a resource address in the transaction workspace.
    AllocateResourceAddress,
}

impl OperationKind {
    /// Returns `true` for the address allocation kinds, whose result lands
    /// in the workspace without an explicit save.
    pub fn is_address_allocation(&self) -> bool {
        matches!(
            self,
            OperationKind::AllocateComponentAddress | OperationKind::AllocateResourceAddress
        )
    }
}

/// One step of the transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationNode {
    pub id: NodeId,
    pub operation: OperationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub inputs: Vec<InputParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputParam>,
    /// Locally supplied values keyed by input name.
    #[serde(default)]
    pub values: IndexMap<String, ParsedValue>,
    #[serde(default)]
    pub has_entry: bool,
    #[serde(default)]
    pub has_exit: bool,
}

impl OperationNode {
    /// Creates a node with both control-flow points and no parameters.
    pub fn new(id: impl Into<NodeId>, operation: OperationKind) -> Self {
        OperationNode {
            id: id.into(),
            operation,
            title: None,
            inputs: Vec::new(),
            output: None,
            values: IndexMap::new(),
            has_entry: true,
            has_exit: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_input(mut self, input: InputParam) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: OutputParam) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_value(mut self, input: impl Into<String>, value: ParsedValue) -> Self {
        self.values.insert(input.into(), value);
        self
    }

    /// The start marker: only an exit point.
    pub fn start(id: impl Into<NodeId>) -> Self {
        let mut node = OperationNode::new(id, OperationKind::Start);
        node.has_entry = false;
        node
    }

    /// Emit-log instruction with a level select and a message.
    pub fn emit_log(id: impl Into<NodeId>) -> Self {
        let mut level = InputParam::constant("log_level", "Log Level", ParamType::String);
        level.valid_values = Some(LOG_LEVELS.iter().map(|l| l.to_string()).collect());
        OperationNode::new(id, OperationKind::EmitLog)
            .with_title("Emit Log")
            .with_input(level)
            .with_input(InputParam::constant("message", "Message", ParamType::String))
    }

    /// Bucket assertion instruction.
    pub fn assert_bucket_contains(id: impl Into<NodeId>) -> Self {
        OperationNode::new(id, OperationKind::AssertBucketContains)
            .with_title("Assert Bucket Contains")
            .with_input(InputParam::constant(
                "key",
                "Key",
                ParamType::Vec(Box::new(ParamType::U8)),
            ))
            .with_input(InputParam::constant(
                "resource_address",
                "Resource Address",
                ParamType::Other {
                    name: "ResourceAddress".into(),
                },
            ))
            .with_input(InputParam::constant(
                "min_amount",
                "Minimum Amount",
                ParamType::Other {
                    name: "Amount".into(),
                },
            ))
    }

    /// Component address allocation.
    pub fn allocate_component_address(id: impl Into<NodeId>) -> Self {
        OperationNode::new(id, OperationKind::AllocateComponentAddress)
            .with_title("Allocate Component Address")
            .with_input(InputParam::constant(
                "component_name",
                "Component Name",
                ParamType::String,
            ))
            .with_output(OutputParam {
                name: COMPONENT_ALLOCATION_OUTPUT.into(),
                param_type: ParamType::Other {
                    name: "ComponentAddressAllocation".into(),
                },
                label: Some("ComponentAddressAllocation".into()),
            })
    }

    /// Resource address allocation.
    pub fn allocate_resource_address(id: impl Into<NodeId>) -> Self {
        OperationNode::new(id, OperationKind::AllocateResourceAddress)
            .with_title("Allocate Resource Address")
            .with_input(InputParam::constant(
                "resource_name",
                "Resource Name",
                ParamType::String,
            ))
            .with_output(OutputParam {
                name: RESOURCE_ALLOCATION_OUTPUT.into(),
                param_type: ParamType::Other {
                    name: "ResourceAddressAllocation".into(),
                },
                label: Some("ResourceAddressAllocation".into()),
            })
    }

    /// Looks up a declared input by name.
    pub fn input(&self, name: &str) -> Option<&InputParam> {
        self.inputs.iter().find(|input| input.name == name)
    }

    /// Identifier shown to users in diagnostics: the title, else the id.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(self.id.as_str())
    }

    /// Like [`label`](Self::label), but names the start marker explicitly.
    pub fn display_name(&self) -> &str {
        match self.operation {
            OperationKind::Start => "Start node",
            _ => self.label(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input banks
// ---------------------------------------------------------------------------

/// A parameter declared on an input bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankParam {
    pub id: ParamId,
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
}

/// A titled set of externally supplied parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBankNode {
    pub id: NodeId,
    /// Doubles as the identifier of the bank in generated code.
    pub title: String,
    #[serde(default)]
    pub params: Vec<BankParam>,
    /// Values keyed by parameter id.
    #[serde(default)]
    pub values: IndexMap<ParamId, ParsedValue>,
}

impl InputBankNode {
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        InputBankNode {
            id: id.into(),
            title: title.into(),
            params: Vec::new(),
            values: IndexMap::new(),
        }
    }

    /// Adds a parameter with an optional value.
    pub fn with_param(mut self, param: BankParam, value: Option<ParsedValue>) -> Self {
        if let Some(value) = value {
            self.values.insert(param.id.clone(), value);
        }
        self.params.push(param);
        self
    }

    pub fn param(&self, id: &str) -> Option<&BankParam> {
        self.params.iter().find(|param| param.id.as_str() == id)
    }

    /// The successfully parsed value of a parameter.
    pub fn value(&self, id: &ParamId) -> Option<&serde_json::Value> {
        self.values.get(id).and_then(ParsedValue::value)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Any node of a flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Operation(OperationNode),
    InputBank(InputBankNode),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Operation(node) => &node.id,
            Node::InputBank(bank) => &bank.id,
        }
    }

    pub fn as_operation(&self) -> Option<&OperationNode> {
        match self {
            Node::Operation(node) => Some(node),
            Node::InputBank(_) => None,
        }
    }

    pub fn as_input_bank(&self) -> Option<&InputBankNode> {
        match self {
            Node::InputBank(bank) => Some(bank),
            Node::Operation(_) => None,
        }
    }
}

impl From<OperationNode> for Node {
    fn from(node: OperationNode) -> Self {
        Node::Operation(node)
    }
}

impl From<InputBankNode> for Node {
    fn from(bank: InputBankNode) -> Self {
        Node::InputBank(bank)
    }
}
