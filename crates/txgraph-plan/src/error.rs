//! Planning errors.
//!
//! The first three variants are the recoverable failures a user fixes by
//! editing the graph. The last two report graphs the editor's connection
//! rules would never produce; they exist so lowering stays total without
//! panicking.

use serde::Serialize;
use thiserror::Error;
use txgraph_core::{FlowGraph, NodeId};

/// A node with at least one unsatisfied input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingInputs {
    pub node: NodeId,
    /// Title if present, else the node id.
    pub label: String,
    /// Names of the inputs that are neither connected nor filled in.
    pub inputs: Vec<String>,
}

/// Errors returned by the planner. No partial plan accompanies them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The control/data dependencies contain a cycle.
    #[error("cycle detected among {} node(s)", .nodes.len())]
    CycleDetected {
        /// Nodes sitting on a cycle, in graph order.
        nodes: Vec<NodeId>,
    },

    /// Two ready nodes have no relation that fixes their relative order.
    #[error("ambiguous order between '{first}' and '{second}'")]
    AmbiguousOrder { first: NodeId, second: NodeId },

    /// Some nodes have inputs that are neither connected nor filled in.
    #[error("missing data in {} node(s)", .nodes.len())]
    MissingData { nodes: Vec<MissingInputs> },

    /// The execution order names a node the graph does not contain.
    #[error("unknown node in execution order: '{node}'")]
    UnknownNode { node: NodeId },

    /// A node cannot be lowered as declared.
    #[error("node '{node}' cannot be lowered: {reason}")]
    InvalidNode { node: NodeId, reason: String },
}

impl PlanError {
    /// Renders the message the editor shows for this error.
    pub fn user_message(&self, graph: &FlowGraph) -> String {
        let name = |id: &NodeId| -> String {
            graph
                .operation(id)
                .map(|node| node.display_name().to_string())
                .unwrap_or_else(|| id.to_string())
        };

        match self {
            PlanError::CycleDetected { nodes } if nodes.is_empty() => {
                "Cycle detected! Make sure to eliminate it.".to_string()
            }
            PlanError::CycleDetected { nodes } => {
                let names: Vec<String> = nodes.iter().map(|id| format!("\"{}\"", name(id))).collect();
                format!(
                    "Cycle detected between {} operations! Make sure to eliminate it.",
                    names.join(", ")
                )
            }
            PlanError::AmbiguousOrder { first, second } => format!(
                "Ambiguous order between \"{}\" and \"{}\" operations. Please add explicit connections.",
                name(first),
                name(second)
            ),
            PlanError::MissingData { nodes } => match nodes.as_slice() {
                [] => "Missing data.".to_string(),
                [only] => format!("Missing data in node \"{}\"", only.label),
                [first, ..] => format!("Missing data in node \"{}\" and other nodes.", first.label),
            },
            PlanError::UnknownNode { node } => format!("Could not find node \"{node}\""),
            PlanError::InvalidNode { node, reason } => {
                format!("Node \"{}\" is invalid: {reason}", name(node))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txgraph_core::{Node, OperationKind, OperationNode};

    fn graph() -> FlowGraph {
        let nodes: Vec<Node> = vec![
            OperationNode::start("s").into(),
            OperationNode::new("a", OperationKind::EmitLog)
                .with_title("Log")
                .into(),
            OperationNode::new("b", OperationKind::EmitLog).into(),
        ];
        FlowGraph::new(nodes, vec![]).unwrap()
    }

    #[test]
    fn ambiguous_message_uses_display_names() {
        let err = PlanError::AmbiguousOrder {
            first: "s".into(),
            second: "a".into(),
        };
        assert_eq!(
            err.user_message(&graph()),
            "Ambiguous order between \"Start node\" and \"Log\" operations. Please add explicit connections."
        );
    }

    #[test]
    fn missing_data_mentions_first_node() {
        let entry = |id: &str| MissingInputs {
            node: id.into(),
            label: id.to_string(),
            inputs: vec!["message".into()],
        };
        let one = PlanError::MissingData {
            nodes: vec![entry("b")],
        };
        assert_eq!(one.user_message(&graph()), "Missing data in node \"b\"");

        let many = PlanError::MissingData {
            nodes: vec![entry("a"), entry("b")],
        };
        assert_eq!(
            many.user_message(&graph()),
            "Missing data in node \"a\" and other nodes."
        );
        assert_eq!(many.to_string(), "missing data in 2 node(s)");
    }

    #[test]
    fn cycle_message() {
        let err = PlanError::CycleDetected {
            nodes: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.user_message(&graph()),
            "Cycle detected between \"Log\", \"b\" operations! Make sure to eliminate it."
        );
        let bare = PlanError::CycleDetected { nodes: vec![] };
        assert_eq!(bare.user_message(&graph()), "Cycle detected! Make sure to eliminate it.");
    }
}
