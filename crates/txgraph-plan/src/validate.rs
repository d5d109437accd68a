//! Input validation.
//!
//! Every declared input of every operation node must be connected (from any
//! source) or carry a locally supplied value that parsed successfully and,
//! if textual, is non-empty.

use txgraph_core::{FlowGraph, OperationNode, ParsedValue};

use crate::error::{MissingInputs, PlanError};

/// Fails with [`PlanError::MissingData`] listing every node that has at least
/// one unsatisfied input.
pub fn validate(graph: &FlowGraph) -> Result<(), PlanError> {
    let nodes = missing_inputs(graph);
    if nodes.is_empty() {
        Ok(())
    } else {
        Err(PlanError::MissingData { nodes })
    }
}

/// Collects the unsatisfied inputs of each operation node, in graph order.
pub fn missing_inputs(graph: &FlowGraph) -> Vec<MissingInputs> {
    graph
        .operations()
        .filter_map(|node| {
            let inputs: Vec<String> = node
                .inputs
                .iter()
                .filter(|input| !is_satisfied(graph, node, &input.name))
                .map(|input| input.name.clone())
                .collect();
            (!inputs.is_empty()).then(|| MissingInputs {
                node: node.id.clone(),
                label: node.label().to_string(),
                inputs,
            })
        })
        .collect()
}

fn is_satisfied(graph: &FlowGraph, node: &OperationNode, input: &str) -> bool {
    graph.is_connected(&node.id, input)
        || node.values.get(input).is_some_and(ParsedValue::is_filled)
}
