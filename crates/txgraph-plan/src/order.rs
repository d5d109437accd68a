//! Execution order resolution.
//!
//! Kahn's algorithm over the merged dependency graph, with one addition:
//! whenever two or more nodes are ready at once, every pair of them must be
//! comparable (see [`DependencyIndex::is_comparable`]). An incomparable pair
//! means the editor shows no reason for one to run before the other, and the
//! order is rejected as ambiguous rather than picked arbitrarily.
//!
//! The ready queue is FIFO and is seeded in graph order; successors are
//! released in the order [`DependencyIndex`] recorded them. Together with
//! the pairwise check this makes the result a function of the graph alone.

use std::collections::{HashMap, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use txgraph_core::NodeId;

use crate::error::PlanError;
use crate::index::DependencyIndex;

/// Resolves a linear order over all operation nodes.
///
/// Does not validate inputs; [`crate::ExecutionPlanner::execution_order`]
/// runs the validator afterwards.
pub fn resolve_order(index: &DependencyIndex) -> Result<Vec<NodeId>, PlanError> {
    let graph = index.dependency_graph();

    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|idx| (idx, index.in_degree(idx)))
        .collect();

    let mut queue: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|idx| in_degree[idx] == 0)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while !queue.is_empty() {
        if let Some((first, second)) = find_incomparable(index, &queue) {
            return Err(PlanError::AmbiguousOrder { first, second });
        }

        let Some(current) = queue.pop_front() else {
            break;
        };
        tracing::debug!(node = %index.node_id(current), ready = queue.len(), "placed node");
        order.push(index.node_id(current).clone());

        for next in index.successors(current) {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if order.len() != graph.node_count() {
        return Err(PlanError::CycleDetected {
            nodes: cycle_members(index),
        });
    }

    Ok(order)
}

/// First pair of ready nodes, in queue order, with no relation fixing their
/// relative order.
fn find_incomparable(index: &DependencyIndex, queue: &VecDeque<NodeIndex>) -> Option<(NodeId, NodeId)> {
    if queue.len() < 2 {
        return None;
    }
    for (i, &x) in queue.iter().enumerate() {
        for &y in queue.iter().skip(i + 1) {
            let (x, y) = (index.node_id(x), index.node_id(y));
            if !index.is_comparable(x, y) {
                return Some((x.clone(), y.clone()));
            }
        }
    }
    None
}

/// Nodes lying on a dependency cycle, in graph order.
fn cycle_members(index: &DependencyIndex) -> Vec<NodeId> {
    let graph = index.dependency_graph();
    let mut members: Vec<NodeIndex> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .collect();
    members.sort_unstable();
    members
        .into_iter()
        .map(|idx| index.node_id(idx).clone())
        .collect()
}
