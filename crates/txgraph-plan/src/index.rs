//! Dependency index: per-node control links, data sources and consumers, and
//! the merged dependency graph the resolver sorts.
//!
//! The merged graph is a `petgraph` [`DiGraph`] with one node per operation
//! node, added in graph order so that `NodeIndex` order equals editor order.
//! An ordered pair of nodes gets at most one edge however many control and
//! data relations back it.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use txgraph_core::{FlowGraph, NodeId};

/// Control and data links of one operation node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationLinks {
    /// Control predecessor: the node whose exit connects to this entry.
    pub entry_point: Option<NodeId>,
    /// Control successor: the node whose entry this exit connects to.
    pub exit_point: Option<NodeId>,
    /// Input name to the operation node feeding it.
    pub input_sources: IndexMap<String, NodeId>,
}

/// Derived dependency information over the operation nodes of a graph.
#[derive(Debug, Clone)]
pub struct DependencyIndex {
    dependencies: DiGraph<NodeId, ()>,
    indices: HashMap<NodeId, NodeIndex>,
    links: HashMap<NodeId, OperationLinks>,
    output_consumers: HashMap<NodeId, IndexSet<NodeId>>,
    /// Outgoing dependencies per node, in the order they were recorded.
    release_order: HashMap<NodeIndex, IndexSet<NodeIndex>>,
}

impl DependencyIndex {
    /// Indexes the operation nodes of `graph`.
    ///
    /// Edges touching unknown nodes or input banks are ignored, as are edges
    /// mixing a control handle with a data handle and data edges landing on
    /// a handle the target does not declare as an input.
    ///
    /// Dependencies are recorded node by node in graph order: a node's data
    /// sources (in input declaration order), then its control successor.
    pub fn build(graph: &FlowGraph) -> Self {
        let mut dependencies = DiGraph::new();
        let mut indices = HashMap::new();
        let mut links = HashMap::new();
        let mut output_consumers = HashMap::new();
        let mut release_order = HashMap::new();

        for node in graph.operations() {
            let idx = dependencies.add_node(node.id.clone());
            indices.insert(node.id.clone(), idx);
            links.insert(node.id.clone(), OperationLinks::default());
            release_order.insert(idx, IndexSet::new());
            if node.output.is_some() {
                output_consumers.insert(node.id.clone(), IndexSet::new());
            }
        }

        for edge in graph.edges() {
            if !indices.contains_key(&edge.source) || !indices.contains_key(&edge.target) {
                continue;
            }
            let Some(target_handle) = edge.target_handle.as_deref() else {
                continue;
            };
            if edge.source_handle.is_none() {
                continue;
            }

            if edge.is_control() {
                if let Some(source) = links.get_mut(&edge.source) {
                    source.exit_point.get_or_insert_with(|| edge.target.clone());
                }
                if let Some(target) = links.get_mut(&edge.target) {
                    target.entry_point.get_or_insert_with(|| edge.source.clone());
                }
            } else if edge.is_data() {
                let declared = graph
                    .operation(&edge.target)
                    .is_some_and(|node| node.input(target_handle).is_some());
                if !declared {
                    continue;
                }
                if let Some(target) = links.get_mut(&edge.target) {
                    target
                        .input_sources
                        .insert(target_handle.to_string(), edge.source.clone());
                }
            }
        }

        let mut depend = |from: NodeIndex, to: NodeIndex| {
            dependencies.update_edge(from, to, ());
            if let Some(released) = release_order.get_mut(&from) {
                released.insert(to);
            }
        };

        for node in graph.operations() {
            let Some(link) = links.get(&node.id) else {
                continue;
            };
            let consumer = indices[&node.id];
            for input in &node.inputs {
                let Some(producer) = link.input_sources.get(&input.name) else {
                    continue;
                };
                let follows_directly = links
                    .get(producer)
                    .and_then(|producer_link| producer_link.exit_point.as_ref())
                    == Some(&node.id);
                if follows_directly {
                    continue;
                }
                if let Some(consumers) = output_consumers.get_mut(producer) {
                    consumers.insert(node.id.clone());
                }
                depend(indices[producer], consumer);
            }
            if let Some(successor) = &link.exit_point {
                depend(consumer, indices[successor]);
            }
        }

        tracing::debug!(
            nodes = dependencies.node_count(),
            dependencies = dependencies.edge_count(),
            "dependency index built"
        );

        DependencyIndex {
            dependencies,
            indices,
            links,
            output_consumers,
            release_order,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The merged dependency graph.
    pub fn dependency_graph(&self) -> &DiGraph<NodeId, ()> {
        &self.dependencies
    }

    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.indices.get(id).copied()
    }

    pub fn node_id(&self, idx: NodeIndex) -> &NodeId {
        &self.dependencies[idx]
    }

    pub fn operation_count(&self) -> usize {
        self.dependencies.node_count()
    }

    pub fn links(&self, id: &NodeId) -> Option<&OperationLinks> {
        self.links.get(id)
    }

    /// Nodes consuming `producer`'s output through a data edge, excluding its
    /// direct control successor.
    pub fn consumers(&self, producer: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.output_consumers
            .get(producer)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    /// Number of distinct nodes that must run before `idx`.
    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.dependencies
            .neighbors_directed(idx, Direction::Incoming)
            .count()
    }

    /// Nodes that depend on `idx`, in the order their dependencies were
    /// recorded.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.release_order
            .get(&idx)
            .map(|released| released.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether a direct relation fixes the order of `x` and `y`: one feeds
    /// the other's data, or one is the other's control predecessor.
    ///
    /// The check is pairwise only; reachability through other nodes does
    /// not count.
    pub fn is_comparable(&self, x: &NodeId, y: &NodeId) -> bool {
        let feeds = |producer: &NodeId, consumer: &NodeId| {
            self.output_consumers
                .get(producer)
                .is_some_and(|set| set.contains(consumer))
        };
        let follows = |node: &NodeId, predecessor: &NodeId| {
            self.links
                .get(node)
                .and_then(|link| link.entry_point.as_ref())
                == Some(predecessor)
        };
        feeds(x, y) || feeds(y, x) || follows(y, x) || follows(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txgraph_core::edge::RETURN_HANDLE;
    use txgraph_core::{
        Edge, InputBankNode, InputParam, Node, OperationKind, OperationNode, OutputParam,
        ParamType,
    };

    fn producer(id: &str) -> Node {
        OperationNode::new(id, OperationKind::EmitLog)
            .with_output(OutputParam::new(RETURN_HANDLE, ParamType::String))
            .into()
    }

    fn consumer(id: &str, input: &str) -> Node {
        OperationNode::new(id, OperationKind::EmitLog)
            .with_input(InputParam::parameter(input, ParamType::String))
            .into()
    }

    #[test]
    fn control_links_recorded() {
        let graph = FlowGraph::new(
            vec![producer("A"), consumer("B", "x")],
            vec![Edge::control("A", "B")],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        let a = NodeId::from("A");
        let b = NodeId::from("B");
        assert_eq!(index.links(&a).unwrap().exit_point, Some(b.clone()));
        assert_eq!(index.links(&b).unwrap().entry_point, Some(a.clone()));
        assert!(index.is_comparable(&a, &b));
        assert!(index.is_comparable(&b, &a));
    }

    #[test]
    fn control_successor_is_not_a_consumer() {
        let graph = FlowGraph::new(
            vec![producer("A"), consumer("B", "x")],
            vec![
                Edge::control("A", "B"),
                Edge::new("A", RETURN_HANDLE, "B", "x"),
            ],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        let a = NodeId::from("A");
        assert_eq!(index.consumers(&a).count(), 0);
        // One merged dependency for both relations.
        assert_eq!(index.dependency_graph().edge_count(), 1);
        let b = index.node_index(&"B".into()).unwrap();
        assert_eq!(index.in_degree(b), 1);
        assert_eq!(
            index.links(&"B".into()).unwrap().input_sources.get("x"),
            Some(&a)
        );
    }

    #[test]
    fn data_consumers_collected() {
        let graph = FlowGraph::new(
            vec![producer("A"), consumer("B", "x"), consumer("C", "y")],
            vec![
                Edge::new("A", RETURN_HANDLE, "B", "x"),
                Edge::new("A", RETURN_HANDLE, "C", "y"),
            ],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        let consumers: Vec<_> = index.consumers(&"A".into()).map(|id| id.to_string()).collect();
        assert_eq!(consumers, vec!["B", "C"]);
        assert!(index.is_comparable(&"A".into(), &"C".into()));
        assert!(!index.is_comparable(&"B".into(), &"C".into()));

        let a = index.node_index(&"A".into()).unwrap();
        let ids: Vec<_> = index
            .successors(a)
            .into_iter()
            .map(|idx| index.node_id(idx).to_string())
            .collect();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn banks_and_unknown_nodes_ignored() {
        let graph = FlowGraph::new(
            vec![
                InputBankNode::new("bank", "input").into(),
                consumer("B", "x"),
            ],
            vec![
                Edge::new("bank", "p1", "B", "x"),
                Edge::control("ghost", "B"),
            ],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        assert_eq!(index.operation_count(), 1);
        assert_eq!(index.dependency_graph().edge_count(), 0);
        assert!(index.links(&"B".into()).unwrap().input_sources.is_empty());
    }

    #[test]
    fn mixed_handles_are_neither_control_nor_data() {
        let graph = FlowGraph::new(
            vec![producer("A"), consumer("B", "x")],
            vec![Edge::new("A", "exit", "B", "x")],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        assert_eq!(index.dependency_graph().edge_count(), 0);
    }

    #[test]
    fn undeclared_target_handles_ignored() {
        let graph = FlowGraph::new(
            vec![producer("A"), consumer("B", "x")],
            vec![Edge::new("A", RETURN_HANDLE, "B", "stale")],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        assert!(index.links(&"B".into()).unwrap().input_sources.is_empty());
        assert_eq!(index.consumers(&"A".into()).count(), 0);
        assert_eq!(index.dependency_graph().edge_count(), 0);
    }

    #[test]
    fn successors_follow_recording_order() {
        // A's exit successor is recorded while indexing A; its data consumer
        // C only while indexing C, which comes later.
        let graph = FlowGraph::new(
            vec![producer("A"), consumer("C", "x"), consumer("B", "y")],
            vec![
                Edge::new("A", RETURN_HANDLE, "C", "x"),
                Edge::control("A", "B"),
            ],
        )
        .unwrap();
        let index = DependencyIndex::build(&graph);
        let a = index.node_index(&"A".into()).unwrap();
        let ids: Vec<_> = index
            .successors(a)
            .into_iter()
            .map(|idx| index.node_id(idx).to_string())
            .collect();
        assert_eq!(ids, vec!["B", "C"]);
    }
}
