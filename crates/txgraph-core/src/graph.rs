//! FlowGraph: an immutable snapshot of the editor's nodes and edges.
//!
//! [`FlowGraph`] is the single input of the planner. It owns the node and
//! edge collections and resolves node ids to nodes; it never changes once
//! built. Edits produce a new snapshot (see [`FlowGraph::connect`]), so a
//! planning call always sees one consistent graph.
//!
//! Node order is significant: it is the order in which the editor lists its
//! nodes, and the planner visits nodes in that order so its output is
//! deterministic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::{InputBankNode, Node, OperationNode};

/// Immutable view over a flow graph's nodes and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawFlowGraph", into = "RawFlowGraph")]
pub struct FlowGraph {
    nodes: IndexMap<NodeId, Node>,
    edges: Vec<Edge>,
}

/// Serialized form: plain node and edge lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFlowGraph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl TryFrom<RawFlowGraph> for FlowGraph {
    type Error = CoreError;

    fn try_from(raw: RawFlowGraph) -> Result<Self, Self::Error> {
        FlowGraph::new(raw.nodes, raw.edges)
    }
}

impl From<FlowGraph> for RawFlowGraph {
    fn from(graph: FlowGraph) -> Self {
        RawFlowGraph {
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges,
        }
    }
}

impl FlowGraph {
    /// Builds a snapshot, rejecting duplicate node ids.
    ///
    /// Edges are stored as given. Edges that reference unknown nodes or
    /// handles are legal here; the planning stages treat them as absent.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, CoreError> {
        let mut by_id = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            let id = node.id().clone();
            if by_id.contains_key(&id) {
                return Err(CoreError::DuplicateNodeId { id });
            }
            by_id.insert(id, node);
        }
        Ok(FlowGraph {
            nodes: by_id,
            edges,
        })
    }

    /// Returns an empty graph.
    pub fn empty() -> Self {
        FlowGraph::default()
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// All nodes in editor order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn operation(&self, id: &NodeId) -> Option<&OperationNode> {
        self.node(id).and_then(Node::as_operation)
    }

    pub fn input_bank(&self, id: &NodeId) -> Option<&InputBankNode> {
        self.node(id).and_then(Node::as_input_bank)
    }

    /// Operation nodes in editor order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationNode> {
        self.nodes.values().filter_map(Node::as_operation)
    }

    /// Input banks in editor order.
    pub fn input_banks(&self) -> impl Iterator<Item = &InputBankNode> {
        self.nodes.values().filter_map(Node::as_input_bank)
    }

    /// Position of a node in editor order.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if some edge already lands on `handle` of `node`.
    pub fn is_connected(&self, node: &NodeId, handle: &str) -> bool {
        self.edges
            .iter()
            .any(|edge| &edge.target == node && edge.target_handle.as_deref() == Some(handle))
    }

    /// Returns a new snapshot with `node` replaced and `edge` appended.
    pub(crate) fn with_change(&self, node: Option<Node>, edge: Edge) -> FlowGraph {
        let mut next = self.clone();
        if let Some(node) = node {
            next.nodes.insert(node.id().clone(), node);
        }
        next.edges.push(edge);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{InputParam, OperationKind};
    use crate::types::ParamType;

    fn sample() -> FlowGraph {
        FlowGraph::new(
            vec![
                OperationNode::start("start").into(),
                InputBankNode::new("bank", "input").into(),
                OperationNode::new("call", OperationKind::EmitLog)
                    .with_input(InputParam::parameter("message", ParamType::String))
                    .into(),
            ],
            vec![Edge::control("start", "call")],
        )
        .unwrap()
    }

    #[test]
    fn duplicate_ids_rejected() {
        let result = FlowGraph::new(
            vec![
                OperationNode::start("a").into(),
                OperationNode::new("a", OperationKind::EmitLog).into(),
            ],
            vec![],
        );
        match result {
            Err(CoreError::DuplicateNodeId { id }) => assert_eq!(id, NodeId::from("a")),
            other => panic!("expected DuplicateNodeId, got {other:?}"),
        }
    }

    #[test]
    fn lookups_by_kind() {
        let graph = sample();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.operation(&"call".into()).is_some());
        assert!(graph.operation(&"bank".into()).is_none());
        assert!(graph.input_bank(&"bank".into()).is_some());
        assert_eq!(graph.operations().count(), 2);
        assert_eq!(graph.input_banks().count(), 1);
        assert_eq!(graph.position(&"call".into()), Some(2));
    }

    #[test]
    fn connected_handles() {
        let graph = sample();
        assert!(graph.is_connected(&"call".into(), "entry"));
        assert!(!graph.is_connected(&"call".into(), "message"));
    }

    #[test]
    fn serde_roundtrip_preserves_order() {
        let graph = sample();
        let json = serde_json::to_string(&graph).unwrap();
        let back: FlowGraph = serde_json::from_str(&json).unwrap();
        let ids: Vec<_> = back.nodes().map(|n| n.id().to_string()).collect();
        assert_eq!(ids, vec!["start", "bank", "call"]);
        assert_eq!(back.edges(), graph.edges());
    }

    #[test]
    fn deserializing_duplicates_fails() {
        let json = r#"{"nodes":[
            {"type":"input_bank","id":"x","title":"a"},
            {"type":"input_bank","id":"x","title":"b"}
        ],"edges":[]}"#;
        assert!(serde_json::from_str::<FlowGraph>(json).is_err());
    }
}
