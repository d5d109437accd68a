//! Edges and connection handles.
//!
//! An [`Edge`] joins a handle on its source node to a handle on its target
//! node. Two handle names are reserved for control flow ([`ENTRY_HANDLE`] and
//! [`EXIT_HANDLE`]); every other handle names a data parameter. Control edges
//! express strict temporal precedence, data edges express a value dependency.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Control-flow entry point of an operation node.
pub const ENTRY_HANDLE: &str = "entry";

/// Control-flow exit point of an operation node.
pub const EXIT_HANDLE: &str = "exit";

/// Handle on an input bank that spawns a new parameter when connected.
pub const NEW_INPUT_PARAM_HANDLE: &str = "new-input-param";

/// Output handle (and output name) of a template call's return value.
pub const RETURN_HANDLE: &str = "return";

/// Output handle exposing the first element of a 2-tuple return value.
pub const RETURN_TUPLE_FIRST_HANDLE: &str = "return-tuple-1";

/// Output handle exposing the second element of a 2-tuple return value.
pub const RETURN_TUPLE_SECOND_HANDLE: &str = "return-tuple-2";

/// Which part of a node's output a data edge carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TupleSlot {
    First,
    Second,
}

impl TupleSlot {
    /// Recognises the tuple-half output handles.
    pub fn from_handle(handle: &str) -> Option<TupleSlot> {
        match handle {
            RETURN_TUPLE_FIRST_HANDLE => Some(TupleSlot::First),
            RETURN_TUPLE_SECOND_HANDLE => Some(TupleSlot::Second),
            _ => None,
        }
    }

    /// Suffix appended to a workspace key to address this tuple element.
    pub fn workspace_suffix(self) -> &'static str {
        match self {
            TupleSlot::First => ".0",
            TupleSlot::Second => ".1",
        }
    }

    /// Position of the element inside the tuple.
    pub fn index(self) -> usize {
        match self {
            TupleSlot::First => 0,
            TupleSlot::Second => 1,
        }
    }
}

/// A directed connection between two node handles.
///
/// Field names follow the editor's JSON (`sourceHandle`, `targetHandle`), so
/// edge lists exported by the editor deserialize without translation.
/// Handles are optional because the editor permits dangling handle ids; such
/// edges are ignored by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target: NodeId,
    #[serde(default)]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Creates an edge with an id derived from its endpoints.
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: &str,
        target: impl Into<NodeId>,
        target_handle: &str,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Edge {
            id: format!("{source}:{source_handle}-{target}:{target_handle}"),
            source,
            source_handle: Some(source_handle.to_string()),
            target,
            target_handle: Some(target_handle.to_string()),
        }
    }

    /// Convenience constructor for an `exit -> entry` control edge.
    pub fn control(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Edge::new(source, EXIT_HANDLE, target, ENTRY_HANDLE)
    }

    /// Returns `true` for an `exit -> entry` edge.
    pub fn is_control(&self) -> bool {
        self.source_handle.as_deref() == Some(EXIT_HANDLE)
            && self.target_handle.as_deref() == Some(ENTRY_HANDLE)
    }

    /// Returns `true` if the edge may carry a value: it neither leaves an exit
    /// handle nor lands on an entry handle.
    pub fn is_data(&self) -> bool {
        self.source_handle.as_deref() != Some(EXIT_HANDLE)
            && self.target_handle.as_deref() != Some(ENTRY_HANDLE)
    }

    /// The tuple element carried by this edge, if it leaves a tuple handle.
    pub fn tuple_slot(&self) -> Option<TupleSlot> {
        self.source_handle.as_deref().and_then(TupleSlot::from_handle)
    }
}

/// A proposed edge, checked against the connection rules before it becomes
/// part of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub source_handle: Option<String>,
    pub target: NodeId,
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(
        source: impl Into<NodeId>,
        source_handle: &str,
        target: impl Into<NodeId>,
        target_handle: &str,
    ) -> Self {
        Connection {
            source: source.into(),
            source_handle: Some(source_handle.to_string()),
            target: target.into(),
            target_handle: Some(target_handle.to_string()),
        }
    }

    pub(crate) fn into_edge(self) -> Edge {
        let source_handle = self.source_handle.unwrap_or_default();
        let target_handle = self.target_handle.unwrap_or_default();
        Edge::new(self.source, &source_handle, self.target, &target_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_edge_is_not_data() {
        let edge = Edge::control("A", "B");
        assert!(edge.is_control());
        assert!(!edge.is_data());
        assert_eq!(edge.id, "A:exit-B:entry");
    }

    #[test]
    fn half_control_edge_is_neither() {
        let edge = Edge::new("A", EXIT_HANDLE, "B", "amount");
        assert!(!edge.is_control());
        assert!(!edge.is_data());
    }

    #[test]
    fn tuple_slot_from_source_handle() {
        let edge = Edge::new("A", RETURN_TUPLE_SECOND_HANDLE, "B", "x");
        assert_eq!(edge.tuple_slot(), Some(TupleSlot::Second));
        assert_eq!(TupleSlot::Second.workspace_suffix(), ".1");
        assert_eq!(Edge::new("A", "return", "B", "x").tuple_slot(), None);
    }

    #[test]
    fn edge_uses_editor_field_names() {
        let json = r#"{"id":"e1","source":"A","sourceHandle":"out","target":"B","targetHandle":"in"}"#;
        let edge: Edge = serde_json::from_str(json).unwrap();
        assert_eq!(edge.source, NodeId::from("A"));
        assert_eq!(edge.target_handle.as_deref(), Some("in"));

        let missing: Edge =
            serde_json::from_str(r#"{"id":"e2","source":"A","target":"B"}"#).unwrap();
        assert!(missing.source_handle.is_none());
    }
}
