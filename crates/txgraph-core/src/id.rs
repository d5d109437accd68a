//! Stable ID newtypes for flow graph entities.
//!
//! Node and input-bank parameter ids are opaque strings assigned by the
//! editor (usually UUIDs). Wrapping them keeps a `NodeId` from being passed
//! where a `ParamId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a node within one flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Identifier of a parameter declared on an input-bank node.
///
/// Bank parameters are addressed by id rather than name so that renaming a
/// parameter does not break the edges that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(pub String);

impl NodeId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ParamId {
    /// Generates a fresh random parameter id.
    pub fn random() -> Self {
        ParamId(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId(id)
    }
}

impl From<&str> for ParamId {
    fn from(id: &str) -> Self {
        ParamId(id.to_string())
    }
}
