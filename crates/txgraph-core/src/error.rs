//! Core error types for txgraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! snapshot construction and the editor's connection rules.

use crate::id::NodeId;
use crate::types::ParamType;
use thiserror::Error;

/// Core errors produced by the txgraph-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two nodes in one snapshot share an id.
    #[error("duplicate node id: '{id}'")]
    DuplicateNodeId { id: NodeId },

    /// A node id was not found in the graph.
    #[error("node not found: '{id}'")]
    NodeNotFound { id: NodeId },

    /// A proposed connection broke one of the connection rules.
    #[error("invalid connection: {reason}")]
    InvalidConnection {
        #[from]
        reason: ConnectionError,
    },
}

/// Why a proposed connection was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("connection is missing a handle")]
    MissingHandle,

    #[error("node '{node}' cannot connect to itself")]
    SelfConnection { node: NodeId },

    #[error("unknown node '{node}'")]
    UnknownNode { node: NodeId },

    #[error("node '{node}' does not accept incoming connections")]
    TargetNotOperation { node: NodeId },

    #[error("exit of '{node}' is already connected")]
    ExitTaken { node: NodeId },

    #[error("handle '{handle}' of '{node}' is already connected")]
    InputTaken { node: NodeId, handle: String },

    #[error("node '{node}' has no input named '{handle}'")]
    UnknownInput { node: NodeId, handle: String },

    #[error("node '{node}' has no output handle '{handle}'")]
    UnknownOutput { node: NodeId, handle: String },

    #[error("type mismatch: {actual} cannot feed {expected}")]
    TypeMismatch {
        expected: ParamType,
        actual: ParamType,
    },

    #[error("component address of '{node}' can only be supplied by an input bank")]
    ReceiverFromOperation { node: NodeId },
}
