//! Data model of a transaction flow graph.
//!
//! A flow graph is what a visual transaction builder edits: operation nodes
//! (template calls, logs, address allocations, the start marker), input
//! banks holding externally supplied parameters, and the edges between
//! them. This crate owns the graph snapshot, its serialized form, and the
//! rules that decide which edges may be drawn. Planning lives in
//! `txgraph-plan`.

pub mod connect;
pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod template;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use connect::{is_valid_bank_title, next_available};
pub use edge::{Connection, Edge, TupleSlot};
pub use error::{ConnectionError, CoreError};
pub use graph::FlowGraph;
pub use id::{NodeId, ParamId};
pub use node::{
    BankParam, CallMetadata, InputBankNode, InputParam, InputRole, Node, OperationKind,
    OperationNode, OutputParam,
};
pub use template::{ArgDef, FunctionDef, TemplateDef, TemplateReader};
pub use types::{IntegerBounds, ParamType};
pub use value::ParsedValue;
