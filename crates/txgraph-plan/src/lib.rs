//! Execution planning for transaction flow graphs.
//!
//! Planning runs in fixed stages over one immutable [`FlowGraph`] snapshot:
//!
//! 1. [`index`]: derive control links, data sources, and the merged
//!    dependency graph.
//! 2. [`order`]: topological sort that rejects cycles and ambiguous orders.
//! 3. [`validate`]: every declared input is connected or filled in.
//! 4. [`lower`]: turn the order into primitive [`Operation`]s with resolved
//!    argument provenance.
//!
//! Each stage builds its own private state; planning different snapshots in
//! parallel is safe.
//!
//! # Usage
//!
//! ```ignore
//! let plan = txgraph_plan::plan(&graph, &props)?;
//! for op in &plan.details.operations { /* ... */ }
//! ```

pub mod error;
pub mod index;
pub mod ir;
pub mod lower;
pub mod order;
pub mod validate;

pub use error::{MissingInputs, PlanError};
pub use index::{DependencyIndex, OperationLinks};
pub use ir::{
    Amount, ArgValue, ExecutionPlan, InputParameter, Instruction, Operation, TransactionContext,
    TransactionDetails, TransactionProps,
};

use txgraph_core::{FlowGraph, NodeId};

/// Plans one graph snapshot.
pub struct ExecutionPlanner<'g> {
    graph: &'g FlowGraph,
    index: DependencyIndex,
}

impl<'g> ExecutionPlanner<'g> {
    pub fn new(graph: &'g FlowGraph) -> Self {
        ExecutionPlanner {
            graph,
            index: DependencyIndex::build(graph),
        }
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Resolves the execution order, then validates inputs. A validation
    /// failure supersedes a successful ordering.
    pub fn execution_order(&self) -> Result<Vec<NodeId>, PlanError> {
        let order = order::resolve_order(&self.index)?;
        validate::validate(self.graph)?;
        Ok(order)
    }

    /// Lowers an execution order into a transaction.
    pub fn lower(
        &self,
        order: &[NodeId],
        props: &TransactionProps,
    ) -> Result<TransactionDetails, PlanError> {
        lower::lower(self.graph, order, props)
    }
}

/// Orders, validates and lowers `graph` in one call.
pub fn plan(graph: &FlowGraph, props: &TransactionProps) -> Result<ExecutionPlan, PlanError> {
    let planner = ExecutionPlanner::new(graph);
    let order = planner.execution_order()?;
    let details = planner.lower(&order, props)?;
    tracing::info!(
        nodes = order.len(),
        operations = details.operations.len(),
        "execution plan ready"
    );
    Ok(ExecutionPlan { order, details })
}
