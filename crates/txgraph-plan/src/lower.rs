//! Transaction lowering: execution order to [`Operation`] sequence.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::Value;
use txgraph_core::{FlowGraph, InputRole, NodeId, OperationKind, OperationNode};

use crate::error::PlanError;
use crate::ir::{
    ArgValue, InputParameter, Instruction, Operation, TransactionContext, TransactionDetails,
    TransactionProps,
};

/// Title of the placeholder bank used when the graph declares none.
pub const DEFAULT_BANK_TITLE: &str = "input";

/// Lowers `order` into a transaction.
///
/// The fee payment always comes first. Each argument resolves, in priority
/// order, to an input-bank reference, a workspace reference to another
/// node's output, or the literal stored on the node. A node whose output is
/// consumed by a data edge is followed by a `SaveVar` under its id, unless
/// it is an address allocation (those already write the workspace).
pub fn lower(
    graph: &FlowGraph,
    order: &[NodeId],
    props: &TransactionProps,
) -> Result<TransactionDetails, PlanError> {
    let sources = ArgumentSources::collect(graph);

    let mut operations = vec![Operation::PayFee {
        account: props.account.clone(),
        fee: props.fee,
    }];
    let mut skipped = Vec::new();

    for id in order {
        let node = graph
            .operation(id)
            .ok_or_else(|| PlanError::UnknownNode { node: id.clone() })?;

        let mut args: Vec<(&str, ArgValue)> = node
            .inputs
            .iter()
            .map(|input| (input.name.as_str(), sources.resolve(node, &input.name)))
            .collect();
        let receiver = match node.inputs.first() {
            Some(first) if first.role == InputRole::ComponentAddress => Some(args.remove(0).1),
            _ => None,
        };

        match &node.operation {
            OperationKind::Start => {}
            OperationKind::Call(metadata) if metadata.is_method => {
                let component_address = receiver.ok_or_else(|| PlanError::InvalidNode {
                    node: id.clone(),
                    reason: "method call has no component address input".to_string(),
                })?;
                operations.push(Operation::CallMethod {
                    component_address,
                    method_name: metadata.function.name.clone(),
                    args: positional(args),
                });
            }
            OperationKind::Call(metadata) => operations.push(Operation::CallFunction {
                template_address: metadata.template_address.clone(),
                function_name: metadata.function.name.clone(),
                args: positional(args),
            }),
            OperationKind::EmitLog => {
                let level = take_named(&mut args, "log_level", id)?;
                let message = take_named(&mut args, "message", id)?;
                operations.push(Operation::AddInstruction {
                    instruction: Instruction::EmitLog { level, message },
                });
            }
            OperationKind::AssertBucketContains => {
                tracing::warn!(node = %id, "bucket assertions have no primitive instruction, skipping");
                skipped.push(id.clone());
            }
            OperationKind::AllocateComponentAddress => {
                operations.push(Operation::AllocateComponentAddress {
                    workspace_id: id.clone(),
                });
            }
            OperationKind::AllocateResourceAddress => {
                operations.push(Operation::AllocateResourceAddress {
                    workspace_id: id.clone(),
                });
            }
        }

        if node.output.is_some()
            && sources.saved.contains(id)
            && !node.operation.is_address_allocation()
        {
            operations.push(Operation::SaveVar { key: id.clone() });
        }
    }

    tracing::debug!(
        operations = operations.len(),
        skipped = skipped.len(),
        "lowered transaction"
    );

    Ok(TransactionDetails {
        context: context(graph),
        operations,
        skipped,
    })
}

/// Builds the input-bank context: bank title to its parameters and values.
pub fn context(graph: &FlowGraph) -> TransactionContext {
    let mut input_params: IndexMap<String, Vec<InputParameter>> = graph
        .input_banks()
        .map(|bank| {
            let params = bank
                .params
                .iter()
                .map(|param| InputParameter {
                    param: param.clone(),
                    value: bank.value(&param.id).cloned(),
                })
                .collect();
            (bank.title.clone(), params)
        })
        .collect();
    if input_params.is_empty() {
        input_params.insert(DEFAULT_BANK_TITLE.to_string(), Vec::new());
    }
    TransactionContext { input_params }
}

// ---------------------------------------------------------------------------
// Argument resolution
// ---------------------------------------------------------------------------

/// Connected argument sources keyed by `(target node, input name)`.
struct ArgumentSources<'g> {
    from_banks: HashMap<(&'g NodeId, &'g str), ArgValue>,
    from_operations: HashMap<(&'g NodeId, &'g str), ArgValue>,
    /// Operation nodes whose output feeds a declared input.
    saved: HashSet<&'g NodeId>,
}

impl<'g> ArgumentSources<'g> {
    fn collect(graph: &'g FlowGraph) -> Self {
        let mut from_banks = HashMap::new();
        let mut from_operations = HashMap::new();
        let mut saved = HashSet::new();

        for edge in graph.edges() {
            let (Some(source_handle), Some(target_handle)) =
                (edge.source_handle.as_deref(), edge.target_handle.as_deref())
            else {
                continue;
            };
            let key = (&edge.target, target_handle);

            if let Some(bank) = graph.input_bank(&edge.source) {
                if let Some(param) = bank.param(source_handle) {
                    from_banks.entry(key).or_insert_with(|| ArgValue::Input {
                        bank: bank.title.clone(),
                        param: param.clone(),
                        value: bank.value(&param.id).cloned(),
                    });
                }
            } else if graph.operation(&edge.source).is_some()
                && edge.is_data()
                && graph
                    .operation(&edge.target)
                    .is_some_and(|target| target.input(target_handle).is_some())
            {
                from_operations.entry(key).or_insert_with(|| ArgValue::Workspace {
                    node: edge.source.clone(),
                    slot: edge.tuple_slot(),
                });
                saved.insert(&edge.source);
            }
        }

        ArgumentSources {
            from_banks,
            from_operations,
            saved,
        }
    }

    fn resolve(&self, node: &OperationNode, input: &str) -> ArgValue {
        let key = (&node.id, input);
        if let Some(arg) = self.from_banks.get(&key) {
            return arg.clone();
        }
        if let Some(arg) = self.from_operations.get(&key) {
            return arg.clone();
        }
        ArgValue::Literal {
            value: node
                .values
                .get(input)
                .and_then(|value| value.data.clone())
                .unwrap_or(Value::Null),
        }
    }
}

fn positional(args: Vec<(&str, ArgValue)>) -> Vec<ArgValue> {
    args.into_iter().map(|(_, arg)| arg).collect()
}

fn take_named(args: &mut Vec<(&str, ArgValue)>, name: &str, node: &NodeId) -> Result<ArgValue, PlanError> {
    let position = args
        .iter()
        .position(|(input, _)| *input == name)
        .ok_or_else(|| PlanError::InvalidNode {
            node: node.clone(),
            reason: format!("missing '{name}' input"),
        })?;
    Ok(args.remove(position).1)
}
