//! Connection rules.
//!
//! The editor asks [`FlowGraph::check_connection`] before it draws an edge
//! and calls [`FlowGraph::connect`] to obtain the next snapshot. The rules
//! are what make the planner's assumptions hold: at most one control edge
//! per entry/exit point, one edge per input, and type-compatible data edges.

use crate::edge::{Connection, Edge, ENTRY_HANDLE, EXIT_HANDLE, NEW_INPUT_PARAM_HANDLE};
use crate::error::{ConnectionError, CoreError};
use crate::graph::FlowGraph;
use crate::id::ParamId;
use crate::node::{BankParam, InputRole, Node};

impl FlowGraph {
    /// Checks a proposed connection against the connection rules.
    pub fn check_connection(&self, connection: &Connection) -> Result<(), ConnectionError> {
        let (Some(source_handle), Some(target_handle)) = (
            connection.source_handle.as_deref(),
            connection.target_handle.as_deref(),
        ) else {
            return Err(ConnectionError::MissingHandle);
        };
        if connection.source == connection.target {
            return Err(ConnectionError::SelfConnection {
                node: connection.source.clone(),
            });
        }

        let source = self
            .node(&connection.source)
            .ok_or_else(|| ConnectionError::UnknownNode {
                node: connection.source.clone(),
            })?;
        let target = self
            .node(&connection.target)
            .ok_or_else(|| ConnectionError::UnknownNode {
                node: connection.target.clone(),
            })?;
        let Node::Operation(target) = target else {
            return Err(ConnectionError::TargetNotOperation {
                node: connection.target.clone(),
            });
        };

        let input_taken = || ConnectionError::InputTaken {
            node: target.id.clone(),
            handle: target_handle.to_string(),
        };
        let target_connected = self.is_connected(&target.id, target_handle);

        // Entry and exit pair up once each.
        if source_handle == EXIT_HANDLE && target_handle == ENTRY_HANDLE {
            if !source.as_operation().is_some_and(|node| node.has_exit) {
                return Err(ConnectionError::UnknownOutput {
                    node: connection.source.clone(),
                    handle: EXIT_HANDLE.to_string(),
                });
            }
            if !target.has_entry {
                return Err(ConnectionError::UnknownInput {
                    node: target.id.clone(),
                    handle: ENTRY_HANDLE.to_string(),
                });
            }
            let exit_taken = self.edges().iter().any(|edge| {
                edge.source == connection.source && edge.source_handle.as_deref() == Some(EXIT_HANDLE)
            });
            if exit_taken {
                return Err(ConnectionError::ExitTaken {
                    node: connection.source.clone(),
                });
            }
            if target_connected {
                return Err(input_taken());
            }
            return Ok(());
        }

        let target_input = target.input(target_handle);
        let unknown_input = || ConnectionError::UnknownInput {
            node: target.id.clone(),
            handle: target_handle.to_string(),
        };

        match source {
            Node::InputBank(bank) => {
                if target_connected {
                    return Err(input_taken());
                }
                if source_handle == NEW_INPUT_PARAM_HANDLE {
                    return target_input.map(|_| ()).ok_or_else(unknown_input);
                }
                let param = bank
                    .param(source_handle)
                    .ok_or_else(|| ConnectionError::UnknownOutput {
                        node: bank.id.clone(),
                        handle: source_handle.to_string(),
                    })?;
                let input = target_input.ok_or_else(unknown_input)?;
                if param.param_type != input.param_type {
                    return Err(ConnectionError::TypeMismatch {
                        expected: input.param_type.clone(),
                        actual: param.param_type.clone(),
                    });
                }
                Ok(())
            }
            Node::Operation(producer) => {
                let input = target_input.ok_or_else(unknown_input)?;
                if target_connected {
                    return Err(input_taken());
                }
                if input.role == InputRole::ComponentAddress {
                    return Err(ConnectionError::ReceiverFromOperation {
                        node: target.id.clone(),
                    });
                }
                let carried = producer
                    .output
                    .as_ref()
                    .and_then(|output| output.handle_type(source_handle))
                    .ok_or_else(|| ConnectionError::UnknownOutput {
                        node: producer.id.clone(),
                        handle: source_handle.to_string(),
                    })?;
                if *carried != input.param_type {
                    return Err(ConnectionError::TypeMismatch {
                        expected: input.param_type.clone(),
                        actual: carried.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Applies a connection and returns the resulting snapshot.
    ///
    /// Connecting an input bank's [`NEW_INPUT_PARAM_HANDLE`] first declares a
    /// new bank parameter with the target input's type, named after the
    /// input (`componentAddress` for a method receiver) and made unique
    /// within the bank. The stored edge then leaves from that parameter.
    pub fn connect(&self, connection: Connection) -> Result<FlowGraph, CoreError> {
        self.check_connection(&connection)?;

        if connection.source_handle.as_deref() == Some(NEW_INPUT_PARAM_HANDLE) {
            if let (Some(bank), Some(target)) = (
                self.input_bank(&connection.source),
                self.operation(&connection.target),
            ) {
                let input = connection
                    .target_handle
                    .as_deref()
                    .and_then(|handle| target.input(handle))
                    .ok_or_else(|| CoreError::NodeNotFound {
                        id: connection.target.clone(),
                    })?;
                let base = match input.role {
                    InputRole::ComponentAddress => "componentAddress",
                    _ => input.name.as_str(),
                };
                let name = next_available(base, |candidate| {
                    !bank.params.iter().any(|param| param.name == candidate)
                });
                let param = BankParam {
                    id: ParamId::random(),
                    name,
                    param_type: input.param_type.clone(),
                };
                let param_id = param.id.clone();
                let mut bank = bank.clone();
                bank.params.push(param);

                let edge = Edge::new(
                    connection.source,
                    param_id.as_str(),
                    connection.target,
                    connection.target_handle.as_deref().unwrap_or_default(),
                );
                return Ok(self.with_change(Some(Node::InputBank(bank)), edge));
            }
        }

        Ok(self.with_change(None, connection.into_edge()))
    }
}

/// Returns `name` if `is_free` accepts it, otherwise the first of `name1`,
/// `name2`, ... that it accepts.
pub fn next_available(name: &str, is_free: impl Fn(&str) -> bool) -> String {
    if is_free(name) {
        return name.to_string();
    }
    (1u64..)
        .map(|counter| format!("{name}{counter}"))
        .find(|candidate| is_free(candidate))
        .unwrap_or_else(|| name.to_string())
}

/// Whether `title` can name an input bank: it becomes an identifier in
/// generated code, so it must start with a letter, contain no whitespace,
/// and not collide with another bank.
pub fn is_valid_bank_title(graph: &FlowGraph, bank: &crate::id::NodeId, title: &str) -> bool {
    let starts_with_letter = title.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || title.chars().any(char::is_whitespace) {
        return false;
    }
    !graph
        .input_banks()
        .any(|other| &other.id != bank && other.title == title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{RETURN_HANDLE, RETURN_TUPLE_SECOND_HANDLE};
    use crate::id::NodeId;
    use crate::node::{InputBankNode, InputParam, OperationKind, OperationNode, OutputParam};
    use crate::types::ParamType;

    fn producer(id: &str, output: ParamType) -> Node {
        OperationNode::new(id, OperationKind::EmitLog)
            .with_output(OutputParam::new(RETURN_HANDLE, output))
            .into()
    }

    fn consumer(id: &str) -> Node {
        OperationNode::new(id, OperationKind::EmitLog)
            .with_input(InputParam::component_address())
            .with_input(InputParam::parameter("amount", ParamType::U64))
            .into()
    }

    fn bank() -> Node {
        InputBankNode::new("bank", "input")
            .with_param(
                BankParam {
                    id: ParamId::from("p-amount"),
                    name: "amount".into(),
                    param_type: ParamType::U64,
                },
                None,
            )
            .into()
    }

    fn graph(edges: Vec<Edge>) -> FlowGraph {
        FlowGraph::new(
            vec![
                producer("A", ParamType::U64),
                producer("T", ParamType::Tuple(vec![ParamType::Bool, ParamType::U64])),
                consumer("B"),
                consumer("C"),
                bank(),
            ],
            edges,
        )
        .unwrap()
    }

    #[test]
    fn control_links_pair_once() {
        let g = graph(vec![Edge::control("A", "B")]);
        assert_eq!(
            g.check_connection(&Connection::new("A", EXIT_HANDLE, "C", ENTRY_HANDLE)),
            Err(ConnectionError::ExitTaken { node: "A".into() })
        );
        assert!(matches!(
            g.check_connection(&Connection::new("T", EXIT_HANDLE, "B", ENTRY_HANDLE)),
            Err(ConnectionError::InputTaken { .. })
        ));
        assert!(g
            .check_connection(&Connection::new("B", EXIT_HANDLE, "C", ENTRY_HANDLE))
            .is_ok());
    }

    #[test]
    fn rejects_self_and_unknown_nodes() {
        let g = graph(vec![]);
        assert!(matches!(
            g.check_connection(&Connection::new("A", EXIT_HANDLE, "A", ENTRY_HANDLE)),
            Err(ConnectionError::SelfConnection { .. })
        ));
        assert!(matches!(
            g.check_connection(&Connection::new("Z", EXIT_HANDLE, "A", ENTRY_HANDLE)),
            Err(ConnectionError::UnknownNode { .. })
        ));
        assert!(matches!(
            g.check_connection(&Connection::new("A", RETURN_HANDLE, "bank", "x")),
            Err(ConnectionError::TargetNotOperation { .. })
        ));
        let mut dangling = Connection::new("A", RETURN_HANDLE, "B", "amount");
        dangling.target_handle = None;
        assert_eq!(g.check_connection(&dangling), Err(ConnectionError::MissingHandle));
    }

    #[test]
    fn output_types_must_match() {
        let g = graph(vec![]);
        assert!(g
            .check_connection(&Connection::new("A", RETURN_HANDLE, "B", "amount"))
            .is_ok());
        assert!(g
            .check_connection(&Connection::new("T", RETURN_TUPLE_SECOND_HANDLE, "B", "amount"))
            .is_ok());
        assert!(matches!(
            g.check_connection(&Connection::new("T", RETURN_HANDLE, "B", "amount")),
            Err(ConnectionError::TypeMismatch { .. })
        ));
        assert!(matches!(
            g.check_connection(&Connection::new("A", "nope", "B", "amount")),
            Err(ConnectionError::UnknownOutput { .. })
        ));
    }

    #[test]
    fn receiver_only_from_bank() {
        let g = graph(vec![]);
        assert!(matches!(
            g.check_connection(&Connection::new(
                "A",
                RETURN_HANDLE,
                "B",
                crate::node::COMPONENT_ADDRESS_INPUT
            )),
            Err(ConnectionError::ReceiverFromOperation { .. })
        ));
    }

    #[test]
    fn inputs_accept_one_edge() {
        let g = graph(vec![Edge::new("bank", "p-amount", "B", "amount")]);
        assert!(matches!(
            g.check_connection(&Connection::new("A", RETURN_HANDLE, "B", "amount")),
            Err(ConnectionError::InputTaken { .. })
        ));
        assert!(g
            .check_connection(&Connection::new("bank", "p-amount", "C", "amount"))
            .is_ok());
    }

    #[test]
    fn new_bank_param_is_spawned() {
        let g = graph(vec![]);
        let next = g
            .connect(Connection::new("bank", NEW_INPUT_PARAM_HANDLE, "B", "amount"))
            .unwrap();
        let bank = next.input_bank(&NodeId::from("bank")).unwrap();
        assert_eq!(bank.params.len(), 2);
        let spawned = &bank.params[1];
        assert_eq!(spawned.name, "amount1");
        assert_eq!(spawned.param_type, ParamType::U64);

        let edge = next.edges().last().unwrap();
        assert_eq!(edge.source_handle.as_deref(), Some(spawned.id.as_str()));
        assert_eq!(edge.target_handle.as_deref(), Some("amount"));

        // The original snapshot is untouched.
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.input_bank(&NodeId::from("bank")).unwrap().params.len(), 1);
    }

    #[test]
    fn spawned_receiver_param_is_named_component_address() {
        let g = graph(vec![]);
        let next = g
            .connect(Connection::new(
                "bank",
                NEW_INPUT_PARAM_HANDLE,
                "C",
                crate::node::COMPONENT_ADDRESS_INPUT,
            ))
            .unwrap();
        let bank = next.input_bank(&NodeId::from("bank")).unwrap();
        assert_eq!(bank.params[1].name, "componentAddress");
    }

    #[test]
    fn rejected_connection_is_an_error() {
        let g = graph(vec![]);
        let err = g
            .connect(Connection::new("A", EXIT_HANDLE, "A", ENTRY_HANDLE))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConnection { .. }));
    }

    #[test]
    fn next_available_appends_counter() {
        let taken = ["input", "input1"];
        assert_eq!(next_available("input", |n| !taken.contains(&n)), "input2");
        assert_eq!(next_available("other", |n| !taken.contains(&n)), "other");
    }

    #[test]
    fn bank_titles() {
        let g = graph(vec![]);
        let other = NodeId::from("other");
        assert!(is_valid_bank_title(&g, &other, "params"));
        assert!(!is_valid_bank_title(&g, &other, "input"));
        assert!(is_valid_bank_title(&g, &NodeId::from("bank"), "input"));
        assert!(!is_valid_bank_title(&g, &other, "1st"));
        assert!(!is_valid_bank_title(&g, &other, "my bank"));
        assert!(!is_valid_bank_title(&g, &other, ""));
    }
}
