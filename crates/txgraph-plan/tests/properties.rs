//! Property tests for execution ordering and lowering.
//!
//! Graphs are generated around a control spine `n0 -> n1 -> ... -> nk`
//! (which makes them unambiguous), listed in a shuffled order, with extra
//! data edges that always point forward along the spine. Properties:
//!
//! - the order is the spine, whatever the listing order
//! - the order is total and respects every control and data edge
//! - planning is deterministic
//! - the lowered transaction starts with its only fee payment

use std::collections::BTreeSet;

use proptest::prelude::*;
use txgraph_core::edge::RETURN_HANDLE;
use txgraph_core::{
    CallMetadata, Edge, FlowGraph, FunctionDef, InputParam, Node, NodeId, OperationKind,
    OperationNode, OutputParam, ParamType,
};
use txgraph_plan::{plan, Amount, ExecutionPlanner, Operation, TransactionProps};

fn spine_id(position: usize) -> String {
    format!("n{position}")
}

/// Builds a spine graph of `len` nodes listed in `listing` order with data
/// edges `(from, to)` where `from < to`.
fn spine_graph(len: usize, listing: &[usize], data: &BTreeSet<(usize, usize)>) -> FlowGraph {
    let nodes: Vec<Node> = listing
        .iter()
        .map(|&position| {
            let mut node = OperationNode::new(
                spine_id(position),
                OperationKind::Call(CallMetadata {
                    is_method: false,
                    template_name: "T".into(),
                    template_address: "template_t".into(),
                    function: FunctionDef {
                        name: format!("f{position}"),
                        arguments: vec![],
                        output: ParamType::String,
                    },
                }),
            )
            .with_output(OutputParam::new(RETURN_HANDLE, ParamType::String));
            for &(from, _) in data.iter().filter(|(_, to)| *to == position) {
                node = node.with_input(InputParam::parameter(format!("in_{from}"), ParamType::String));
            }
            node.into()
        })
        .collect();

    let mut edges: Vec<Edge> = (1..len)
        .map(|position| Edge::control(spine_id(position - 1), spine_id(position)))
        .collect();
    edges.extend(data.iter().map(|&(from, to)| {
        Edge::new(spine_id(from), RETURN_HANDLE, spine_id(to), &format!("in_{from}"))
    }));

    FlowGraph::new(nodes, edges).unwrap()
}

fn arb_spine() -> impl Strategy<Value = (usize, Vec<usize>, BTreeSet<(usize, usize)>)> {
    (1usize..8).prop_flat_map(|len| {
        (
            Just(len),
            Just((0..len).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec((0..len, 0..len), 0..12).prop_map(|pairs| {
                pairs
                    .into_iter()
                    .filter(|(from, to)| from < to)
                    .collect::<BTreeSet<_>>()
            }),
        )
    })
}

fn props() -> TransactionProps {
    TransactionProps {
        account: "component_acct".into(),
        fee: Amount::of(500),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn order_is_the_spine((len, listing, data) in arb_spine()) {
        let graph = spine_graph(len, &listing, &data);
        let order = ExecutionPlanner::new(&graph).execution_order().unwrap();
        let expected: Vec<NodeId> = (0..len).map(|p| NodeId::from(spine_id(p))).collect();
        prop_assert_eq!(order, expected);
    }

    #[test]
    fn order_is_total_and_respects_edges((len, listing, data) in arb_spine()) {
        let graph = spine_graph(len, &listing, &data);
        let order = ExecutionPlanner::new(&graph).execution_order().unwrap();

        prop_assert_eq!(order.len(), graph.operations().count());
        let unique: BTreeSet<&NodeId> = order.iter().collect();
        prop_assert_eq!(unique.len(), order.len());

        let position = |id: &NodeId| order.iter().position(|placed| placed == id);
        for edge in graph.edges() {
            let (from, to) = (position(&edge.source), position(&edge.target));
            prop_assert!(from.is_some() && to.is_some());
            prop_assert!(from < to, "edge {} runs backwards", edge.id);
        }
    }

    #[test]
    fn planning_is_deterministic((len, listing, data) in arb_spine()) {
        let graph = spine_graph(len, &listing, &data);
        let first = plan(&graph, &props()).unwrap();
        let second = plan(&graph, &props()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn fee_is_paid_first_and_once((len, listing, data) in arb_spine()) {
        let graph = spine_graph(len, &listing, &data);
        let details = plan(&graph, &props()).unwrap().details;

        let is_fee = |op: &Operation| matches!(op, Operation::PayFee { .. });
        prop_assert!(is_fee(&details.operations[0]));
        prop_assert_eq!(details.operations.iter().filter(|op| is_fee(op)).count(), 1);

        // One call per node plus one save per producer with consumers.
        let producers: BTreeSet<usize> = data.iter().map(|&(from, _)| from).collect();
        prop_assert_eq!(details.operations.len(), 1 + len + producers.len());
    }
}
