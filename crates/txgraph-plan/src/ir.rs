//! Lowered transaction representation.
//!
//! [`Operation`] is one primitive step of a transaction; a plan is an ordered
//! list of them plus the input-bank context the arguments refer to. The IR
//! is produced fresh by each lowering call and is never mutated afterwards.
//! Its JSON form is what the live builder and the code generator consume.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use txgraph_core::{BankParam, NodeId, TupleSlot};

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// An unsigned token amount.
///
/// Serialized as a decimal string so JSON consumers without 128-bit
/// integers read it exactly. Deserializes from a string or a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub fn of(value: u128) -> Self {
        Amount(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Amount)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(u128::from(v)))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u128::try_from(v)
                    .map(Amount)
                    .map_err(|_| E::custom("amount cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Where an operation argument comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ArgValue {
    /// A value another node saved to the workspace under its id.
    Workspace {
        node: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<TupleSlot>,
    },
    /// A parameter of an input bank.
    Input {
        /// Title of the bank.
        bank: String,
        param: BankParam,
        /// The bank's current value, if one parsed successfully.
        #[serde(default)]
        value: Option<Value>,
    },
    /// A value stored on the node itself.
    Literal {
        #[serde(default)]
        value: Value,
    },
}

impl ArgValue {
    /// Workspace key this argument reads, e.g. `node_1` or `node_1.0`.
    pub fn workspace_key(&self) -> Option<String> {
        match self {
            ArgValue::Workspace { node, slot } => Some(match slot {
                Some(slot) => format!("{node}{}", slot.workspace_suffix()),
                None => node.to_string(),
            }),
            _ => None,
        }
    }
}

/// A raw instruction appended to the transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    EmitLog { level: ArgValue, message: ArgValue },
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// One primitive transaction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    /// Pays the transaction fee from an account component. Always first.
    PayFee { account: String, fee: Amount },
    CallMethod {
        component_address: ArgValue,
        method_name: String,
        args: Vec<ArgValue>,
    },
    CallFunction {
        template_address: String,
        function_name: String,
        args: Vec<ArgValue>,
    },
    AddInstruction { instruction: Instruction },
    AllocateComponentAddress { workspace_id: NodeId },
    AllocateResourceAddress { workspace_id: NodeId },
    /// Saves the last instruction's result to the workspace under `key`.
    SaveVar { key: NodeId },
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Account and fee supplied by the transaction properties provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProps {
    pub account: String,
    pub fee: Amount,
}

/// A bank parameter with its resolved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParameter {
    pub param: BankParam,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Input banks the operations refer to, keyed by bank title.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionContext {
    pub input_params: IndexMap<String, Vec<InputParameter>>,
}

/// The lowered transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub context: TransactionContext,
    pub operations: Vec<Operation>,
    /// Nodes whose kind has no primitive instruction and was left out.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<NodeId>,
}

/// Result of planning: the execution order and the lowered transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub order: Vec<NodeId>,
    pub details: TransactionDetails,
}
