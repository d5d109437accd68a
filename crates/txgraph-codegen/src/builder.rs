//! Live transaction builder adapter.
//!
//! [`TransactionBuilder`] mirrors the ledger's transaction construction API
//! one method per primitive. [`apply_details`] walks a lowered transaction
//! and calls the builder once per [`Operation`]; [`RecordingBuilder`] is the
//! in-process implementation that records the resulting instructions into a
//! serializable [`UnsignedTransaction`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use txgraph_plan::{Amount, ArgValue, Instruction, Operation, TransactionDetails};

use crate::error::CodegenError;
use crate::Network;

/// Kind of address reserved by an allocation instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressKind {
    Component,
    Resource,
}

/// The transaction construction API the lowered operations map onto.
pub trait TransactionBuilder {
    fn fee_transaction_pay_from_component(&mut self, account: &str, fee: Amount);
    fn call_method(&mut self, component_address: &str, method_name: &str, args: Vec<Value>);
    fn call_function(&mut self, template_address: &str, function_name: &str, args: Vec<Value>);
    fn add_instruction(&mut self, instruction: Value);
    fn allocate_address(&mut self, kind: AddressKind, workspace_id: &str);
    fn save_var(&mut self, key: &str);
}

/// Replays `details` against `builder`, one call per operation.
///
/// Workspace references become `{"Workspace": key}` objects; input-bank
/// references and literals pass their value through. Method receivers must
/// resolve to a concrete address string.
pub fn apply_details<B: TransactionBuilder + ?Sized>(
    details: &TransactionDetails,
    builder: &mut B,
) -> Result<(), CodegenError> {
    for operation in &details.operations {
        match operation {
            Operation::PayFee { account, fee } => {
                builder.fee_transaction_pay_from_component(account, *fee);
            }
            Operation::CallMethod {
                component_address,
                method_name,
                args,
            } => {
                let address = receiver_address(component_address, method_name)?;
                let args = unwrap_args(args, method_name)?;
                builder.call_method(&address, method_name, args);
            }
            Operation::CallFunction {
                template_address,
                function_name,
                args,
            } => {
                let args = unwrap_args(args, function_name)?;
                builder.call_function(template_address, function_name, args);
            }
            Operation::AddInstruction { instruction } => match instruction {
                Instruction::EmitLog { level, message } => {
                    builder.add_instruction(json!({
                        "EmitLog": {
                            "level": unwrap_arg(level, "EmitLog", "level")?,
                            "message": unwrap_arg(message, "EmitLog", "message")?,
                        }
                    }));
                }
            },
            Operation::AllocateComponentAddress { workspace_id } => {
                builder.allocate_address(AddressKind::Component, workspace_id.as_str());
            }
            Operation::AllocateResourceAddress { workspace_id } => {
                builder.allocate_address(AddressKind::Resource, workspace_id.as_str());
            }
            Operation::SaveVar { key } => builder.save_var(key.as_str()),
        }
    }
    Ok(())
}

/// The value a builder receives for one argument.
pub fn unwrap_arg(arg: &ArgValue, operation: &str, argument: &str) -> Result<Value, CodegenError> {
    match arg {
        ArgValue::Workspace { .. } => Ok(json!({ "Workspace": arg.workspace_key() })),
        ArgValue::Input { value: Some(value), .. } => Ok(value.clone()),
        ArgValue::Input { param, value: None, .. } => Err(CodegenError::MissingArgument {
            operation: operation.to_string(),
            argument: if argument.is_empty() {
                param.name.clone()
            } else {
                argument.to_string()
            },
        }),
        ArgValue::Literal { value } => Ok(value.clone()),
    }
}

fn unwrap_args(args: &[ArgValue], operation: &str) -> Result<Vec<Value>, CodegenError> {
    args.iter().map(|arg| unwrap_arg(arg, operation, "")).collect()
}

fn receiver_address(arg: &ArgValue, method: &str) -> Result<String, CodegenError> {
    match unwrap_arg(arg, method, "component address")? {
        Value::String(address) if !matches!(arg, ArgValue::Workspace { .. }) => Ok(address),
        other => Err(CodegenError::UnsupportedReceiver {
            method: method.to_string(),
            found: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Recording builder
// ---------------------------------------------------------------------------

/// A transaction ready to be signed and submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub network: Network,
    pub fee_instructions: Vec<Value>,
    pub instructions: Vec<Value>,
    pub dry_run: bool,
}

/// Records builder calls as ledger instructions.
#[derive(Debug, Clone)]
pub struct RecordingBuilder {
    network: Network,
    fee_instructions: Vec<Value>,
    instructions: Vec<Value>,
}

impl RecordingBuilder {
    pub fn new(network: Network) -> Self {
        RecordingBuilder {
            network,
            fee_instructions: Vec::new(),
            instructions: Vec::new(),
        }
    }

    pub fn build_unsigned_transaction(self, dry_run: bool) -> UnsignedTransaction {
        UnsignedTransaction {
            network: self.network,
            fee_instructions: self.fee_instructions,
            instructions: self.instructions,
            dry_run,
        }
    }
}

impl TransactionBuilder for RecordingBuilder {
    fn fee_transaction_pay_from_component(&mut self, account: &str, fee: Amount) {
        self.fee_instructions.push(json!({
            "CallMethod": {
                "component_address": account,
                "method": "pay_fee",
                "args": [fee],
            }
        }));
    }

    fn call_method(&mut self, component_address: &str, method_name: &str, args: Vec<Value>) {
        self.instructions.push(json!({
            "CallMethod": {
                "component_address": component_address,
                "method": method_name,
                "args": args,
            }
        }));
    }

    fn call_function(&mut self, template_address: &str, function_name: &str, args: Vec<Value>) {
        self.instructions.push(json!({
            "CallFunction": {
                "template_address": template_address,
                "function": function_name,
                "args": args,
            }
        }));
    }

    fn add_instruction(&mut self, instruction: Value) {
        self.instructions.push(instruction);
    }

    fn allocate_address(&mut self, kind: AddressKind, workspace_id: &str) {
        self.instructions.push(json!({
            "AllocateAddress": {
                "substate_type": kind,
                "workspace_id": workspace_id,
            }
        }));
    }

    fn save_var(&mut self, key: &str) {
        self.instructions.push(json!({
            "PutLastInstructionOutputOnWorkspace": { "key": key }
        }));
    }
}
