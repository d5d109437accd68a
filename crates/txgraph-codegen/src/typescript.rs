//! TypeScript source generation.
//!
//! Renders a lowered transaction as a standalone module for the ledger's
//! JavaScript SDK:
//!
//! - one exported `<Bank>Props` interface and one `const` per input bank,
//!   holding the bank's current values;
//! - `buildTransaction(network, ...banks)`, with one builder call per
//!   operation;
//! - `executeTransaction(signer, network, accountId, ...banks)`, which
//!   submits the built transaction and awaits its result.
//!
//! Output follows the SDK printer's layout: four-space indentation,
//! multi-line object literals, and a blank line between sections.

use serde_json::Value;
use txgraph_core::ParamType;
use txgraph_plan::{ArgValue, InputParameter, Instruction, Operation, TransactionDetails};

use crate::error::CodegenError;

const INDENT: &str = "    ";

/// Renders `details` as a TypeScript module.
pub fn render_typescript(details: &TransactionDetails) -> Result<String, CodegenError> {
    let banks: Vec<Bank<'_>> = details
        .context
        .input_params
        .iter()
        .map(|(title, params)| Bank::new(title, params))
        .collect::<Result<_, _>>()?;

    let mut out = String::new();
    out.push_str(
        "import { Amount, buildTransactionRequest, Network, submitAndWaitForTransaction, TariSigner, TransactionBuilder } from \"@tari-project/tarijs-all\";\n",
    );
    out.push_str(
        "import { TransactionResult, UnsignedTransactionV1 } from \"@tari-project/typescript-bindings\";\n",
    );

    out.push('\n');
    for bank in &banks {
        bank.write_interface(&mut out);
    }
    out.push('\n');
    for bank in &banks {
        bank.write_const(&mut out);
    }

    let bank_params: String = banks
        .iter()
        .map(|bank| format!(", {}: {}", bank.name, bank.interface))
        .collect();
    let bank_args: String = banks.iter().map(|bank| format!(", {}", bank.name)).collect();

    out.push('\n');
    out.push_str(&format!(
        "function buildTransaction(network: Network{bank_params}): UnsignedTransactionV1 {{\n"
    ));
    out.push_str(&format!("{INDENT}const builder = new TransactionBuilder(network);\n"));
    for operation in &details.operations {
        let statement = statement(operation)?;
        out.push_str(&format!("{INDENT}{};\n", write_expr(&statement, 1)));
    }
    out.push_str(&format!("{INDENT}return builder.buildUnsignedTransaction();\n"));
    out.push_str("}\n");

    out.push('\n');
    out.push_str(&format!(
        "export async function executeTransaction(signer: TariSigner, network: Network, accountId: number{bank_params}): Promise<TransactionResult> {{\n"
    ));
    out.push_str(&format!(
        "{INDENT}const submitTransactionRequest = buildTransactionRequest(buildTransaction(network{bank_args}), accountId);\n"
    ));
    out.push_str(&format!(
        "{INDENT}const txResult = await submitAndWaitForTransaction(signer, submitTransactionRequest);\n"
    ));
    out.push_str(&format!("{INDENT}return txResult.result.result;\n"));
    out.push_str("}\n");

    tracing::debug!(
        banks = banks.len(),
        operations = details.operations.len(),
        "rendered typescript module"
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Input banks
// ---------------------------------------------------------------------------

struct Bank<'a> {
    name: &'a str,
    interface: String,
    params: &'a [InputParameter],
}

impl<'a> Bank<'a> {
    fn new(title: &'a str, params: &'a [InputParameter]) -> Result<Self, CodegenError> {
        let interface = interface_name(title)?;
        check_identifier(title)?;
        for input in params {
            check_identifier(&input.param.name)?;
        }
        Ok(Bank {
            name: title,
            interface,
            params,
        })
    }

    fn write_interface(&self, out: &mut String) {
        if self.params.is_empty() {
            out.push_str(&format!("export interface {} {{\n}}\n", self.interface));
            return;
        }
        out.push_str(&format!("export interface {} {{\n", self.interface));
        for input in self.params {
            out.push_str(&format!(
                "{INDENT}{}: {};\n",
                input.param.name,
                ts_type(&input.param.param_type)
            ));
        }
        out.push_str("}\n");
    }

    fn write_const(&self, out: &mut String) {
        let values = Expr::Object {
            props: self
                .params
                .iter()
                .map(|input| {
                    let value = match &input.value {
                        Some(value) => json_expr(value),
                        None => Expr::Raw("undefined".into()),
                    };
                    (input.param.name.clone(), value)
                })
                .collect(),
            multiline: true,
        };
        out.push_str(&format!(
            "const {}: {} = {};\n",
            self.name,
            self.interface,
            write_expr(&values, 0)
        ));
    }
}

/// `params` -> `ParamsProps`.
fn interface_name(title: &str) -> Result<String, CodegenError> {
    let mut chars = title.chars();
    let first = chars.next().ok_or(CodegenError::EmptyInterfaceName)?;
    Ok(format!("{}{}Props", first.to_uppercase(), chars.as_str()))
}

fn check_identifier(name: &str) -> Result<(), CodegenError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        Ok(())
    } else {
        Err(CodegenError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

fn ts_type(param_type: &ParamType) -> &'static str {
    match param_type {
        ParamType::Bool => "boolean",
        ParamType::I8
        | ParamType::I16
        | ParamType::I32
        | ParamType::I64
        | ParamType::I128
        | ParamType::U8
        | ParamType::U16
        | ParamType::U32
        | ParamType::U64
        | ParamType::U128 => "number",
        _ => "string",
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// The handful of expression shapes the generated module needs.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    /// Emitted verbatim: identifiers, property accesses, number literals.
    Raw(String),
    Str(String),
    Array(Vec<Expr>),
    Object {
        props: Vec<(String, Expr)>,
        multiline: bool,
    },
    /// `callee(args...)`
    Call { callee: String, args: Vec<Expr> },
}

fn builder_call(method: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: format!("builder.{method}"),
        args,
    }
}

fn statement(operation: &Operation) -> Result<Expr, CodegenError> {
    Ok(match operation {
        Operation::PayFee { account, fee } => builder_call(
            "feeTransactionPayFromComponent",
            vec![
                Expr::Str(account.clone()),
                Expr::Call {
                    callee: "Amount.of".into(),
                    args: vec![Expr::Raw(fee.to_string())],
                },
            ],
        ),
        Operation::CallMethod {
            component_address,
            method_name,
            args,
        } => builder_call(
            "callMethod",
            vec![
                Expr::Object {
                    props: vec![
                        ("componentAddress".into(), arg_expr(component_address)),
                        ("methodName".into(), Expr::Str(method_name.clone())),
                    ],
                    multiline: true,
                },
                Expr::Array(args.iter().map(arg_expr).collect()),
            ],
        ),
        Operation::CallFunction {
            template_address,
            function_name,
            args,
        } => builder_call(
            "callFunction",
            vec![
                Expr::Object {
                    props: vec![
                        ("templateAddress".into(), Expr::Str(template_address.clone())),
                        ("functionName".into(), Expr::Str(function_name.clone())),
                    ],
                    multiline: true,
                },
                Expr::Array(args.iter().map(arg_expr).collect()),
            ],
        ),
        Operation::AddInstruction { instruction } => {
            let (name, fields) = match instruction {
                Instruction::EmitLog { level, message } => (
                    "EmitLog",
                    vec![
                        ("level".to_string(), arg_expr(level)),
                        ("message".to_string(), arg_expr(message)),
                    ],
                ),
            };
            builder_call(
                "addInstruction",
                vec![Expr::Object {
                    props: vec![(
                        name.to_string(),
                        Expr::Object {
                            props: fields,
                            multiline: true,
                        },
                    )],
                    multiline: true,
                }],
            )
        }
        Operation::AllocateComponentAddress { workspace_id } => builder_call(
            "allocateAddress",
            vec![
                Expr::Str("Component".into()),
                Expr::Str(workspace_id.to_string()),
            ],
        ),
        Operation::AllocateResourceAddress { workspace_id } => builder_call(
            "allocateAddress",
            vec![
                Expr::Str("Resource".into()),
                Expr::Str(workspace_id.to_string()),
            ],
        ),
        Operation::SaveVar { key } => builder_call("saveVar", vec![Expr::Str(key.to_string())]),
    })
}

fn arg_expr(arg: &ArgValue) -> Expr {
    match arg {
        ArgValue::Workspace { .. } => Expr::Object {
            props: vec![(
                "Workspace".into(),
                Expr::Str(arg.workspace_key().unwrap_or_default()),
            )],
            multiline: false,
        },
        ArgValue::Input { bank, param, .. } => Expr::Raw(format!("{bank}.{}", param.name)),
        ArgValue::Literal { value } => json_expr(value),
    }
}

fn json_expr(value: &Value) -> Expr {
    match value {
        Value::String(text) => Expr::Str(text.clone()),
        Value::Array(items) => Expr::Array(items.iter().map(json_expr).collect()),
        Value::Object(map) => Expr::Object {
            props: map.iter().map(|(k, v)| (k.clone(), json_expr(v))).collect(),
            multiline: true,
        },
        other => Expr::Raw(other.to_string()),
    }
}

/// Prints `expr` with continuation lines indented from `depth`.
fn write_expr(expr: &Expr, depth: usize) -> String {
    match expr {
        Expr::Raw(text) => text.clone(),
        Expr::Str(text) => string_literal(text),
        Expr::Array(items) => {
            let items: Vec<String> = items.iter().map(|item| write_expr(item, depth)).collect();
            format!("[{}]", items.join(", "))
        }
        Expr::Object { props, .. } if props.is_empty() => "{}".to_string(),
        Expr::Object {
            props,
            multiline: false,
        } => {
            let props: Vec<String> = props
                .iter()
                .map(|(key, value)| format!("{}: {}", property_key(key), write_expr(value, depth)))
                .collect();
            format!("{{ {} }}", props.join(", "))
        }
        Expr::Object {
            props,
            multiline: true,
        } => {
            let inner = INDENT.repeat(depth + 1);
            let props: Vec<String> = props
                .iter()
                .map(|(key, value)| {
                    format!("{inner}{}: {}", property_key(key), write_expr(value, depth + 1))
                })
                .collect();
            format!("{{\n{}\n{}}}", props.join(",\n"), INDENT.repeat(depth))
        }
        Expr::Call { callee, args } => {
            let args: Vec<String> = args.iter().map(|arg| write_expr(arg, depth)).collect();
            format!("{callee}({})", args.join(", "))
        }
    }
}

fn property_key(key: &str) -> String {
    if check_identifier(key).is_ok() {
        key.to_string()
    } else {
        string_literal(key)
    }
}

fn string_literal(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_names() {
        assert_eq!(interface_name("params").unwrap(), "ParamsProps");
        assert_eq!(interface_name("input").unwrap(), "InputProps");
        assert_eq!(interface_name(""), Err(CodegenError::EmptyInterfaceName));
    }

    #[test]
    fn identifiers() {
        assert!(check_identifier("componentAddress1").is_ok());
        assert!(check_identifier("_x$").is_ok());
        assert!(check_identifier("1st").is_err());
        assert!(check_identifier("my-bank").is_err());
    }

    #[test]
    fn typescript_types() {
        assert_eq!(ts_type(&ParamType::Bool), "boolean");
        assert_eq!(ts_type(&ParamType::U128), "number");
        assert_eq!(ts_type(&ParamType::I8), "number");
        assert_eq!(ts_type(&ParamType::String), "string");
        assert_eq!(ts_type(&ParamType::Vec(Box::new(ParamType::U8))), "string");
    }

    #[test]
    fn nested_objects_indent() {
        let expr = Expr::Object {
            props: vec![
                (
                    "outer".into(),
                    Expr::Object {
                        props: vec![("a".into(), Expr::Raw("1".into()))],
                        multiline: true,
                    },
                ),
                ("not-ident".into(), Expr::Str("x\"y".into())),
            ],
            multiline: true,
        };
        assert_eq!(
            write_expr(&expr, 1),
            "{\n        outer: {\n            a: 1\n        },\n        \"not-ident\": \"x\\\"y\"\n    }"
        );
    }

    #[test]
    fn workspace_arguments_are_inline_objects() {
        let arg = ArgValue::Workspace {
            node: "n1".into(),
            slot: None,
        };
        assert_eq!(write_expr(&arg_expr(&arg), 0), "{ Workspace: \"n1\" }");
    }
}
