//! Locally supplied input values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of parsing a value the user typed into a node or input bank.
///
/// The editor keeps failed parses around (so the field can show the error),
/// which is why success is a flag rather than a `Result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedValue {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ParsedValue {
    /// A successfully parsed value.
    pub fn ok(data: impl Into<Value>) -> Self {
        ParsedValue {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    /// A failed parse carrying a human-readable message.
    pub fn failed(message: impl Into<String>) -> Self {
        ParsedValue {
            success: false,
            data: None,
            error: Some(Value::String(message.into())),
        }
    }

    /// The parsed data, if parsing succeeded.
    pub fn value(&self) -> Option<&Value> {
        if self.success {
            self.data.as_ref()
        } else {
            None
        }
    }

    /// Whether this value satisfies a required input: parsed successfully
    /// and, when textual, non-empty.
    pub fn is_filled(&self) -> bool {
        self.success && !matches!(&self.data, Some(Value::String(s)) if s.is_empty())
    }
}
