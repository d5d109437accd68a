//! Parameter types of template functions and built-in nodes.
//!
//! [`ParamType`] mirrors the ledger's template type descriptor. Its serde
//! shape matches the descriptor's JSON: scalars are bare strings (`"U64"`),
//! compound types are single-key objects (`{"Vec":"U8"}`,
//! `{"Tuple":["Bool","String"]}`, `{"Other":{"name":"Bucket"}}`).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::ParsedValue;

/// Type of a node input/output or of an input-bank parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    Unit,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    String,
    Vec(Box<ParamType>),
    Tuple(Vec<ParamType>),
    Other { name: String },
}

/// Inclusive range accepted by an integer type.
///
/// The lower bound is signed and the upper bound unsigned so that both
/// `I128::MIN` and `U128::MAX` are representable without a bignum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerBounds {
    pub min: i128,
    pub max: u128,
}

impl IntegerBounds {
    fn signed(bits: u32) -> Self {
        IntegerBounds {
            min: i128::MIN >> (128 - bits),
            max: (i128::MAX >> (128 - bits)) as u128,
        }
    }

    fn unsigned(bits: u32) -> Self {
        IntegerBounds {
            min: 0,
            max: u128::MAX >> (128 - bits),
        }
    }

    /// Parses decimal text and range-checks it, returning the canonical
    /// decimal form.
    pub fn parse(&self, text: &str) -> Result<String, String> {
        let text = text.trim();
        let invalid = || "Invalid integer".to_string();
        if text.starts_with('+') {
            return Err(invalid());
        }
        match text.strip_prefix('-') {
            Some(digits) => {
                if digits.starts_with('+') {
                    return Err(invalid());
                }
                let magnitude: u128 = digits.parse().map_err(|_| invalid())?;
                if magnitude == 0 {
                    return Ok("0".to_string());
                }
                if magnitude > self.min.unsigned_abs() || self.min == 0 {
                    return Err(format!(
                        "Value must be greater than or equal to {}",
                        self.min
                    ));
                }
                Ok(format!("-{magnitude}"))
            }
            None => {
                let value: u128 = text.parse().map_err(|_| invalid())?;
                if value > self.max {
                    return Err(format!("Value must be less than or equal to {}", self.max));
                }
                Ok(value.to_string())
            }
        }
    }
}

impl ParamType {
    /// Returns `true` for the unit type (a function without a return value).
    pub fn is_unit(&self) -> bool {
        matches!(self, ParamType::Unit)
    }

    /// Returns `true` for any tuple type.
    pub fn is_tuple(&self) -> bool {
        matches!(self, ParamType::Tuple(_))
    }

    /// Returns the element types of a 2-tuple, `None` for anything else.
    pub fn tuple_pair(&self) -> Option<(&ParamType, &ParamType)> {
        match self {
            ParamType::Tuple(items) if items.len() == 2 => Some((&items[0], &items[1])),
            _ => None,
        }
    }

    /// Range of values for integer types.
    pub fn integer_bounds(&self) -> Option<IntegerBounds> {
        match self {
            ParamType::I8 => Some(IntegerBounds::signed(8)),
            ParamType::I16 => Some(IntegerBounds::signed(16)),
            ParamType::I32 => Some(IntegerBounds::signed(32)),
            ParamType::I64 => Some(IntegerBounds::signed(64)),
            ParamType::I128 => Some(IntegerBounds::signed(128)),
            ParamType::U8 => Some(IntegerBounds::unsigned(8)),
            ParamType::U16 => Some(IntegerBounds::unsigned(16)),
            ParamType::U32 => Some(IntegerBounds::unsigned(32)),
            ParamType::U64 => Some(IntegerBounds::unsigned(64)),
            ParamType::U128 => Some(IntegerBounds::unsigned(128)),
            _ => None,
        }
    }

    /// Parses text typed into an input field for this type.
    ///
    /// Integers are range-checked and kept as decimal strings (JSON numbers
    /// cannot hold 128-bit values), booleans accept `true`/`false`, and every
    /// other type is passed through as text.
    pub fn parse_input(&self, text: &str) -> ParsedValue {
        if let Some(bounds) = self.integer_bounds() {
            return match bounds.parse(text) {
                Ok(canonical) => ParsedValue::ok(Value::String(canonical)),
                Err(message) => ParsedValue::failed(message),
            };
        }
        match self {
            ParamType::Bool => match text.trim() {
                "true" => ParsedValue::ok(Value::Bool(true)),
                "false" => ParsedValue::ok(Value::Bool(false)),
                _ => ParsedValue::failed("Expected true or false"),
            },
            _ => ParsedValue::ok(Value::String(text.to_string())),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Vec(inner) => write!(f, "Vec<{inner}>"),
            ParamType::Tuple(items) => {
                f.write_str("Tuple<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(">")
            }
            ParamType::Other { name } => f.write_str(name),
            scalar => write!(f, "{scalar:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn serde_shape_matches_descriptor_json() {
        let ty: ParamType = serde_json::from_str(r#"{"Vec":"U8"}"#).unwrap();
        assert_eq!(ty, ParamType::Vec(Box::new(ParamType::U8)));

        let ty: ParamType = serde_json::from_str(r#"{"Other":{"name":"Bucket"}}"#).unwrap();
        assert_eq!(
            ty,
            ParamType::Other {
                name: "Bucket".into()
            }
        );

        assert_eq!(serde_json::to_string(&ParamType::U64).unwrap(), "\"U64\"");
    }

    #[test]
    fn display_prompt() {
        let ty = ParamType::Tuple(vec![
            ParamType::Vec(Box::new(ParamType::U8)),
            ParamType::Other {
                name: "Amount".into(),
            },
        ]);
        assert_eq!(ty.to_string(), "Tuple<Vec<U8>, Amount>");
        assert_eq!(ParamType::I32.to_string(), "I32");
    }

    #[test]
    fn tuple_pair_only_for_two_elements() {
        let pair = ParamType::Tuple(vec![ParamType::Bool, ParamType::String]);
        assert_eq!(pair.tuple_pair(), Some((&ParamType::Bool, &ParamType::String)));
        assert!(ParamType::Tuple(vec![ParamType::Bool]).tuple_pair().is_none());
        assert!(ParamType::U8.tuple_pair().is_none());
    }

    #[test]
    fn integer_bounds_at_extremes() {
        let i8b = ParamType::I8.integer_bounds().unwrap();
        assert_eq!((i8b.min, i8b.max), (-128, 127));
        let i128b = ParamType::I128.integer_bounds().unwrap();
        assert_eq!(i128b.min, i128::MIN);
        assert_eq!(i128b.max, i128::MAX as u128);
        let u128b = ParamType::U128.integer_bounds().unwrap();
        assert_eq!((u128b.min, u128b.max), (0, u128::MAX));
    }

    #[test]
    fn parse_integer_inputs() {
        let parsed = ParamType::U8.parse_input(" 255 ");
        assert!(parsed.success);
        assert_eq!(parsed.data, Some(Value::String("255".into())));

        let too_big = ParamType::U8.parse_input("256");
        assert!(!too_big.success);
        assert_eq!(
            too_big.error,
            Some(Value::String("Value must be less than or equal to 255".into()))
        );

        let negative = ParamType::U32.parse_input("-1");
        assert!(!negative.success);

        assert!(ParamType::I16.parse_input("-32768").success);
        assert!(!ParamType::I16.parse_input("-32769").success);
        assert!(!ParamType::I64.parse_input("abc").success);
        assert!(!ParamType::I64.parse_input("").success);
        assert_eq!(
            ParamType::I8.parse_input("-0").data,
            Some(Value::String("0".into()))
        );
    }

    #[test]
    fn parse_bool_and_text_inputs() {
        assert_eq!(ParamType::Bool.parse_input("true").data, Some(Value::Bool(true)));
        assert!(!ParamType::Bool.parse_input("yes").success);

        let text = ParamType::String.parse_input("hello");
        assert!(text.success);
        assert_eq!(text.data, Some(Value::String("hello".into())));
    }

    proptest! {
        #[test]
        fn any_i64_parses_for_i64(v in any::<i64>()) {
            let parsed = ParamType::I64.parse_input(&v.to_string());
            prop_assert!(parsed.success);
            prop_assert_eq!(parsed.data, Some(Value::String(v.to_string())));
        }

        #[test]
        fn u16_accepts_exactly_its_range(v in 0u32..200_000) {
            let parsed = ParamType::U16.parse_input(&v.to_string());
            prop_assert_eq!(parsed.success, v <= u16::MAX as u32);
        }
    }
}
