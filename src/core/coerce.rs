//! Lax coercion of raw input values into field types
//!
//! Raw input arrives as a [`serde_json::Value`] regardless of whether it came
//! from JSON, YAML or a hand-built mapping. These helpers accept the loose
//! forms a caller is likely to send (`"30"` for an integer, `80` for a
//! decimal) and reject everything else with a `WrongType` violation.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::core::error::{ErrorKind, Violation};

/// Human name of a raw value's type, for messages
pub fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "decimal",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "mapping",
    }
}

fn wrong_type(field: &str, expected: &str, value: &JsonValue) -> Violation {
    Violation::new(
        ErrorKind::WrongType,
        field,
        format!("Input should be a valid {}, got {}", expected, type_name(value)),
    )
    .with_help(format!("Provide {} as {}", field, expected_article(expected)))
}

fn expected_article(expected: &str) -> String {
    match expected.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {}", expected),
        _ => format!("a {}", expected),
    }
}

/// Strings only; numbers and booleans are not stringified
pub fn text(field: &str, value: &JsonValue) -> Result<String, Violation> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        other => Err(wrong_type(field, "string", other)),
    }
}

/// Integers, integral decimals (`80.0`) and integer strings (`"80"`)
///
/// Wide enough that callers can range-check before narrowing.
pub fn integer(field: &str, value: &JsonValue) -> Result<i128, Violation> {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i128::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(i128::from(u))
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i128),
                    _ => Err(Violation::new(
                        ErrorKind::WrongType,
                        field,
                        "Input should be a valid integer, got a number with a fractional part",
                    )),
                }
            }
        }
        JsonValue::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| {
                Violation::new(
                    ErrorKind::WrongType,
                    field,
                    "Input should be a valid integer, unable to parse string as an integer",
                )
            }),
        other => Err(wrong_type(field, "integer", other)),
    }
}

/// Any finite number, or a string holding one
pub fn decimal(field: &str, value: &JsonValue) -> Result<f64, Violation> {
    let parsed = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(wrong_type(field, "number", other)),
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(Violation::new(
            ErrorKind::WrongType,
            field,
            "Input should be a finite number",
        )),
    }
}

/// A sequence of strings; item paths are `field.<index>`
pub fn text_list(field: &str, value: &JsonValue) -> Result<Vec<String>, Violation> {
    let items = match value {
        JsonValue::Array(items) => items,
        other => return Err(wrong_type(field, "sequence", other)),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| text(&format!("{}.{}", field, i), item))
        .collect()
}

/// A mapping of string keys to string values; value paths are `field.<key>`
pub fn text_map(field: &str, value: &JsonValue) -> Result<BTreeMap<String, String>, Violation> {
    let entries = match value {
        JsonValue::Object(entries) => entries,
        other => return Err(wrong_type(field, "mapping", other)),
    };
    entries
        .iter()
        .map(|(key, item)| Ok((key.clone(), text(&format!("{}.{}", field, key), item)?)))
        .collect()
}
