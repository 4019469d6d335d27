//! Input validation for values arriving from untyped sources.
//!
//! The typed API makes most wrong-shaped input unrepresentable. What is left
//! arrives as JSON (batch files, config): scalars must be strings or
//! integers, and a value list must be a scalar or an array of scalars.
//! All checks run before any storage call.

use crate::error::{Error, Result};
use crate::model::Values;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Convert a JSON scalar (string or integer) to its stored text form.
///
/// # Errors
///
/// Returns `InvalidArgument` for booleans, nulls, floats, arrays and objects.
pub fn scalar_from_json(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(Error::InvalidArgument(format!(
            "expected a string or integer, got {}",
            json_type_name(other)
        ))),
    }
}

/// Normalize a JSON scalar or array of scalars into [`Values`].
///
/// # Errors
///
/// Returns `InvalidArgument` if the value or any array element is not a
/// string or integer.
pub fn values_from_json(value: &Value) -> Result<Values> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(scalar_from_json)
            .collect::<Result<Vec<_>>>()
            .map(Values::new),
        scalar => scalar_from_json(scalar).map(Values::from),
    }
}

/// Serde adapter accepting a string or integer key.
///
/// # Errors
///
/// Fails deserialization when the key is not a string or integer.
pub fn deserialize_key<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_from_json(&value).map_err(serde::de::Error::custom)
}

/// Validate a physical table name from configuration.
///
/// # Errors
///
/// Returns `Config` if the name is empty or contains characters outside
/// `[A-Za-z0-9_]`.
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Config("table name must not be empty".to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::Config(format!(
            "table name '{name}' may only contain letters, digits and '_'"
        )));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "non-integer number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
