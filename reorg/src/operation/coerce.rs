//! Value coercion for parameter binding.
//!
//! The set of conversions is closed: a value that is `null` or already of the
//! target kind passes through, integers become strings, numeric strings
//! become integers. Every other pairing is a [`ConversionError`].

use serde_json::Value;
use std::fmt;

use crate::error::ConversionError;

/// Primitive shape a parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Boolean,
    /// A list whose items are all strings.
    StringList,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::StringList => "string list",
        }
    }

    /// Whether `value` can be assigned without conversion.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => value.as_i64().is_some(),
            ValueKind::Boolean => value.is_boolean(),
            ValueKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the shape of a dynamic value, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Coerce `value` to `target`.
///
/// # Example
/// ```
/// use reorg::operation::coerce::{coerce, ValueKind};
/// use serde_json::json;
///
/// assert_eq!(coerce(json!(42), ValueKind::String).unwrap(), json!("42"));
/// assert_eq!(coerce(json!(" 7"), ValueKind::Integer).unwrap(), json!(7));
/// assert!(coerce(json!("seven"), ValueKind::Integer).is_err());
/// ```
pub fn coerce(value: Value, target: ValueKind) -> Result<Value, ConversionError> {
    if value.is_null() || target.accepts(&value) {
        return Ok(value);
    }

    match (value, target) {
        (Value::Number(n), ValueKind::String) if !n.is_f64() => Ok(Value::String(n.to_string())),
        (Value::String(s), ValueKind::Integer) => match s.trim().parse::<i64>() {
            Ok(n) => Ok(Value::from(n)),
            Err(_) => Err(ConversionError::NotNumeric(s)),
        },
        (other, target) => Err(ConversionError::Unsupported {
            from: kind_of(&other),
            to: target.as_str(),
        }),
    }
}

/// Coerce and unwrap a string.
pub fn into_string(value: Value) -> Result<String, ConversionError> {
    match coerce(value, ValueKind::String)? {
        Value::String(s) => Ok(s),
        other => Err(unsupported(&other, ValueKind::String)),
    }
}

/// Coerce and unwrap an integer.
pub fn into_integer(value: Value) -> Result<i64, ConversionError> {
    let coerced = coerce(value, ValueKind::Integer)?;
    coerced
        .as_i64()
        .ok_or_else(|| unsupported(&coerced, ValueKind::Integer))
}

/// Coerce and unwrap a non-negative integer (lengths, offsets).
pub fn into_count(value: Value) -> Result<usize, ConversionError> {
    let n = into_integer(value)?;
    usize::try_from(n).map_err(|_| ConversionError::Negative(n))
}

/// Coerce and unwrap a boolean.
pub fn into_bool(value: Value) -> Result<bool, ConversionError> {
    let coerced = coerce(value, ValueKind::Boolean)?;
    coerced
        .as_bool()
        .ok_or_else(|| unsupported(&coerced, ValueKind::Boolean))
}

/// Coerce and unwrap a list of strings.
pub fn into_string_list(value: Value) -> Result<Vec<String>, ConversionError> {
    match coerce(value, ValueKind::StringList)? {
        Value::Array(items) => items.into_iter().map(into_string).collect(),
        other => Err(unsupported(&other, ValueKind::StringList)),
    }
}

fn unsupported(value: &Value, target: ValueKind) -> ConversionError {
    ConversionError::Unsupported {
        from: kind_of(value),
        to: target.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_assignable_pass_through() {
        assert_eq!(coerce(Value::Null, ValueKind::Integer), Ok(Value::Null));
        assert_eq!(coerce(json!("x"), ValueKind::String), Ok(json!("x")));
        assert_eq!(coerce(json!(true), ValueKind::Boolean), Ok(json!(true)));
        assert_eq!(coerce(json!(["a", "b"]), ValueKind::StringList), Ok(json!(["a", "b"])));
    }

    #[test]
    fn test_integer_to_string() {
        assert_eq!(coerce(json!(-12), ValueKind::String), Ok(json!("-12")));
    }

    #[test]
    fn test_string_to_integer() {
        assert_eq!(coerce(json!("10"), ValueKind::Integer), Ok(json!(10)));
        assert_eq!(
            coerce(json!("ten"), ValueKind::Integer),
            Err(ConversionError::NotNumeric("ten".into()))
        );
    }

    #[test]
    fn test_closed_set_of_conversions() {
        assert_eq!(
            coerce(json!("yes"), ValueKind::Boolean),
            Err(ConversionError::Unsupported { from: "string", to: "boolean" })
        );
        assert_eq!(
            coerce(json!(1.5), ValueKind::String),
            Err(ConversionError::Unsupported { from: "float", to: "string" })
        );
        assert_eq!(
            coerce(json!(["a", 1]), ValueKind::StringList),
            Err(ConversionError::Unsupported { from: "list", to: "string list" })
        );
        assert_eq!(
            coerce(json!("First"), ValueKind::StringList),
            Err(ConversionError::Unsupported { from: "string", to: "string list" })
        );
    }

    #[test]
    fn test_into_count_rejects_negative() {
        assert_eq!(into_count(json!("3")), Ok(3));
        assert_eq!(into_count(json!(-1)), Err(ConversionError::Negative(-1)));
    }
}
