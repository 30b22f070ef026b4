//! Helpers for reading positional command arguments.
//!
//! Arguments arrive as arbitrary JSON values.  Browsers send pins both as
//! numbers (`17`) and as strings (`"17"`), so the helpers here accept either
//! form.

use serde_json::Value;
use thiserror::Error;

/// An argument could not be interpreted for the slot it was passed in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The pin argument is not a non-negative integer.
    #[error("Invalid GPIO pin: {0}")]
    InvalidPin(String),
}

/// Returns the first positional argument, if any.
pub fn first_param(params: &[Value]) -> Option<&Value> {
    params.first()
}

/// Renders an argument as plain text.
///
/// Strings are returned without quotes; every other value uses its JSON
/// representation (`17`, `true`, `null`).
pub fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses a GPIO pin number from a numeric or numeric-string argument.
///
/// The pin ends up in a sysfs path and in a `gpio` argv slot, so anything
/// other than a plain non-negative integer is rejected.
///
/// # Errors
///
/// Returns [`ParamError::InvalidPin`] for negative, fractional, out-of-range
/// or non-numeric values.
pub fn parse_pin(value: &Value) -> Result<u32, ParamError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse::<u32>().ok()
            } else {
                None
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| ParamError::InvalidPin(param_text(value)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_text_unquotes_strings() {
        assert_eq!(param_text(&json!("blink.py")), "blink.py");
        assert_eq!(param_text(&json!(18)), "18");
        assert_eq!(param_text(&json!(null)), "null");
    }

    #[test]
    fn test_parse_pin_accepts_number_and_numeric_string() {
        assert_eq!(parse_pin(&json!(18)), Ok(18));
        assert_eq!(parse_pin(&json!("27")), Ok(27));
        assert_eq!(parse_pin(&json!(" 4 ")), Ok(4));
    }

    #[test]
    fn test_parse_pin_rejects_path_like_strings() {
        // Arrange: a value that would escape the sysfs gpio directory
        let value = json!("../../../etc");

        // Act
        let result = parse_pin(&value);

        // Assert
        assert_eq!(result, Err(ParamError::InvalidPin("../../../etc".to_string())));
    }

    #[test]
    fn test_parse_pin_rejects_negative_and_fractional_numbers() {
        assert!(parse_pin(&json!(-1)).is_err());
        assert!(parse_pin(&json!(1.5)).is_err());
        assert!(parse_pin(&json!(true)).is_err());
        assert!(parse_pin(&json!("+5")).is_err());
    }

    #[test]
    fn test_parse_pin_rejects_values_beyond_u32() {
        assert!(parse_pin(&json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_invalid_pin_message_names_the_value() {
        let err = parse_pin(&json!("abc")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid GPIO pin: abc");
    }
}
