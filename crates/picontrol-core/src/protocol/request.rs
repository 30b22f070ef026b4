//! Inbound request decoding.
//!
//! A client frame is a JSON object:
//!
//! ```json
//! {"command": "gpio_on", "params": [17]}
//! ```
//!
//! Decoding is deliberately lenient about the command itself: a missing or
//! `null` `command` decodes to a request with no name, which simply fails the
//! whitelist lookup downstream.  Only frames that are structurally unusable
//! (not JSON, not an object, `params` not an array) are decode errors.

use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons an inbound frame could not be turned into a [`CommandRequest`].
///
/// These are reported to the client as an `error` envelope without
/// `command`/`params` fields and never close the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON.  `detail` is the parser message, kept for
    /// logging only; the client sees the fixed text.
    #[error("Invalid JSON format")]
    InvalidJson { detail: String },

    /// The frame is valid JSON but not an object.
    #[error("request must be a JSON object")]
    NotAnObject,

    /// `params` is present but is not an array.
    #[error("params must be a JSON array")]
    ParamsNotArray,
}

/// A decoded command invocation.  Ephemeral: built per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// Requested command name.  `None` when the frame had no `command`.
    pub command: Option<String>,
    /// Positional arguments, in order.  Empty when `params` was absent.
    pub params: Vec<Value>,
}

impl CommandRequest {
    /// Creates a request with the given name and arguments.
    pub fn new(command: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            command: Some(command.into()),
            params,
        }
    }

    /// The command name for log and error messages (`null` when absent).
    pub fn command_label(&self) -> &str {
        self.command.as_deref().unwrap_or("null")
    }
}

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns [`DecodeError`] when the frame is not a JSON object or carries a
/// non-array `params`.
///
/// # Example
///
/// ```rust
/// use picontrol_core::decode_request;
///
/// let req = decode_request(r#"{"command":"ping"}"#).unwrap();
/// assert_eq!(req.command.as_deref(), Some("ping"));
/// assert!(req.params.is_empty());
/// ```
pub fn decode_request(frame: &str) -> Result<CommandRequest, DecodeError> {
    let value: Value = serde_json::from_str(frame).map_err(|e| DecodeError::InvalidJson {
        detail: e.to_string(),
    })?;

    let Value::Object(mut object) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let command = command_name(&mut object);
    let params = match object.remove("params") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(DecodeError::ParamsNotArray),
    };

    Ok(CommandRequest { command, params })
}

/// Extracts the command name.  Non-string names are carried as their JSON
/// text so they fail lookup with a readable message.
fn command_name(object: &mut Map<String, Value>) -> Option<String> {
    match object.remove("command") {
        None | Some(Value::Null) => None,
        Some(Value::String(name)) => Some(name),
        Some(other) => Some(other.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_command_with_params() {
        // Arrange
        let frame = r#"{"command":"gpio_on","params":[17]}"#;

        // Act
        let req = decode_request(frame).unwrap();

        // Assert
        assert_eq!(req, CommandRequest::new("gpio_on", vec![json!(17)]));
    }

    #[test]
    fn test_missing_params_defaults_to_empty_list() {
        let req = decode_request(r#"{"command":"system_info"}"#).unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_null_params_defaults_to_empty_list() {
        let req = decode_request(r#"{"command":"ping","params":null}"#).unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_missing_command_is_not_a_decode_error() {
        // A missing command fails the whitelist lookup later, not here.
        let req = decode_request(r#"{"params":[1]}"#).unwrap();
        assert_eq!(req.command, None);
        assert_eq!(req.command_label(), "null");
    }

    #[test]
    fn test_non_string_command_is_carried_as_json_text() {
        let req = decode_request(r#"{"command":42}"#).unwrap();
        assert_eq!(req.command.as_deref(), Some("42"));
    }

    #[test]
    fn test_invalid_json_is_decode_error_with_fixed_message() {
        let err = decode_request("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson { .. }));
        assert_eq!(err.to_string(), "Invalid JSON format");
    }

    #[test]
    fn test_non_object_is_decode_error() {
        assert_eq!(decode_request("[1,2,3]").unwrap_err(), DecodeError::NotAnObject);
        assert_eq!(decode_request(r#""ping""#).unwrap_err(), DecodeError::NotAnObject);
    }

    #[test]
    fn test_scalar_params_is_decode_error() {
        let err = decode_request(r#"{"command":"gpio_on","params":17}"#).unwrap_err();
        assert_eq!(err, DecodeError::ParamsNotArray);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let req = decode_request(r#"{"command":"ping","id":7,"params":[]}"#).unwrap();
        assert_eq!(req.command.as_deref(), Some("ping"));
    }
}
