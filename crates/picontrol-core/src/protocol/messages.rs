//! Outbound JSON envelopes sent from the server to a connected client.
//!
//! Every envelope is a JSON object with a `"type"` discriminant and a
//! `"status"` field:
//!
//! ```json
//! {"type":"connection","status":"connected","message":"Connected to host"}
//! {"type":"command_response","status":"success","command":"ping","params":[],"result":"pong"}
//! {"type":"error","status":"error","error":"Invalid JSON format"}
//! ```
//!
//! The set of shapes is closed.  `error` envelopes produced by a decode
//! failure carry no `command`/`params` (they are unknown); envelopes produced
//! by an execution failure echo both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of the `"status"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Used only by the greeting sent when a session opens.
    Connected,
    /// The command was found and its handler ran to completion.
    Success,
    /// The frame could not be decoded or the command could not be executed.
    Error,
}

/// All messages the server writes to a client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting, sent exactly once before any inbound frame is processed.
    Connection { status: Status, message: String },

    /// Result of a successfully dispatched command.
    ///
    /// `result` may itself describe an OS-level failure (for example
    /// `"Error controlling GPIO 18"`); the envelope still reports `success`
    /// because the command was reachable and its handler completed.
    CommandResponse {
        status: Status,
        command: String,
        params: Vec<Value>,
        result: String,
    },

    /// Decode or execution failure.
    Error {
        status: Status,
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Vec<Value>>,
    },
}

impl ServerMessage {
    /// Builds the greeting envelope.
    pub fn connected(message: impl Into<String>) -> Self {
        Self::Connection {
            status: Status::Connected,
            message: message.into(),
        }
    }

    /// Builds a `command_response` envelope echoing the request.
    pub fn success(command: impl Into<String>, params: Vec<Value>, result: impl Into<String>) -> Self {
        Self::CommandResponse {
            status: Status::Success,
            command: command.into(),
            params,
            result: result.into(),
        }
    }

    /// Builds the `error` envelope for a frame that could not be decoded.
    ///
    /// The command and params are unknown, so both fields are omitted.
    pub fn decode_error(error: impl Into<String>) -> Self {
        Self::Error {
            status: Status::Error,
            error: error.into(),
            command: None,
            params: None,
        }
    }

    /// Builds the `error` envelope for a decoded command that failed to
    /// execute (not whitelisted, too few arguments, handler failure).
    pub fn execution_error(command: Option<String>, params: Vec<Value>, error: impl Into<String>) -> Self {
        Self::Error {
            status: Status::Error,
            error: error.into(),
            command,
            params: Some(params),
        }
    }

    /// Serializes the envelope to the JSON text sent in a WebSocket frame.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error.  None of the envelope
    /// shapes contain non-string map keys, so this does not fail in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connected_serializes_with_type_and_status() {
        // Arrange
        let msg = ServerMessage::connected("Connected to host");

        // Act
        let value: Value = serde_json::to_value(&msg).unwrap();

        // Assert
        assert_eq!(
            value,
            json!({"type": "connection", "status": "connected", "message": "Connected to host"})
        );
    }

    #[test]
    fn test_success_echoes_command_and_params() {
        let msg = ServerMessage::success("gpio_on", vec![json!(17)], "GPIO 17 on");
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "command_response",
                "status": "success",
                "command": "gpio_on",
                "params": [17],
                "result": "GPIO 17 on"
            })
        );
    }

    #[test]
    fn test_decode_error_omits_command_and_params() {
        // Arrange
        let msg = ServerMessage::decode_error("Invalid JSON format");

        // Act
        let json = msg.to_json().unwrap();

        // Assert: the keys must be absent, not null
        assert!(!json.contains("command"), "decode errors must not carry command: {json}");
        assert!(!json.contains("params"), "decode errors must not carry params: {json}");
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""status":"error""#));
    }

    #[test]
    fn test_execution_error_carries_command_and_params() {
        let msg = ServerMessage::execution_error(
            Some("format_disk".to_string()),
            vec![json!("/dev/sda")],
            "command not allowed: format_disk",
        );
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["command"], "format_disk");
        assert_eq!(value["params"], json!(["/dev/sda"]));
        assert_eq!(value["error"], "command not allowed: format_disk");
    }

    #[test]
    fn test_execution_error_without_command_omits_only_command() {
        let msg = ServerMessage::execution_error(None, vec![], "command not allowed: null");
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("command").is_none());
        assert_eq!(value["params"], json!([]));
    }

    #[test]
    fn test_envelope_deserializes_from_client_view() {
        // A client parses envelopes by their `type`; make sure the tag is honoured.
        let json = r#"{"type":"error","status":"error","error":"boom"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ServerMessage::decode_error("boom"));
    }
}
