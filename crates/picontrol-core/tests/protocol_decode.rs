//! Integration tests for the picontrol-core request/response protocol.
//!
//! These exercise the public API the way the server uses it: decode a raw
//! frame, then build the envelope that would be written back.

use picontrol_core::{decode_request, DecodeError, ServerMessage};
use serde_json::{json, Value};

/// Builds the envelope the server sends for a frame whose command resolved to
/// `result`, or the decode-error envelope if the frame is unusable.
fn respond(frame: &str, result: &str) -> Value {
    let msg = match decode_request(frame) {
        Ok(req) => {
            let label = req.command_label().to_string();
            ServerMessage::success(label, req.params, result)
        }
        Err(e) => ServerMessage::decode_error(e.to_string()),
    };
    serde_json::from_str(&msg.to_json().expect("envelope must serialize")).unwrap()
}

#[test]
fn test_valid_frame_produces_echoing_success_envelope() {
    let value = respond(r#"{"command":"ping","params":["x",1]}"#, "pong");

    assert_eq!(value["type"], "command_response");
    assert_eq!(value["status"], "success");
    assert_eq!(value["command"], "ping");
    assert_eq!(value["params"], json!(["x", 1]));
    assert_eq!(value["result"], "pong");
}

#[test]
fn test_garbage_frames_produce_decode_error_envelope_without_command() {
    for frame in ["", "{", "not json at all", "{\"command\":}"] {
        let value = respond(frame, "unused");

        assert_eq!(value["type"], "error", "frame {frame:?}");
        assert_eq!(value["error"], "Invalid JSON format", "frame {frame:?}");
        assert!(value.get("command").is_none(), "frame {frame:?}");
        assert!(value.get("params").is_none(), "frame {frame:?}");
    }
}

#[test]
fn test_structural_errors_are_distinct_from_invalid_json() {
    assert_eq!(decode_request("42"), Err(DecodeError::NotAnObject));
    assert_eq!(
        decode_request(r#"{"command":"run_script","params":"a.py"}"#),
        Err(DecodeError::ParamsNotArray)
    );
}

#[test]
fn test_greeting_matches_wire_shape() {
    let text = ServerMessage::connected("hello").to_json().unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        value,
        json!({"type": "connection", "status": "connected", "message": "hello"})
    );
}
