//! # picontrol-core
//!
//! Shared wire-protocol types for picontrol, a remote-control front end that
//! lets a browser drive a single host machine over a WebSocket: toggle GPIO
//! pins, query diagnostics and run whitelisted scripts.
//!
//! This crate has no I/O.  It defines:
//!
//! - **`protocol::request`** – decoding of inbound JSON frames into a
//!   [`CommandRequest`], with decode failures kept distinct from execution
//!   failures.
//! - **`protocol::messages`** – the closed set of outbound envelopes
//!   (`connection`, `command_response`, `error`).
//! - **`protocol::params`** – helpers for reading the heterogeneous
//!   positional arguments a command carries.

pub mod protocol;

pub use protocol::messages::{ServerMessage, Status};
pub use protocol::params::{first_param, param_text, parse_pin, ParamError};
pub use protocol::request::{decode_request, CommandRequest, DecodeError};
