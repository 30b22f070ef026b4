//! Command execution: whitelist check, arity check, handler invocation.
//!
//! [`CommandExecutor`] turns one decoded request into exactly one outcome.
//! A handler that returns an error *or panics* becomes a
//! [`CommandResult::Failure`]; nothing a handler does can take down the
//! session task that called it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use picontrol_core::{decode_request, DecodeError, ServerMessage};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::application::registry::CommandRegistry;

/// Outcome of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The handler ran to completion.  The text may itself describe an
    /// OS-level failure.
    Success(String),
    /// The command could not be executed; the text is sent to the client.
    Failure(String),
}

/// Executes requests against an immutable [`CommandRegistry`].
///
/// Cheap to share: every session holds the same `Arc<CommandExecutor>`.
pub struct CommandExecutor {
    registry: Arc<CommandRegistry>,
}

impl CommandExecutor {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Executes `name` with `params`.
    ///
    /// Unknown or absent names are refused without touching any handler, as
    /// are calls with fewer arguments than the command declares.
    pub async fn execute(&self, name: Option<&str>, params: &[Value]) -> CommandResult {
        let Some(entry) = name.and_then(|name| self.registry.lookup(name)) else {
            let label = name.unwrap_or("null");
            warn!("command not allowed: {label}");
            return CommandResult::Failure(format!("command not allowed: {label}"));
        };

        let command = entry.name();
        if params.len() < entry.min_args() {
            let min = entry.min_args();
            warn!("command {command}: {} argument(s) given, {min} required", params.len());
            return CommandResult::Failure(format!(
                "command {command} requires at least {min} argument(s)"
            ));
        }

        let call = AssertUnwindSafe(entry.handler().handle(params)).catch_unwind();
        match call.await {
            Ok(Ok(text)) => CommandResult::Success(text),
            Ok(Err(e)) => {
                warn!("command {command} failed: {e}");
                CommandResult::Failure(format!("{command}: {e}"))
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!("command {command} panicked: {reason}");
                CommandResult::Failure(format!("{command}: handler panicked: {reason}"))
            }
        }
    }

    /// Decodes one inbound frame, executes it and builds the reply envelope.
    ///
    /// Always produces exactly one envelope per frame.
    pub async fn respond(&self, frame: &str) -> ServerMessage {
        let request = match decode_request(frame) {
            Ok(request) => request,
            Err(e) => {
                if let DecodeError::InvalidJson { detail } = &e {
                    debug!("undecodable frame: {detail}");
                }
                return ServerMessage::decode_error(e.to_string());
            }
        };

        match self.execute(request.command.as_deref(), &request.params).await {
            CommandResult::Success(text) => {
                let label = request.command_label().to_string();
                ServerMessage::success(label, request.params, text)
            }
            CommandResult::Failure(msg) => {
                ServerMessage::execution_error(request.command, request.params, msg)
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
