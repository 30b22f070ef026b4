//! WebSocket command channel: accept loop and per-session task.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Upgrading each accepted connection to a WebSocket session.
//! 3. Sending the greeting, then answering every data frame with exactly one
//!    envelope, in arrival order.
//! 4. Keeping the active-session set consistent however a session ends.
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! # Concurrency
//!
//! Each session runs in its own Tokio task.  Within a session, a command runs
//! to completion before the next frame is read, so responses are strictly
//! FIFO.  Across sessions, commands run concurrently.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use picontrol_core::ServerMessage;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::{ActiveSessions, CommandExecutor};
use crate::domain::ServerConfig;

/// How often the accept loop re-checks the `running` flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// State shared by every session task.
#[derive(Clone)]
pub struct ServerState {
    pub executor: Arc<CommandExecutor>,
    pub sessions: ActiveSessions,
    pub greeting: String,
}

impl ServerState {
    pub fn new(executor: Arc<CommandExecutor>, greeting: impl Into<String>) -> Self {
        Self {
            executor,
            sessions: ActiveSessions::new(),
            greeting: greeting.into(),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.ws_bind_addr` and serves sessions until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn run_server(
    config: &ServerConfig,
    state: ServerState,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.ws_bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind WebSocket listener on {}",
                config.ws_bind_addr
            )
        })?;

    info!("WebSocket command server listening on {}", config.ws_bind_addr);
    serve(listener, state, running).await;
    Ok(())
}

/// Runs the accept loop on an already-bound listener.
///
/// Split from [`run_server`] so tests can bind an ephemeral port first.
pub async fn serve(listener: TcpListener, state: ServerState, running: Arc<AtomicBool>) {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping WebSocket accept loop");
            break;
        }

        // Bounded wait so the flag is observed even with no incoming clients.
        match timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let state = state.clone();
                tokio::spawn(async move {
                    handle_client_session(stream, peer_addr, state).await;
                });
            }
            Ok(Err(e)) => {
                // Transient (e.g. out of file descriptors); keep accepting.
                error!("accept error: {e}");
            }
            Err(_) => {}
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Entry point of each per-session task; logs how the session ended.
async fn handle_client_session(stream: TcpStream, peer_addr: SocketAddr, state: ServerState) {
    match run_session(stream, peer_addr, state).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs one session from handshake to close.
///
/// The session guard is held for the whole function, so the session leaves
/// the active set on every return path.
///
/// # Errors
///
/// Returns an error if the handshake fails or the transport breaks.
async fn run_session(stream: TcpStream, peer_addr: SocketAddr, state: ServerState) -> anyhow::Result<()> {
    let mut ws = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let guard = state.sessions.register(peer_addr);
    let id = guard.id();
    info!(
        "session {id} opened from {peer_addr} ({} active)",
        state.sessions.len()
    );

    send(&mut ws, &ServerMessage::connected(state.greeting.as_str()))
        .await
        .with_context(|| format!("session {id}: failed to send greeting"))?;

    while let Some(frame) = ws.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
            Err(e) => return Err(e).with_context(|| format!("session {id}: receive failed")),
        };

        let reply = match frame {
            WsMessage::Text(text) => respond(&state, id, &text).await,
            WsMessage::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => respond(&state, id, &text).await,
                Err(_) => {
                    debug!("session {id}: binary frame is not UTF-8");
                    ServerMessage::decode_error("Invalid JSON format")
                }
            },
            // The close reply is queued by tungstenite and flushed on the next
            // poll, which then reports the stream as finished.
            WsMessage::Close(_) => {
                debug!("session {id}: close frame received");
                continue;
            }
            // Control frames; tungstenite answers pings itself.
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
        };

        send(&mut ws, &reply)
            .await
            .with_context(|| format!("session {id}: send failed"))?;
    }

    Ok(())
}

async fn respond(state: &ServerState, id: uuid::Uuid, text: &str) -> ServerMessage {
    let reply = state.executor.respond(text).await;
    match &reply {
        ServerMessage::CommandResponse { command, .. } => info!("session {id}: executed {command}"),
        ServerMessage::Error { command: Some(command), error, .. } => {
            info!("session {id}: {command} failed: {error}")
        }
        ServerMessage::Error { error, .. } => info!("session {id}: rejected frame: {error}"),
        ServerMessage::Connection { .. } => {}
    }
    reply
}

async fn send(ws: &mut WebSocketStream<TcpStream>, message: &ServerMessage) -> anyhow::Result<()> {
    let json = message.to_json().context("failed to encode envelope")?;
    ws.send(WsMessage::Text(json)).await?;
    Ok(())
}
