//! picontrol-server library crate.
//!
//! A WebSocket command server that lets a browser drive one host machine:
//! GPIO pins, diagnostics, whitelisted scripts and power control.  A small
//! static-file server delivers the browser UI.
//!
//! # Architecture
//!
//! ```text
//! Browser (JSON over WebSocket)          Browser (HTTP GET)
//!         ↕                                      ↕
//! [picontrol-server]
//!   ├── domain/           Pure types: ServerConfig, the command whitelist
//!   ├── application/      Registry, executor, handlers, session set
//!   │     └── host        HostOps seam (processes + files)
//!   └── infrastructure/
//!         ├── ws_server/      WebSocket accept loop (tokio-tungstenite)
//!         ├── static_server/  Static files for the UI
//!         ├── config_file/    Optional TOML config
//!         └── host/           SystemHost (tokio::process) and MockHost
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` reaches the OS only through [`application::HostOps`].
//! - `infrastructure` owns sockets, the filesystem and process spawning.

/// Domain layer: configuration and command names (no I/O).
pub mod domain;

/// Application layer: command dispatch and session bookkeeping.
pub mod application;

/// Infrastructure layer: listeners, host access, config loading.
pub mod infrastructure;
