//! Domain layer for picontrol-server.
//!
//! Pure types with no I/O: runtime configuration and the fixed command
//! whitelist.

pub mod commands;
pub mod config;

pub use commands::{CommandName, COMMAND_NAMES};
pub use config::ServerConfig;
