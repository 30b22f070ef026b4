//! Application layer: command dispatch and session bookkeeping.
//!
//! - [`host`] – the [`HostOps`] seam through which handlers reach the OS.
//! - [`handlers`] – one handler per whitelisted command.
//! - [`registry`] – the immutable name → handler table.
//! - [`executor`] – whitelist/arity checks and panic isolation.
//! - [`sessions`] – the active-session set.

pub mod executor;
pub mod handlers;
pub mod host;
pub mod registry;
pub mod sessions;

pub use executor::{CommandExecutor, CommandResult};
pub use host::{HostError, HostOps, ProcessOutput};
pub use registry::{CommandHandler, CommandRegistry, HandlerError};
pub use sessions::{ActiveSessions, SessionGuard, SessionId};
