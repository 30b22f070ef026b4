//! Command handlers.
//!
//! Every OS-level side effect reachable from the network happens inside one
//! of these handler bodies, through the [`HostOps`](crate::application::host::HostOps)
//! seam.

pub mod diagnostics;
pub mod gpio;
pub mod power;
pub mod scripts;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::registry::{CommandHandler, HandlerError};

/// Liveness check: always `"pong"`, no side effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        Ok("pong".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ping_ignores_params() {
        assert_eq!(Ping.handle(&[]).await.unwrap(), "pong");
        assert_eq!(Ping.handle(&[json!(1), json!("x"), json!(null)]).await.unwrap(), "pong");
    }
}
