//! `reboot` and `shutdown`.
//!
//! Both run through `sudo` and take no arguments.  Any connected client can
//! invoke them: the command channel has no authentication, so deployments
//! must keep the WebSocket port on a trusted network.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, warn};

use crate::application::host::HostOps;
use crate::application::registry::{CommandHandler, HandlerError};

/// Which power transition a [`PowerCommand`] requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Reboot,
    Shutdown,
}

impl PowerAction {
    fn argv(self) -> &'static [&'static str] {
        match self {
            Self::Reboot => &["reboot"],
            Self::Shutdown => &["shutdown", "now"],
        }
    }

    fn started(self) -> &'static str {
        match self {
            Self::Reboot => "Rebooting system...",
            Self::Shutdown => "Shutting down system...",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Reboot => "rebooting",
            Self::Shutdown => "shutting down",
        }
    }
}

/// Handler for `reboot` / `shutdown`.
pub struct PowerCommand {
    host: Arc<dyn HostOps>,
    action: PowerAction,
}

impl PowerCommand {
    pub fn new(host: Arc<dyn HostOps>, action: PowerAction) -> Self {
        Self { host, action }
    }
}

#[async_trait]
impl CommandHandler for PowerCommand {
    async fn handle(&self, _params: &[Value]) -> Result<String, HandlerError> {
        warn!("power action requested: {:?}", self.action);
        match self.host.run_checked("sudo", self.action.argv()).await {
            Ok(_) => Ok(self.action.started().to_string()),
            Err(e) => {
                error!("{} failed: {e}", self.action.verb());
                Ok(format!("Error {}: {e}", self.action.verb()))
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::host::ProcessOutput;
    use crate::infrastructure::host::MockHost;
    use serde_json::json;

    fn command(host: &Arc<MockHost>, action: PowerAction) -> PowerCommand {
        PowerCommand::new(Arc::clone(host) as Arc<dyn HostOps>, action)
    }

    #[tokio::test]
    async fn test_reboot_runs_sudo_reboot() {
        // Arrange
        let host = Arc::new(MockHost::new().with_program("sudo reboot", ProcessOutput::ok("")));

        // Act
        let result = command(&host, PowerAction::Reboot).handle(&[]).await.unwrap();

        // Assert
        assert_eq!(result, "Rebooting system...");
        assert_eq!(host.calls(), vec!["sudo reboot"]);
    }

    #[tokio::test]
    async fn test_shutdown_ignores_params() {
        let host = Arc::new(MockHost::new().with_program("sudo shutdown now", ProcessOutput::ok("")));

        let result = command(&host, PowerAction::Shutdown)
            .handle(&[json!("-r"), json!("+5")])
            .await
            .unwrap();

        assert_eq!(result, "Shutting down system...");
        assert_eq!(host.calls(), vec!["sudo shutdown now"]);
    }

    #[tokio::test]
    async fn test_sudo_failure_is_reported_as_text() {
        let host = Arc::new(MockHost::new().with_program(
            "sudo reboot",
            ProcessOutput::failed(1, "sudo: a password is required\n"),
        ));

        let result = command(&host, PowerAction::Reboot).handle(&[]).await.unwrap();

        assert_eq!(
            result,
            "Error rebooting: sudo exited with status 1: sudo: a password is required"
        );
    }

    #[tokio::test]
    async fn test_missing_sudo_is_reported_as_text() {
        let host = Arc::new(MockHost::new());
        let result = command(&host, PowerAction::Shutdown).handle(&[]).await.unwrap();
        assert!(result.starts_with("Error shutting down: failed to run sudo"), "{result}");
    }
}
