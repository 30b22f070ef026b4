//! The command registry: whitelist name → handler capability.
//!
//! A [`CommandRegistry`] is built once at startup by
//! [`CommandRegistry::standard`] and never mutated afterwards.  It is the
//! sole authority on which operations are reachable from the network: a
//! client can only invoke a handler registered here, with arguments passed
//! through the handler's declared slots.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::application::handlers::{
    diagnostics::{DiskUsage, ListProcesses, Memory, SystemInfo, Temperature},
    gpio::{Gpio, GpioAction, GpioCommand},
    power::{PowerAction, PowerCommand},
    scripts::RunScript,
    Ping,
};
use crate::application::host::{HostError, HostOps};
use crate::domain::{CommandName, ServerConfig, COMMAND_NAMES};

/// Failures a handler lets escape to the executor.
///
/// Most handlers report OS-level failures as text in their `Ok` payload;
/// only failures with no sensible textual result are returned here.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A callable unit a registry entry resolves to.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Executes the command with the client's positional arguments.
    async fn handle(&self, params: &[Value]) -> Result<String, HandlerError>;
}

/// One immutable registry entry.
#[derive(Clone)]
pub struct RegistryEntry {
    name: CommandName,
    min_args: usize,
    handler: Arc<dyn CommandHandler>,
}

impl RegistryEntry {
    /// The whitelisted command this entry serves.
    pub fn name(&self) -> CommandName {
        self.name
    }

    /// Declared minimum argument count.
    pub fn min_args(&self) -> usize {
        self.min_args
    }

    /// The handler capability.
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }
}

/// Immutable mapping from wire name to [`RegistryEntry`].
pub struct CommandRegistry {
    entries: HashMap<&'static str, RegistryEntry>,
}

impl CommandRegistry {
    /// Builds the production registry: every [`CommandName`] bound to its
    /// handler, all sharing `host` for OS access.
    pub fn standard(host: Arc<dyn HostOps>, config: &ServerConfig) -> Self {
        let gpio = Arc::new(Gpio::new(
            Arc::clone(&host),
            config.gpio_sysfs_root.clone(),
            config.default_pin,
        ));
        let gpio_command = |action| -> Arc<dyn CommandHandler> {
            Arc::new(GpioCommand::new(Arc::clone(&gpio), action))
        };

        let handler_for = |name: CommandName| -> Arc<dyn CommandHandler> {
            match name {
                CommandName::GpioOn => gpio_command(GpioAction::On),
                CommandName::GpioOff => gpio_command(GpioAction::Off),
                CommandName::GpioToggle => gpio_command(GpioAction::Toggle),
                CommandName::GpioRead => gpio_command(GpioAction::Read),
                CommandName::SystemInfo => Arc::new(SystemInfo::new(Arc::clone(&host))),
                CommandName::GetTemperature => Arc::new(Temperature::new(Arc::clone(&host))),
                CommandName::GetMemory => Arc::new(Memory::new(Arc::clone(&host))),
                CommandName::GetDiskUsage => Arc::new(DiskUsage::new(Arc::clone(&host))),
                CommandName::RunScript => Arc::new(RunScript::new(
                    Arc::clone(&host),
                    config.script_dir.clone(),
                    config.script_interpreter.clone(),
                    config.script_timeout,
                )),
                CommandName::ListProcesses => Arc::new(ListProcesses::new(Arc::clone(&host))),
                CommandName::Ping => Arc::new(Ping),
                CommandName::Reboot => {
                    Arc::new(PowerCommand::new(Arc::clone(&host), PowerAction::Reboot))
                }
                CommandName::Shutdown => {
                    Arc::new(PowerCommand::new(Arc::clone(&host), PowerAction::Shutdown))
                }
            }
        };

        Self::from_handlers(COMMAND_NAMES.into_iter().map(|name| (name, handler_for(name))))
    }

    /// Builds a registry from explicit handlers.  Arity comes from
    /// [`CommandName::min_args`].
    pub fn from_handlers(
        handlers: impl IntoIterator<Item = (CommandName, Arc<dyn CommandHandler>)>,
    ) -> Self {
        let entries = handlers
            .into_iter()
            .map(|(name, handler)| {
                let entry = RegistryEntry {
                    name,
                    min_args: name.min_args(),
                    handler,
                };
                (name.as_str(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Resolves a wire name.  `None` means the command is not allowed.
    pub fn lookup(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no command is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
