//! GPIO pin control.
//!
//! Every pin operation tries two control paths in order:
//!
//! 1. **Primary**: the WiringPi `gpio` command-line helper.
//! 2. **Fallback**: direct writes/reads of the sysfs attributes under
//!    `<sysfs root>/gpio<pin>/`.
//!
//! If both fail the handler returns a descriptive error *text*, not an
//! error value, so the client sees it inside a normal command response.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use picontrol_core::{first_param, parse_pin, ParamError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::host::{HostError, HostOps};
use crate::application::registry::{CommandHandler, HandlerError};

/// Which control path completed an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPath {
    Helper,
    Sysfs,
}

/// Shared two-tier access to GPIO pins.
pub struct Gpio {
    host: Arc<dyn HostOps>,
    sysfs_root: PathBuf,
    default_pin: u32,
}

impl Gpio {
    /// Creates pin access over `host`, falling back to files under
    /// `sysfs_root`.
    pub fn new(host: Arc<dyn HostOps>, sysfs_root: PathBuf, default_pin: u32) -> Self {
        Self {
            host,
            sysfs_root,
            default_pin,
        }
    }

    /// The pin named by the first argument, or the default pin.
    pub fn pin_from(&self, params: &[Value]) -> Result<u32, ParamError> {
        first_param(params).map_or(Ok(self.default_pin), parse_pin)
    }

    fn attribute(&self, pin: u32, name: &str) -> PathBuf {
        self.sysfs_root.join(format!("gpio{pin}")).join(name)
    }

    /// Drives `pin` as an output at `level` (0 or 1).
    ///
    /// Returns the path that succeeded, or `None` when both failed.
    pub async fn write_level(&self, pin: u32, level: u8) -> Option<ControlPath> {
        match self.write_with_helper(pin, level).await {
            Ok(()) => return Some(ControlPath::Helper),
            Err(e) => warn!("gpio helper could not set pin {pin}: {e}; trying sysfs"),
        }
        match self.write_with_sysfs(pin, level).await {
            Ok(()) => Some(ControlPath::Sysfs),
            Err(e) => {
                warn!("sysfs could not set pin {pin}: {e}");
                None
            }
        }
    }

    async fn write_with_helper(&self, pin: u32, level: u8) -> Result<(), HostError> {
        let pin = pin.to_string();
        let level = level.to_string();
        self.host.run_checked("gpio", &["mode", &pin, "out"]).await?;
        self.host.run_checked("gpio", &["write", &pin, &level]).await?;
        Ok(())
    }

    async fn write_with_sysfs(&self, pin: u32, level: u8) -> Result<(), HostError> {
        self.host
            .write_file(&self.attribute(pin, "direction"), "out")
            .await?;
        self.host
            .write_file(&self.attribute(pin, "value"), &level.to_string())
            .await
    }

    /// Reads the current state of `pin` as the text the control path
    /// reported (normally `"0"` or `"1"`).  `None` when both paths failed.
    pub async fn read_state(&self, pin: u32) -> Option<String> {
        let pin_arg = pin.to_string();
        match self.host.run_checked("gpio", &["read", &pin_arg]).await {
            Ok(output) if !output.stdout.trim().is_empty() => {
                return Some(output.stdout.trim().to_string())
            }
            Ok(_) => warn!("gpio helper returned no state for pin {pin}; trying sysfs"),
            Err(e) => warn!("gpio helper could not read pin {pin}: {e}; trying sysfs"),
        }
        match self.host.read_file(&self.attribute(pin, "value")).await {
            Ok(contents) if !contents.trim().is_empty() => Some(contents.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!("sysfs could not read pin {pin}: {e}");
                None
            }
        }
    }
}

/// The four pin commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioAction {
    On,
    Off,
    Toggle,
    Read,
}

/// Handler for `gpio_on`, `gpio_off`, `gpio_toggle` and `gpio_read`.
pub struct GpioCommand {
    gpio: Arc<Gpio>,
    action: GpioAction,
}

impl GpioCommand {
    pub fn new(gpio: Arc<Gpio>, action: GpioAction) -> Self {
        Self { gpio, action }
    }

    async fn set(&self, pin: u32, level: u8) -> String {
        let word = if level == 1 { "on" } else { "off" };
        match self.gpio.write_level(pin, level).await {
            Some(ControlPath::Helper) => format!("GPIO {pin} {word}"),
            Some(ControlPath::Sysfs) => format!("GPIO {pin} {word} (sysfs)"),
            None => format!("Error controlling GPIO {pin}"),
        }
    }

    async fn toggle(&self, pin: u32) -> String {
        let current = match self.gpio.read_state(pin).await.as_deref() {
            Some("0") => 0,
            Some("1") => 1,
            other => {
                debug!("pin {pin} state {other:?} cannot be toggled");
                return format!("Error toggling GPIO {pin}");
            }
        };
        let next = 1 - current;
        match self.gpio.write_level(pin, next).await {
            Some(_) => format!("GPIO {pin} set to {next}"),
            None => format!("Error toggling GPIO {pin}"),
        }
    }

    async fn read(&self, pin: u32) -> String {
        match self.gpio.read_state(pin).await {
            Some(state) => format!("GPIO {pin} state: {state}"),
            None => format!("Error reading GPIO {pin}"),
        }
    }
}

#[async_trait]
impl CommandHandler for GpioCommand {
    async fn handle(&self, params: &[Value]) -> Result<String, HandlerError> {
        let pin = match self.gpio.pin_from(params) {
            Ok(pin) => pin,
            Err(e) => return Ok(e.to_string()),
        };
        let text = match self.action {
            GpioAction::On => self.set(pin, 1).await,
            GpioAction::Off => self.set(pin, 0).await,
            GpioAction::Toggle => self.toggle(pin).await,
            GpioAction::Read => self.read(pin).await,
        };
        Ok(text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
