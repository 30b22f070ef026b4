//! Optional TOML configuration file.
//!
//! Every key is optional; an absent key keeps the value already in
//! [`ServerConfig`].  Example:
//!
//! ```toml
//! greeting = "Connected to greenhouse-pi"
//!
//! [network]
//! ws_bind = "0.0.0.0:8765"
//! http_bind = "0.0.0.0:8080"
//! http_enabled = true
//!
//! [web]
//! static_root = "/opt/picontrol/webapp"
//!
//! [scripts]
//! dir = "/home/pi/scripts"
//! interpreter = "python3"
//! timeout_secs = 30
//!
//! [gpio]
//! sysfs_root = "/sys/class/gpio"
//! default_pin = 18
//! ```
//!
//! Unknown keys are rejected so that a typo does not silently fall back to a
//! default.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::ServerConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// On-disk configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub greeting: Option<String>,
    pub network: NetworkSection,
    pub web: WebSection,
    pub scripts: ScriptsSection,
    pub gpio: GpioSection,
}

/// Listener addresses.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSection {
    pub ws_bind: Option<SocketAddr>,
    pub http_bind: Option<SocketAddr>,
    /// `false` disables the static-file server.
    pub http_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WebSection {
    pub static_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptsSection {
    pub dir: Option<PathBuf>,
    pub interpreter: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GpioSection {
    pub sysfs_root: Option<PathBuf>,
    pub default_pin: Option<u32>,
}

impl FileConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for values outside their range.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        if config.scripts.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "scripts.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if matches!(&config.scripts.interpreter, Some(i) if i.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "scripts.interpreter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    /// Overlays every present key onto `config`.
    pub fn apply(self, config: &mut ServerConfig) {
        if let Some(greeting) = self.greeting {
            config.greeting = greeting;
        }
        if let Some(addr) = self.network.ws_bind {
            config.ws_bind_addr = addr;
        }
        if let Some(addr) = self.network.http_bind {
            config.http_bind_addr = Some(addr);
        }
        if self.network.http_enabled == Some(false) {
            config.http_bind_addr = None;
        }
        if let Some(root) = self.web.static_root {
            config.static_root = root;
        }
        if let Some(dir) = self.scripts.dir {
            config.script_dir = dir;
        }
        if let Some(interpreter) = self.scripts.interpreter {
            config.script_interpreter = interpreter;
        }
        if let Some(secs) = self.scripts.timeout_secs {
            config.script_timeout = Duration::from_secs(secs);
        }
        if let Some(root) = self.gpio.sysfs_root {
            config.gpio_sysfs_root = root;
        }
        if let Some(pin) = self.gpio.default_pin {
            config.default_pin = pin;
        }
    }
}

/// Reads and parses the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise any
/// error from [`FileConfig::parse`].
pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::parse(&text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
