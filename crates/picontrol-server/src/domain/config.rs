//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It starts from [`ServerConfig::default`], is optionally overlaid with a
//! TOML file (see `infrastructure::config_file`) and finally with CLI flags
//! in `main.rs`.  Nothing in here reads the environment or the filesystem.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Default WebSocket command-channel port.
pub const DEFAULT_WS_PORT: u16 = 8765;
/// Default static-file HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;
/// Pin used by the GPIO commands when the client sends no argument.
pub const DEFAULT_GPIO_PIN: u32 = 18;
/// Hard wall-clock limit for `run_script`.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// All runtime configuration for the server.
///
/// Build it once at startup, then share it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use picontrol_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 8765);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the WebSocket command channel binds to.
    pub ws_bind_addr: SocketAddr,

    /// Address the static-file server binds to; `None` disables it.
    pub http_bind_addr: Option<SocketAddr>,

    /// Directory the static-file server serves (the browser UI).
    pub static_root: PathBuf,

    /// The only directory `run_script` may execute files from.
    pub script_dir: PathBuf,

    /// Program used to run scripts (`<interpreter> <script path>`).
    pub script_interpreter: String,

    /// Wall-clock limit for a single script run.
    pub script_timeout: Duration,

    /// Root of the sysfs GPIO tree used by the fallback control path.
    pub gpio_sysfs_root: PathBuf,

    /// Pin used when a GPIO command carries no argument.
    pub default_pin: u32,

    /// Text of the greeting sent when a session opens.
    pub greeting: String,
}

impl Default for ServerConfig {
    /// Returns the settings of a stock Raspberry Pi deployment.
    ///
    /// | Field              | Default               |
    /// |--------------------|-----------------------|
    /// | ws_bind_addr       | `0.0.0.0:8765`        |
    /// | http_bind_addr     | `0.0.0.0:8080`        |
    /// | static_root        | `webapp`              |
    /// | script_dir         | `/home/pi/scripts`    |
    /// | script_interpreter | `python3`             |
    /// | script_timeout     | 30 seconds            |
    /// | gpio_sysfs_root    | `/sys/class/gpio`     |
    /// | default_pin        | 18                    |
    fn default() -> Self {
        let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        Self {
            ws_bind_addr: SocketAddr::new(any, DEFAULT_WS_PORT),
            http_bind_addr: Some(SocketAddr::new(any, DEFAULT_HTTP_PORT)),
            static_root: PathBuf::from("webapp"),
            script_dir: PathBuf::from("/home/pi/scripts"),
            script_interpreter: "python3".to_string(),
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
            gpio_sysfs_root: PathBuf::from("/sys/class/gpio"),
            default_pin: DEFAULT_GPIO_PIN,
            greeting: "Connected to host".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
