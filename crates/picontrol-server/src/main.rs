//! picontrol command server: entry point.
//!
//! # Usage
//!
//! ```text
//! picontrol-server [OPTIONS]
//!
//! Options:
//!   --config         <PATH>  TOML config file
//!   --ws-port        <PORT>  WebSocket listener port [default: 8765]
//!   --ws-bind        <IP>    WebSocket bind address [default: 0.0.0.0]
//!   --http-port      <PORT>  Static-file server port [default: 8080]
//!   --http-bind      <IP>    Static-file server bind address [default: 0.0.0.0]
//!   --static-root    <DIR>   Directory served over HTTP [default: webapp]
//!   --script-dir     <DIR>   Directory run_script may execute from
//!   --script-timeout <SECS>  Script wall-clock limit [default: 30]
//!   --no-http                Do not start the static-file server
//! ```
//!
//! Settings are layered: built-in defaults, then the config file, then CLI
//! flags and environment variables.
//!
//! | Variable                  | Flag             |
//! |---------------------------|------------------|
//! | `PICONTROL_CONFIG`        | `--config`       |
//! | `PICONTROL_WS_PORT`       | `--ws-port`      |
//! | `PICONTROL_WS_BIND`       | `--ws-bind`      |
//! | `PICONTROL_HTTP_PORT`     | `--http-port`    |
//! | `PICONTROL_HTTP_BIND`     | `--http-bind`    |
//! | `PICONTROL_STATIC_ROOT`   | `--static-root`  |
//! | `PICONTROL_SCRIPT_DIR`    | `--script-dir`   |
//! | `PICONTROL_SCRIPT_TIMEOUT`| `--script-timeout` |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use picontrol_server::application::{CommandExecutor, CommandRegistry, HostOps};
use picontrol_server::domain::config::DEFAULT_HTTP_PORT;
use picontrol_server::domain::ServerConfig;
use picontrol_server::infrastructure::config_file::load_config_file;
use picontrol_server::infrastructure::host::SystemHost;
use picontrol_server::infrastructure::static_server::run_static_server;
use picontrol_server::infrastructure::ws_server::{run_server, ServerState};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote-control command server for a single host.
///
/// Every flag is optional; an absent flag keeps the value from the config
/// file or the built-in default.
#[derive(Debug, Default, Parser)]
#[command(
    name = "picontrol-server",
    about = "WebSocket command server for GPIO, diagnostics and scripts",
    version
)]
struct Cli {
    /// TOML config file.
    #[arg(long, env = "PICONTROL_CONFIG")]
    config: Option<PathBuf>,

    /// TCP port for the WebSocket command channel.
    #[arg(long, env = "PICONTROL_WS_PORT")]
    ws_port: Option<u16>,

    /// IP address the WebSocket server binds to.
    ///
    /// `0.0.0.0` accepts connections on every interface; `127.0.0.1` only
    /// local ones.
    #[arg(long, env = "PICONTROL_WS_BIND")]
    ws_bind: Option<String>,

    /// TCP port for the static-file server.
    #[arg(long, env = "PICONTROL_HTTP_PORT")]
    http_port: Option<u16>,

    /// IP address the static-file server binds to.
    #[arg(long, env = "PICONTROL_HTTP_BIND")]
    http_bind: Option<String>,

    /// Directory served by the static-file server.
    #[arg(long, env = "PICONTROL_STATIC_ROOT")]
    static_root: Option<PathBuf>,

    /// The only directory `run_script` may execute files from.
    #[arg(long, env = "PICONTROL_SCRIPT_DIR")]
    script_dir: Option<PathBuf>,

    /// Wall-clock limit for one script run, in seconds.
    #[arg(long, env = "PICONTROL_SCRIPT_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    script_timeout: Option<u64>,

    /// Do not start the static-file server.
    #[arg(long)]
    no_http: bool,
}

fn parse_ip(flag: &str, value: &str) -> anyhow::Result<IpAddr> {
    value
        .parse()
        .with_context(|| format!("invalid {flag} address: '{value}'"))
}

impl Cli {
    /// Builds the effective [`ServerConfig`]: defaults, then the config
    /// file, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or a bind
    /// address is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::default();

        if let Some(path) = &self.config {
            load_config_file(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?
                .apply(&mut config);
        }

        let ws_ip = match &self.ws_bind {
            Some(bind) => parse_ip("--ws-bind", bind)?,
            None => config.ws_bind_addr.ip(),
        };
        let ws_port = self.ws_port.unwrap_or(config.ws_bind_addr.port());
        config.ws_bind_addr = SocketAddr::new(ws_ip, ws_port);

        if self.no_http {
            config.http_bind_addr = None;
        } else if self.http_bind.is_some() || self.http_port.is_some() {
            let base = config
                .http_bind_addr
                .unwrap_or(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_HTTP_PORT));
            let ip = match &self.http_bind {
                Some(bind) => parse_ip("--http-bind", bind)?,
                None => base.ip(),
            };
            config.http_bind_addr = Some(SocketAddr::new(ip, self.http_port.unwrap_or(base.port())));
        }

        if let Some(root) = self.static_root {
            config.static_root = root;
        }
        if let Some(dir) = self.script_dir {
            config.script_dir = dir;
        }
        if let Some(secs) = self.script_timeout {
            config.script_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

// ── Shutdown signals ──────────────────────────────────────────────────────────

/// Clears `running` on Ctrl+C and, on Unix, on SIGTERM.
fn spawn_shutdown_listeners(running: &Arc<AtomicBool>) {
    let on_ctrl_c = Arc::clone(running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                on_ctrl_c.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let on_term = Arc::clone(running);
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("received SIGTERM, shutting down");
                    on_term.store(false, Ordering::Relaxed);
                }
                Err(e) => error!("failed to listen for SIGTERM: {e}"),
            }
        });
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "picontrol server starting: ws={}, http={}, scripts={}",
        config.ws_bind_addr,
        config
            .http_bind_addr
            .map_or_else(|| "disabled".to_string(), |addr| addr.to_string()),
        config.script_dir.display()
    );

    tokio::fs::create_dir_all(&config.script_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create script directory {}",
                config.script_dir.display()
            )
        })?;

    let host: Arc<dyn HostOps> = Arc::new(SystemHost::new());
    let registry = Arc::new(CommandRegistry::standard(host, &config));
    info!("{} commands registered", registry.len());
    let state = ServerState::new(
        Arc::new(CommandExecutor::new(registry)),
        config.greeting.clone(),
    );

    let running = Arc::new(AtomicBool::new(true));
    spawn_shutdown_listeners(&running);

    if let Some(addr) = config.http_bind_addr {
        let root = config.static_root.clone();
        let running = Arc::clone(&running);
        tokio::spawn(async move {
            if let Err(e) = run_static_server(addr, root, running).await {
                error!("static file server stopped: {e:#}");
            }
        });
    }

    run_server(&config, state, running).await?;

    info!("picontrol server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // Built directly rather than parsed so PICONTROL_* variables in the
    // environment cannot leak into the result.
    fn config_from(cli: Cli) -> anyhow::Result<ServerConfig> {
        cli.into_server_config()
    }

    #[test]
    fn test_flags_parse_into_fields() {
        // Act: explicit flags win over any environment value
        let cli = Cli::try_parse_from([
            "picontrol-server",
            "--ws-port",
            "9999",
            "--script-timeout",
            "5",
            "--no-http",
        ])
        .unwrap();

        // Assert
        assert_eq!(cli.ws_port, Some(9999));
        assert_eq!(cli.script_timeout, Some(5));
        assert!(cli.no_http);
    }

    #[test]
    fn test_default_config_ports() {
        let config = config_from(Cli::default()).unwrap();
        assert_eq!(config.ws_bind_addr.port(), 8765);
        assert_eq!(config.http_bind_addr.map(|a| a.port()), Some(8080));
    }

    #[test]
    fn test_ws_port_override() {
        let config = config_from(Cli {
            ws_port: Some(9999),
            ..Cli::default()
        })
        .unwrap();
        assert_eq!(config.ws_bind_addr.to_string(), "0.0.0.0:9999");
    }

    #[test]
    fn test_ws_bind_override_keeps_port() {
        let config = config_from(Cli {
            ws_bind: Some("127.0.0.1".to_string()),
            ..Cli::default()
        })
        .unwrap();
        assert_eq!(config.ws_bind_addr.to_string(), "127.0.0.1:8765");
    }

    #[test]
    fn test_http_override() {
        let config = config_from(Cli {
            http_bind: Some("127.0.0.1".to_string()),
            http_port: Some(8000),
            ..Cli::default()
        })
        .unwrap();
        assert_eq!(config.http_bind_addr, Some("127.0.0.1:8000".parse().unwrap()));
    }

    #[test]
    fn test_no_http_disables_static_server() {
        let config = config_from(Cli {
            no_http: true,
            http_port: Some(8000),
            ..Cli::default()
        })
        .unwrap();
        assert_eq!(config.http_bind_addr, None);
    }

    #[test]
    fn test_script_settings_override() {
        let config = config_from(Cli {
            script_dir: Some(PathBuf::from("/tmp/s")),
            script_timeout: Some(5),
            ..Cli::default()
        })
        .unwrap();
        assert_eq!(config.script_dir, PathBuf::from("/tmp/s"));
        assert_eq!(config.script_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_script_timeout_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["picontrol-server", "--script-timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_ws_bind_returns_error() {
        // Act
        let result = config_from(Cli {
            ws_bind: Some("not.an.ip".to_string()),
            ..Cli::default()
        });

        // Assert: must return an error, not panic
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_take_precedence_over_config_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picontrol.toml");
        std::fs::write(
            &path,
            "greeting = \"hi\"\n[network]\nws_bind = \"127.0.0.1:7000\"\n[scripts]\ntimeout_secs = 9\n",
        )
        .unwrap();

        // Act
        let config = config_from(Cli {
            config: Some(path),
            ws_port: Some(7001),
            ..Cli::default()
        })
        .unwrap();

        // Assert
        assert_eq!(config.greeting, "hi");
        assert_eq!(config.ws_bind_addr.to_string(), "127.0.0.1:7001");
        assert_eq!(config.script_timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = config_from(Cli {
            config: Some(PathBuf::from("/nonexistent/picontrol.toml")),
            ..Cli::default()
        });
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config file"));
    }
}
