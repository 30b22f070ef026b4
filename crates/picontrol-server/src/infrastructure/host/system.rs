//! Production [`HostOps`] backed by `tokio::process` and `tokio::fs`.
//!
//! All calls are async so a slow subprocess suspends only the session task
//! that issued it.  Processes get a null stdin and piped stdout/stderr.
//! Timed runs use `kill_on_drop` so an expired script is killed when its
//! wait future is dropped.

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::application::host::{HostError, HostOps, ProcessOutput};

/// Runs real programs and touches the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl SystemHost {
    /// Creates the production host.
    pub fn new() -> Self {
        Self
    }
}

fn command(program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn spawn_error(program: &str, source: std::io::Error) -> HostError {
    HostError::Spawn {
        program: program.to_string(),
        source,
    }
}

fn into_process_output(output: Output) -> ProcessOutput {
    ProcessOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

#[async_trait]
impl HostOps for SystemHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput, HostError> {
        debug!("running {program} {args:?}");
        let output = command(program, args)
            .output()
            .await
            .map_err(|e| spawn_error(program, e))?;
        Ok(into_process_output(output))
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        limit: Duration,
    ) -> Result<ProcessOutput, HostError> {
        debug!("running {program} {args:?} with a {limit:?} limit");
        let child = command(program, args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(into_process_output(output)),
            Ok(Err(e)) => Err(spawn_error(program, e)),
            Err(_) => {
                // Dropping the wait future dropped the child, which kills it.
                warn!("{program} exceeded its {limit:?} limit and was killed");
                Err(HostError::TimedOut {
                    program: program.to_string(),
                    limit,
                })
            }
        }
    }

    async fn read_file(&self, path: &Path) -> Result<String, HostError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| HostError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError> {
        // sysfs attributes must be opened for writing without truncation or
        // creation; `OpenOptions` with only `write` mirrors that.
        use tokio::io::AsyncWriteExt;

        let io_error = |source| HostError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(io_error)?;
        file.write_all(contents.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
