//! The host-operations seam: the only way command handlers reach the OS.
//!
//! Handlers never spawn processes or touch files directly (script path
//! resolution aside); they go through a [`HostOps`] trait object.  The
//! production implementation lives in `infrastructure::host::system` and a
//! recording mock in `infrastructure::host::mock`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Captured result of a finished external process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `true` when the process exited with status 0.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful run that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A run that exited with `code` and printed `stderr`.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// OS-level failures raised by a [`HostOps`] implementation.
#[derive(Debug, Error)]
pub enum HostError {
    /// The program could not be started (not installed, not executable).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("{program} exited with {}: {}", describe_code(.code), .stderr.trim())]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The program exceeded its wall-clock limit and was killed.
    #[error("{program} timed out after {}", describe_limit(.limit))]
    TimedOut { program: String, limit: Duration },

    /// A file read or write failed.
    #[error("I/O error accessing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn describe_limit(limit: &Duration) -> String {
    format_duration(*limit)
}

/// Renders a timeout the way users see it: whole seconds when exact,
/// milliseconds otherwise.
pub fn format_duration(limit: Duration) -> String {
    if limit.subsec_millis() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}

/// Side-effecting OS primitives used by command handlers.
///
/// Arguments are always passed as discrete argv entries; no implementation
/// may route them through a shell.
#[async_trait]
pub trait HostOps: Send + Sync {
    /// Runs `program` to completion and captures its output.  A non-zero
    /// exit is *not* an error here; see [`HostOps::run_checked`].
    async fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput, HostError>;

    /// Like [`HostOps::run`], but kills the process and returns
    /// [`HostError::TimedOut`] once `limit` elapses.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        limit: Duration,
    ) -> Result<ProcessOutput, HostError>;

    /// Reads a whole file as text.
    async fn read_file(&self, path: &Path) -> Result<String, HostError>;

    /// Writes `contents` to an existing file (sysfs-style attribute write).
    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError>;

    /// Runs `program` and turns a non-zero exit into [`HostError::Failed`].
    async fn run_checked(&self, program: &str, args: &[&str]) -> Result<ProcessOutput, HostError> {
        let output = self.run(program, args).await?;
        if output.success {
            Ok(output)
        } else {
            Err(HostError::Failed {
                program: program.to_string(),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
