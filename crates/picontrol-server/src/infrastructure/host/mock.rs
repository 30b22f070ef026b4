//! Mock [`HostOps`] for unit and integration testing.
//!
//! # Why a mock host?
//!
//! The real handlers shell out to `gpio`, `vcgencmd`, `ps` and `sudo`, and
//! write to `/sys/class/gpio`.  None of that exists on a CI machine, and
//! `sudo reboot` is not something a test should ever run.
//!
//! `MockHost` replaces every OS call with in-memory behaviour:
//!
//! - Programs are keyed by their full command line (`"gpio read 18"`).  A
//!   command line with no registered response behaves like a program that is
//!   not installed (spawn failure).
//! - Files live in an in-memory map.  Writes only succeed for files that
//!   already exist, matching sysfs attributes that are present only for
//!   exported pins.
//! - Every command line that was run is recorded in order.
//!
//! ```ignore
//! let host = Arc::new(
//!     MockHost::new()
//!         .with_program("gpio read 18", ProcessOutput::ok("1\n"))
//!         .with_file("/sys/class/gpio/gpio18/value", "1"),
//! );
//! // ... run a handler ...
//! assert_eq!(host.calls(), vec!["gpio read 18"]);
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::host::{HostError, HostOps, ProcessOutput};

/// Scripted behaviour for one command line.
#[derive(Debug, Clone)]
enum MockResponse {
    Output(ProcessOutput),
    TimedOut,
}

/// A host that records calls and returns scripted results.
#[derive(Debug, Default)]
pub struct MockHost {
    programs: Mutex<HashMap<String, MockResponse>>,
    files: Mutex<HashMap<PathBuf, String>>,
    calls: Mutex<Vec<String>>,
    run_delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

impl MockHost {
    /// Creates a host with no programs and no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the output returned for `command_line` (program and args
    /// joined by single spaces).
    pub fn with_program(self, command_line: &str, output: ProcessOutput) -> Self {
        self.set_program(command_line, output);
        self
    }

    /// Makes `command_line` behave like a process that outlives its limit.
    pub fn with_timeout(self, command_line: &str) -> Self {
        lock(&self.programs).insert(command_line.to_string(), MockResponse::TimedOut);
        self
    }

    /// Creates an in-memory file.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        lock(&self.files).insert(path.into(), contents.to_string());
        self
    }

    /// Delays every program run by `delay`, to simulate slow commands.
    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = delay;
        self
    }

    /// Registers or replaces the output for `command_line` after construction.
    pub fn set_program(&self, command_line: &str, output: ProcessOutput) {
        lock(&self.programs).insert(command_line.to_string(), MockResponse::Output(output));
    }

    /// Every command line run so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Current contents of an in-memory file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        lock(&self.files).get(path.as_ref()).cloned()
    }

    async fn respond(&self, program: &str, args: &[&str], limit: Option<Duration>) -> Result<ProcessOutput, HostError> {
        let line = command_line(program, args);
        lock(&self.calls).push(line.clone());

        if !self.run_delay.is_zero() {
            tokio::time::sleep(self.run_delay).await;
        }

        let response = lock(&self.programs).get(&line).cloned();
        match response {
            Some(MockResponse::Output(output)) => Ok(output),
            Some(MockResponse::TimedOut) => Err(HostError::TimedOut {
                program: program.to_string(),
                limit: limit.unwrap_or_default(),
            }),
            None => Err(HostError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock: program not registered"),
            }),
        }
    }
}

#[async_trait]
impl HostOps for MockHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<ProcessOutput, HostError> {
        self.respond(program, args, None).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        limit: Duration,
    ) -> Result<ProcessOutput, HostError> {
        self.respond(program, args, Some(limit)).await
    }

    async fn read_file(&self, path: &Path) -> Result<String, HostError> {
        lock(&self.files).get(path).cloned().ok_or_else(|| HostError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "mock: no such file"),
        })
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<(), HostError> {
        match lock(&self.files).get_mut(path) {
            Some(existing) => {
                *existing = contents.to_string();
                Ok(())
            }
            None => Err(HostError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock: no such file"),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
