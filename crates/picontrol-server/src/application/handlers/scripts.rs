//! `run_script`: execute a file from the trusted script directory.
//!
//! The script name is resolved strictly inside one configured directory.
//! Names with `..`, absolute paths, and symlinks pointing outside the
//! directory are refused before anything is executed.  Runs are bounded by a
//! hard wall-clock limit; a timeout is reported with its own message.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use picontrol_core::{first_param, param_text};
use serde_json::Value;
use tracing::{info, warn};

use crate::application::host::{format_duration, HostError, HostOps};
use crate::application::registry::{CommandHandler, HandlerError};

/// Why a script name did not resolve to a runnable file.  Each variant is
/// reported to the client as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRejection {
    OutsideDirectory,
    NotFound,
    NotAFile,
}

impl ScriptRejection {
    fn message(&self, name: &str) -> String {
        match self {
            Self::OutsideDirectory => format!("Script {name} is outside the script directory"),
            Self::NotFound => format!("Script {name} not found"),
            Self::NotAFile => format!("{name} is not a file"),
        }
    }
}

/// Handler for `run_script`.
pub struct RunScript {
    host: Arc<dyn HostOps>,
    script_dir: PathBuf,
    interpreter: String,
    limit: Duration,
}

impl RunScript {
    pub fn new(host: Arc<dyn HostOps>, script_dir: PathBuf, interpreter: String, limit: Duration) -> Self {
        Self {
            host,
            script_dir,
            interpreter,
            limit,
        }
    }

    /// Resolves `name` to a regular file inside the script directory.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, ScriptRejection> {
        let relative = Path::new(name);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ScriptRejection::OutsideDirectory);
        }

        let root = tokio::fs::canonicalize(&self.script_dir)
            .await
            .map_err(|_| ScriptRejection::NotFound)?;
        let candidate = tokio::fs::canonicalize(root.join(relative))
            .await
            .map_err(|_| ScriptRejection::NotFound)?;

        // A symlink inside the directory may still point elsewhere.
        if !candidate.starts_with(&root) {
            return Err(ScriptRejection::OutsideDirectory);
        }

        let metadata = tokio::fs::metadata(&candidate)
            .await
            .map_err(|_| ScriptRejection::NotFound)?;
        if !metadata.is_file() {
            return Err(ScriptRejection::NotAFile);
        }
        Ok(candidate)
    }
}

/// Formats captured script output: stdout, then any stderr.
fn format_output(stdout: &str, stderr: &str) -> String {
    let mut text = stdout.to_string();
    if !stderr.is_empty() {
        text.push_str("\nErrors: ");
        text.push_str(stderr);
    }
    if text.is_empty() {
        "Script executed with no output".to_string()
    } else {
        text
    }
}

#[async_trait]
impl CommandHandler for RunScript {
    async fn handle(&self, params: &[Value]) -> Result<String, HandlerError> {
        let name = match first_param(params) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
            Some(value) => param_text(value),
        };
        if name.is_empty() {
            return Ok("Script name required".to_string());
        }

        let path = match self.resolve(&name).await {
            Ok(path) => path,
            Err(rejection) => {
                warn!("refusing script {name:?}: {rejection:?}");
                return Ok(rejection.message(&name));
            }
        };

        info!("running script {}", path.display());
        let path_arg = path.to_string_lossy();
        let result = self
            .host
            .run_with_timeout(&self.interpreter, &[path_arg.as_ref()], self.limit)
            .await;

        Ok(match result {
            Ok(output) => format_output(&output.stdout, &output.stderr),
            Err(HostError::TimedOut { limit, .. }) => {
                format!("Script timeout ({})", format_duration(limit))
            }
            Err(e) => format!("Error running script: {e}"),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
