//! Runner backed by a real helm process

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{CommandRunner, display_command};
use crate::error::{HelmError, Result};

/// Spawns the helm binary for every invocation
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: PathBuf,
}

impl ProcessRunner {
    /// Use a specific helm binary
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new("helm")
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String], cancel: &CancellationToken) -> Result<String> {
        let binary = self.binary.display().to_string();
        let command = display_command(&binary, args);
        debug!(command = %command, "running helm");

        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HelmError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            () = cancel.cancelled() => {
                warn!(command = %command, "helm invocation cancelled");
                return Err(HelmError::Cancelled { command });
            }
            result = child.wait_with_output() => result?,
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(HelmError::CommandFailed {
                command,
                status: output.status.to_string(),
                output: combined,
            });
        }

        Ok(combined)
    }
}
