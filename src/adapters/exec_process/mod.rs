//! Supervised child process adapter
//!
//! Runs the external transcoder as a tokio child process with captured
//! output and an optional timeout. The child is killed if the wait is
//! abandoned.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

/// tokio-backed process adapter
pub struct TokioProcessAdapter;

impl TokioProcessAdapter {
    /// Create new process adapter
    pub fn new() -> Result<Self, DomainError> {
        Ok(Self)
    }
}

#[async_trait]
impl ProcessPort for TokioProcessAdapter {
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutput, DomainError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        debug!(program = %spec.program.display(), args = ?spec.args, "Spawning process");
        let started = Instant::now();
        let child = command.spawn().map_err(|e| {
            DomainError::Process(format!(
                "Failed to launch {}: {}",
                spec.program.display(),
                e
            ))
        })?;

        let waited = match spec.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    DomainError::Process(format!(
                        "{} did not finish within {}s",
                        spec.program.display(),
                        limit.as_secs()
                    ))
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|e| {
            DomainError::Process(format!(
                "Failed waiting for {}: {}",
                spec.program.display(),
                e
            ))
        })?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: started.elapsed(),
        })
    }
}
