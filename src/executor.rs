use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::config::CommandSpec;

#[cfg(unix)]
const SHELL: (&str, &str) = ("sh", "-c");
#[cfg(windows)]
const SHELL: (&str, &str) = ("cmd", "/C");

/// A command that did not exit successfully. Command-not-found, crashes and
/// reported findings all end up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{command}` {reason}")]
pub struct CommandFailed {
    pub command: String,
    pub reason: String,
}

/// Captured outcome of one run. `error` is `None` exactly when the command
/// exited successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub error: Option<CommandFailed>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs `spec.command` through the platform shell and waits for it to exit.
/// Never fails: spawn errors come back as a failed result with empty output.
#[instrument(skip_all, fields(command = %spec.name))]
pub async fn run(spec: &CommandSpec) -> ExecutionResult {
    debug_assert!(!spec.command.trim().is_empty(), "command must be non-empty");

    let start = Instant::now();
    let (shell, flag) = SHELL;

    let output = Command::new(shell)
        .arg(flag)
        .arg(&spec.command)
        .current_dir(&spec.dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match output {
        Ok(o) => o,
        Err(e) => {
            debug!(error = %e, "spawn failed");
            return ExecutionResult {
                error: Some(CommandFailed {
                    command: spec.command.clone(),
                    reason: format!("could not be started: {}", e),
                }),
                stdout: String::new(),
                stderr: String::new(),
            };
        }
    };

    debug!(
        status = %output.status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "command finished"
    );

    let error = (!output.status.success()).then(|| CommandFailed {
        command: spec.command.clone(),
        reason: describe_status(output.status),
    });

    ExecutionResult {
        error,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with code {}", code),
        None => "terminated by signal".to_string(),
    }
}
