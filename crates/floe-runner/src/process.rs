//! Running a CLI to completion under an optional timeout.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::RunnerError;
use crate::runner::RunOutput;

/// Spawn `program args...`, wait for it, and capture stdout.
///
/// The child is killed if `timeout` elapses first. Stderr is logged, not
/// returned.
pub(crate) async fn run_command(
  program: &str,
  args: &[String],
  resource: &str,
  timeout: Option<Duration>,
) -> Result<RunOutput, RunnerError> {
  debug!(program, args = ?redact(args), "spawning runner process");

  let child = Command::new(program)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|source| RunnerError::Spawn {
      program: program.to_string(),
      source,
    })?;

  let output = match timeout {
    Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
      .await
      .map_err(|_| RunnerError::Timeout {
        resource: resource.to_string(),
        timeout: limit,
      })??,
    None => child.wait_with_output().await?,
  };

  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stderr.trim().is_empty() {
    if output.status.success() {
      debug!(program, stderr = %stderr.trim_end(), "runner stderr");
    } else {
      warn!(program, stderr = %stderr.trim_end(), "runner stderr");
    }
  }

  Ok(RunOutput {
    // Killed by a signal: no exit code.
    exit_status: output.status.code().unwrap_or(-1),
    output: String::from_utf8_lossy(&output.stdout).into_owned(),
  })
}

const CREDENTIALS_ENV: &str = "_CREDENTIALS=";

/// `args` with the value of any `_CREDENTIALS=` assignment hidden.
pub(crate) fn redact(args: &[String]) -> Vec<String> {
  args
    .iter()
    .map(|arg| match arg.find(CREDENTIALS_ENV) {
      Some(at) => format!("{}<redacted>", &arg[..at + CREDENTIALS_ENV.len()]),
      None => arg.clone(),
    })
    .collect()
}
