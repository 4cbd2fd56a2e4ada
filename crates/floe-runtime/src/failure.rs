//! Task failures: the values Retry and Catch match against.

use std::fmt;

use floe_path::PathError;
use floe_runner::{RunOutput, RunnerError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const TASK_FAILED: &str = "States.TaskFailed";
pub const TIMEOUT: &str = "States.Timeout";
pub const RUNTIME: &str = "States.Runtime";
pub const RESULT_PATH_MATCH_FAILURE: &str = "States.ResultPathMatchFailure";
pub const PARAMETER_PATH_FAILURE: &str = "States.ParameterPathFailure";
pub const BRANCH_FAILED: &str = "States.BranchFailed";

/// A named, recoverable failure of a Task, Map or Parallel state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskFailure {
  pub error: String,
  pub cause: String,
}

impl TaskFailure {
  pub fn new(error: impl Into<String>, cause: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      cause: cause.into(),
    }
  }

  /// Failure for a run that exited non-zero.
  ///
  /// A JSON object on stdout may name the failure with `Error` and `Cause`.
  /// Otherwise the failure is `States.TaskFailed` and the cause is the raw
  /// output, or the exit status when there was none.
  pub fn from_exit(output: &RunOutput) -> Self {
    let reported = serde_json::from_str::<Value>(output.output.trim()).ok();
    let field = |name: &str| {
      reported
        .as_ref()
        .and_then(|value| value.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
    };

    let error = field("Error").unwrap_or_else(|| TASK_FAILED.to_string());
    let cause = field("Cause").unwrap_or_else(|| {
      let raw = output.output.trim();
      if raw.is_empty() {
        format!("exit status {}", output.exit_status)
      } else {
        raw.to_string()
      }
    });

    Self { error, cause }
  }

  /// The `{"Error": ..., "Cause": ...}` object a catcher writes.
  pub fn to_value(&self) -> Value {
    json!({"Error": self.error, "Cause": self.cause})
  }
}

impl fmt::Display for TaskFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.error, self.cause)
  }
}

impl From<RunnerError> for TaskFailure {
  fn from(error: RunnerError) -> Self {
    let name = match &error {
      RunnerError::Timeout { .. } => TIMEOUT,
      RunnerError::UnsupportedScheme { .. }
      | RunnerError::InvalidResource { .. }
      | RunnerError::InvalidInput(_) => RUNTIME,
      _ => TASK_FAILED,
    };
    Self::new(name, error.to_string())
  }
}

impl From<PathError> for TaskFailure {
  fn from(error: PathError) -> Self {
    let name = match &error {
      PathError::ResultPathMatchFailure { .. } => RESULT_PATH_MATCH_FAILURE,
      _ => PARAMETER_PATH_FAILURE,
    };
    Self::new(name, error.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  fn exit(status: i32, output: &str) -> TaskFailure {
    TaskFailure::from_exit(&RunOutput {
      exit_status: status,
      output: output.to_string(),
    })
  }

  #[test]
  fn test_exit_with_reported_error() {
    let failure = exit(1, r#"{"Error": "Custom.NotFound", "Cause": "no such user"}"#);
    assert_eq!(failure, TaskFailure::new("Custom.NotFound", "no such user"));
    assert_eq!(failure.to_string(), "Custom.NotFound: no such user");
  }

  #[test]
  fn test_exit_with_raw_output() {
    assert_eq!(exit(2, "boom\n"), TaskFailure::new(TASK_FAILED, "boom"));
    assert_eq!(exit(2, ""), TaskFailure::new(TASK_FAILED, "exit status 2"));
    assert_eq!(
      exit(1, r#"{"Error": "E"}"#),
      TaskFailure::new("E", r#"{"Error": "E"}"#)
    );
  }

  #[test]
  fn test_runner_error_names() {
    let timeout = TaskFailure::from(RunnerError::Timeout {
      resource: "docker://alpine".to_string(),
      timeout: Duration::from_secs(3),
    });
    assert_eq!(timeout.error, TIMEOUT);

    let unsupported = TaskFailure::from(RunnerError::UnsupportedScheme {
      resource: "ftp://x".to_string(),
    });
    assert_eq!(unsupported.error, RUNTIME);
  }

  #[test]
  fn test_error_object() {
    assert_eq!(
      TaskFailure::new("E", "C").to_value(),
      json!({"Error": "E", "Cause": "C"})
    );
  }
}
