use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  /// Created, no state has run yet.
  #[default]
  Pending,
  Running,
  /// Ended in a Succeed state or a state with `End: true`.
  Success,
  /// Ended in a Fail state or aborted by an unhandled error.
  Errored,
}

impl Status {
  pub fn is_terminal(self) -> bool {
    matches!(self, Status::Success | Status::Errored)
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Status::Pending => "pending",
      Status::Running => "running",
      Status::Success => "success",
      Status::Errored => "errored",
    };
    f.write_str(name)
  }
}

/// `Error` and `Cause` of the Fail state a run ended in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionFailure {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cause: Option<String>,
}

impl fmt::Display for ExecutionFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.error, &self.cause) {
      (Some(error), Some(cause)) => write!(f, "{error}: {cause}"),
      (Some(error), None) => f.write_str(error),
      (None, Some(cause)) => f.write_str(cause),
      (None, None) => f.write_str("workflow failed"),
    }
  }
}
