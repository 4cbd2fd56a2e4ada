use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RunnerError;

/// Everything a runner needs to execute one task.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
  /// Resource URI, e.g. `docker://alpine:3.20`.
  pub resource: String,
  /// Environment handed to the task, one variable per input field.
  pub env: BTreeMap<String, String>,
  /// Resolved credentials; `Value::Null` when the task declares none.
  pub secrets: Value,
  /// Upper bound on the run, from the state's `TimeoutSeconds`.
  pub timeout: Option<Duration>,
  /// The state's `HeartbeatSeconds`, carried for runners that support it.
  pub heartbeat: Option<Duration>,
}

impl RunRequest {
  /// Build a request whose environment is taken from a JSON object.
  ///
  /// String fields are passed through; every other value is passed as its
  /// JSON encoding.
  pub fn new(resource: impl Into<String>, input: &Value) -> Result<Self, RunnerError> {
    let env = match input {
      Value::Object(fields) => fields
        .iter()
        .map(|(key, value)| {
          let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
          };
          (key.clone(), value)
        })
        .collect(),
      Value::Null => BTreeMap::new(),
      other => {
        return Err(RunnerError::InvalidInput(format!(
          "expected an object, got {other}"
        )));
      }
    };

    Ok(Self {
      resource: resource.into(),
      env,
      secrets: Value::Null,
      timeout: None,
      heartbeat: None,
    })
  }

  pub fn with_secrets(mut self, secrets: Value) -> Self {
    self.secrets = secrets;
    self
  }

  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_heartbeat(mut self, heartbeat: Option<Duration>) -> Self {
    self.heartbeat = heartbeat;
    self
  }

  /// The resource with its `scheme://` prefix removed.
  pub fn target(&self) -> &str {
    self
      .resource
      .split_once("://")
      .map_or(self.resource.as_str(), |(_, target)| target)
  }

  pub(crate) fn has_secrets(&self) -> bool {
    match &self.secrets {
      Value::Null => false,
      Value::Object(map) => !map.is_empty(),
      _ => true,
    }
  }
}

/// What a finished run reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
  pub exit_status: i32,
  /// Everything the task wrote to stdout.
  pub output: String,
}

impl RunOutput {
  pub fn success(&self) -> bool {
    self.exit_status == 0
  }
}

/// Executes a task resource.
///
/// Implementations own their transport (a container engine, a cluster, an
/// in-memory script in tests) and enforce `RunRequest::timeout` themselves.
/// A non-zero exit is reported through [`RunOutput`], not as an error.
#[async_trait]
pub trait Runner: Send + Sync {
  async fn run(&self, request: RunRequest) -> Result<RunOutput, RunnerError>;
}

/// Scheme of a resource URI (`docker` for `docker://alpine`).
pub fn scheme(resource: &str) -> Option<&str> {
  resource.split_once("://").map(|(scheme, _)| scheme)
}
