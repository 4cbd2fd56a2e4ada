use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while resolving or invoking a runner.
#[derive(Debug, Error)]
pub enum RunnerError {
  /// No runner is registered for the resource's scheme.
  #[error("no runner registered for resource '{resource}'")]
  UnsupportedScheme { resource: String },

  /// The resource URI is malformed for the runner that received it.
  #[error("invalid resource '{resource}': {message}")]
  InvalidResource { resource: String, message: String },

  /// The task input cannot be turned into an environment.
  #[error("invalid task input: {0}")]
  InvalidInput(String),

  /// The runner process could not be started.
  #[error("failed to start '{program}'")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The run exceeded its `TimeoutSeconds`.
  #[error("resource '{resource}' timed out after {}s", timeout.as_secs_f64())]
  Timeout { resource: String, timeout: Duration },

  #[error("failed to read runner config '{path}'")]
  Config {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse runner config '{path}'")]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
