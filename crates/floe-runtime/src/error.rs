//! Runtime errors.

use floe_path::PathError;
use floe_workflow::EvaluationError;

use crate::failure::TaskFailure;

/// Errors that abort a workflow run.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// A transition named a state the graph does not contain.
  #[error("state '{state}' not found in workflow")]
  StateNotFound { state: String },

  /// No choice rule held and the Choice state has no `Default`.
  #[error("no choice matched in state '{state}' and no Default is set")]
  NoChoiceMatched { state: String },

  /// A choice rule referenced data that is not there.
  #[error("failed to evaluate choice in state '{state}'")]
  Evaluation {
    state: String,
    #[source]
    source: EvaluationError,
  },

  /// A path could not be applied outside of a recoverable state.
  #[error("failed to apply path in state '{state}'")]
  Path {
    state: String,
    #[source]
    source: PathError,
  },

  /// A Wait state's duration could not be resolved.
  #[error("invalid wait in state '{state}': {message}")]
  InvalidWait { state: String, message: String },

  /// A task failure that no Retry or Catch handled.
  #[error("state '{state}' failed: {failure}")]
  TaskFailed { state: String, failure: TaskFailure },

  /// The definition's `TimeoutSeconds` elapsed.
  #[error("workflow timed out after {seconds}s")]
  Timeout { seconds: u64 },

  /// The execution context could not be serialized for path evaluation.
  #[error("failed to serialize execution context")]
  Context(#[from] serde_json::Error),
}
