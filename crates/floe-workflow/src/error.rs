use floe_config::ConfigError;
use floe_path::PathError;
use thiserror::Error;

/// A workflow definition that cannot be executed.
#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("workflow has no states")]
  NoStates,

  #[error("StartAt references unknown state '{0}'")]
  UnknownStartAt(String),

  #[error("state '{state}' references unknown state '{target}'")]
  UnknownState { state: String, target: String },

  #[error("must set exactly one of Next or End")]
  InvalidTransition,

  #[error("invalid choice: {0}")]
  InvalidChoice(String),

  #[error(transparent)]
  Path(#[from] PathError),

  #[error("{0}")]
  InvalidDefinition(String),

  /// Wraps an error with the name of the state it was found in.
  #[error("invalid state '{state}': {source}")]
  InvalidState {
    state: String,
    #[source]
    source: Box<WorkflowError>,
  },
}

impl WorkflowError {
  pub(crate) fn in_state(state: &str, source: WorkflowError) -> Self {
    WorkflowError::InvalidState {
      state: state.to_string(),
      source: Box::new(source),
    }
  }
}

/// A data error raised while evaluating a choice rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
  #[error("variable '{variable}' not found in input")]
  VariableNotFound { variable: String },

  #[error("comparison path '{path}' matched nothing")]
  OperandNotFound { path: String },
}
