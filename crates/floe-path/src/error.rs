use thiserror::Error;

/// Errors raised while parsing or applying paths and templates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
  /// The expression is not a valid path.
  #[error("invalid path '{expression}': {message}")]
  InvalidPath { expression: String, message: String },

  /// The expression is a valid path but cannot be used as a write target.
  #[error("invalid reference path '{expression}': {message}")]
  InvalidReferencePath { expression: String, message: String },

  /// A payload template entry is malformed.
  #[error("invalid payload template: {message}")]
  InvalidTemplate { message: String },

  /// Writing through a reference path hit a value of the wrong shape.
  #[error("unable to apply reference path '{expression}': {message}")]
  ResultPathMatchFailure { expression: String, message: String },
}

impl PathError {
  pub(crate) fn invalid_path(expression: &str, message: impl Into<String>) -> Self {
    Self::InvalidPath {
      expression: expression.to_string(),
      message: message.into(),
    }
  }

  pub(crate) fn invalid_reference(expression: &str, message: impl Into<String>) -> Self {
    Self::InvalidReferencePath {
      expression: expression.to_string(),
      message: message.into(),
    }
  }
}
