use std::path::PathBuf;

/// Errors raised while loading a workflow definition document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The definition file could not be read.
  #[error("failed to read workflow definition '{path}'")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The document is not valid JSON or does not match the definition schema.
  #[error("invalid workflow definition: {0}")]
  Parse(#[from] serde_json::Error),
}
