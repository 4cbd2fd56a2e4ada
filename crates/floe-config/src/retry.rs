use serde::{Deserialize, Serialize};

/// A `Retry` entry on a Task, Map or Parallel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RetrierDef {
  /// Error names this retrier applies to. `States.ALL` matches any error.
  pub error_equals: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interval_seconds: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_attempts: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub backoff_rate: Option<f64>,
}

/// A `Catch` entry on a Task, Map or Parallel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatcherDef {
  pub error_equals: Vec<String>,
  /// State to transition to when this catcher matches.
  pub next: String,
  #[serde(
    default,
    deserialize_with = "crate::nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub result_path: Option<Option<String>>,
}
