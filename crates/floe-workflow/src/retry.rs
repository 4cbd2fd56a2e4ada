use std::time::Duration;

use floe_config::{CatcherDef, RetrierDef};
use floe_path::ReferencePath;

use crate::error::WorkflowError;

/// Error name that matches every failure.
pub const ALL_ERRORS: &str = "States.ALL";

const DEFAULT_INTERVAL_SECONDS: f64 = 1.0;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_RATE: f64 = 2.0;

/// Returns true when `patterns` selects a failure. A pattern matches the
/// error name, the rendered `"<name>: <cause>"` string, or everything when it
/// is [`ALL_ERRORS`].
fn matches(patterns: &[String], error: &str, rendered: &str) -> bool {
  patterns
    .iter()
    .any(|pattern| pattern == ALL_ERRORS || pattern == error || pattern == rendered)
}

/// Retry policy for a Task, Map or Parallel state.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrier {
  pub error_equals: Vec<String>,
  pub interval_seconds: f64,
  pub max_attempts: u32,
  pub backoff_rate: f64,
}

impl Retrier {
  pub fn new(def: &RetrierDef) -> Result<Self, WorkflowError> {
    if def.error_equals.is_empty() {
      return Err(WorkflowError::InvalidDefinition(
        "Retry ErrorEquals must not be empty".into(),
      ));
    }

    let retrier = Self {
      error_equals: def.error_equals.clone(),
      interval_seconds: def.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS),
      max_attempts: def.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
      backoff_rate: def.backoff_rate.unwrap_or(DEFAULT_BACKOFF_RATE),
    };
    if retrier.interval_seconds < 0.0 || retrier.backoff_rate < 0.0 {
      return Err(WorkflowError::InvalidDefinition(
        "Retry IntervalSeconds and BackoffRate must not be negative".into(),
      ));
    }

    Ok(retrier)
  }

  pub fn matches(&self, error: &str, rendered: &str) -> bool {
    matches(&self.error_equals, error, rendered)
  }

  /// Delay before retry number `retry_count` (1-based): the interval scaled
  /// linearly by `backoff_rate * retry_count`.
  pub fn sleep_duration(&self, retry_count: u32) -> Duration {
    let seconds = self.interval_seconds * self.backoff_rate * f64::from(retry_count);
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
  }
}

/// Fallback transition for a Task, Map or Parallel state.
#[derive(Debug, Clone, PartialEq)]
pub struct Catcher {
  pub error_equals: Vec<String>,
  pub next: String,
  /// Where the error object is written into the state input. `None`
  /// discards it.
  pub result_path: Option<ReferencePath>,
}

impl Catcher {
  pub fn new(def: &CatcherDef) -> Result<Self, WorkflowError> {
    if def.error_equals.is_empty() {
      return Err(WorkflowError::InvalidDefinition(
        "Catch ErrorEquals must not be empty".into(),
      ));
    }

    let result_path = match &def.result_path {
      None => Some(ReferencePath::new("$")?),
      Some(None) => None,
      Some(Some(path)) => Some(ReferencePath::new(path)?),
    };

    Ok(Self {
      error_equals: def.error_equals.clone(),
      next: def.next.clone(),
      result_path,
    })
  }

  pub fn matches(&self, error: &str, rendered: &str) -> bool {
    matches(&self.error_equals, error, rendered)
  }
}
