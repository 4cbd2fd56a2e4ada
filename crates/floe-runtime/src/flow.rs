//! Pass, Choice, Wait and Succeed states.

use std::time::Duration;

use chrono::{DateTime, Utc};
use floe_workflow::{ChoiceState, PassState, SucceedState, WaitDuration, WaitState};
use serde_json::Value;
use tracing::debug;

use crate::error::RuntimeError;
use crate::events::ExecutionNotifier;
use crate::execution::{Outcome, WorkflowExecution};
use crate::task::merge_result;

impl<'a, N: ExecutionNotifier> WorkflowExecution<'a, N> {
  pub(crate) fn run_pass(&self, state: &PassState, input: Value) -> Result<Outcome, RuntimeError> {
    let context = &self.context_tree;
    let effective = state.input_path.apply(context, &input);
    let effective = match &state.parameters {
      Some(template) => template.value(context, &effective),
      None => effective,
    };

    let output = match &state.result {
      Some(result) => merge_result(state.result_path.as_ref(), &effective, result.clone())
        .map_err(|source| RuntimeError::Path {
          state: state.name.clone(),
          source,
        })?,
      None => effective,
    };

    Ok(Outcome::new(
      state.transition.next(),
      state.output_path.apply(context, &output),
    ))
  }

  /// First matching choice wins, then `Default`.
  pub(crate) fn run_choice(
    &self,
    state: &ChoiceState,
    input: Value,
  ) -> Result<Outcome, RuntimeError> {
    let context = &self.context_tree;
    let effective = state.input_path.apply(context, &input);

    let mut next = None;
    for choice in &state.choices {
      let matched = choice
        .rule
        .is_true(context, &effective)
        .map_err(|source| RuntimeError::Evaluation {
          state: state.name.clone(),
          source,
        })?;
      if matched {
        next = Some(choice.next.as_str());
        break;
      }
    }

    let next = next
      .or(state.default.as_deref())
      .ok_or_else(|| RuntimeError::NoChoiceMatched {
        state: state.name.clone(),
      })?;

    Ok(Outcome::new(
      Some(next),
      state.output_path.apply(context, &effective),
    ))
  }

  pub(crate) async fn run_wait(
    &self,
    state: &WaitState,
    input: Value,
  ) -> Result<Outcome, RuntimeError> {
    let context = &self.context_tree;
    let effective = state.input_path.apply(context, &input);

    let delay = wait_duration(state, context, &effective)?;
    debug!(
      execution_id = %self.execution_id(),
      state = %state.name,
      delay_ms = delay.as_millis() as u64,
      "waiting"
    );
    tokio::time::sleep(delay).await;

    Ok(Outcome::new(
      state.transition.next(),
      state.output_path.apply(context, &effective),
    ))
  }

  pub(crate) fn run_succeed(
    &self,
    state: &SucceedState,
    input: Value,
  ) -> Result<Outcome, RuntimeError> {
    let context = &self.context_tree;
    let effective = state.input_path.apply(context, &input);
    Ok(Outcome::new(
      None,
      state.output_path.apply(context, &effective),
    ))
  }
}

fn wait_duration(
  state: &WaitState,
  context: &Value,
  input: &Value,
) -> Result<Duration, RuntimeError> {
  let invalid = |message: String| RuntimeError::InvalidWait {
    state: state.name.clone(),
    message,
  };

  match &state.duration {
    WaitDuration::Seconds(seconds) => Ok(Duration::from_secs(*seconds)),
    WaitDuration::SecondsPath(path) => {
      let value = path.value(context, input).unwrap_or(Value::Null);
      value.as_u64().map(Duration::from_secs).ok_or_else(|| {
        invalid(format!(
          "SecondsPath '{path}' must select a non-negative integer, got {value}"
        ))
      })
    }
    WaitDuration::Timestamp(timestamp) => Ok(until(timestamp.with_timezone(&Utc))),
    WaitDuration::TimestampPath(path) => {
      let value = path.value(context, input).unwrap_or(Value::Null);
      let timestamp = value
        .as_str()
        .and_then(|timestamp| DateTime::parse_from_rfc3339(timestamp).ok())
        .ok_or_else(|| {
          invalid(format!(
            "TimestampPath '{path}' must select an RFC3339 timestamp, got {value}"
          ))
        })?;
      Ok(until(timestamp.with_timezone(&Utc)))
    }
  }
}

/// Time left until `deadline`; zero once it has passed.
fn until(deadline: DateTime<Utc>) -> Duration {
  (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}
