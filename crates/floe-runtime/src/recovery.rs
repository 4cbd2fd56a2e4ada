//! The Retry/Catch protocol shared by Task, Map and Parallel states.

use floe_workflow::{Catcher, MapState, ParallelState, Retrier, TaskState, Transition};
use serde_json::Value;
use tracing::warn;

use crate::error::RuntimeError;
use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::execution::{Outcome, WorkflowExecution};
use crate::failure::TaskFailure;
use crate::task::merge_result;

/// A state whose failures are values that Retry and Catch can handle.
#[derive(Clone, Copy)]
pub(crate) enum Recoverable<'a> {
  Task(&'a TaskState),
  Map(&'a MapState),
  Parallel(&'a ParallelState),
}

impl<'a> Recoverable<'a> {
  fn name(self) -> &'a str {
    match self {
      Recoverable::Task(state) => &state.name,
      Recoverable::Map(state) => &state.name,
      Recoverable::Parallel(state) => &state.name,
    }
  }

  fn transition(self) -> &'a Transition {
    match self {
      Recoverable::Task(state) => &state.transition,
      Recoverable::Map(state) => &state.transition,
      Recoverable::Parallel(state) => &state.transition,
    }
  }

  fn retry(self) -> &'a [Retrier] {
    match self {
      Recoverable::Task(state) => &state.retry,
      Recoverable::Map(state) => &state.retry,
      Recoverable::Parallel(state) => &state.retry,
    }
  }

  fn catch(self) -> &'a [Catcher] {
    match self {
      Recoverable::Task(state) => &state.catch,
      Recoverable::Map(state) => &state.catch,
      Recoverable::Parallel(state) => &state.catch,
    }
  }
}

enum Recovery {
  Retry,
  Caught { next: String, output: Value },
}

impl<'a, N: ExecutionNotifier> WorkflowExecution<'a, N> {
  /// Attempt `state` until it succeeds, a catcher routes it elsewhere, or
  /// the failure is unhandled.
  ///
  /// Every attempt starts from the raw state input, so Parameters and the
  /// runner call are repeated.
  pub(crate) async fn run_recoverable(
    &mut self,
    state: Recoverable<'a>,
    input: Value,
  ) -> Result<Outcome, RuntimeError> {
    // Position in `Retry` of the retrier that handled the last failure.
    let mut last_retrier = None;
    loop {
      // RetryCount changes between attempts and is visible through `$$`.
      self.sync_context_tree()?;
      let context = &self.context_tree;
      let attempt = match state {
        Recoverable::Task(task) => self.invoke_task(task, context, &input).await,
        Recoverable::Map(map) => self.invoke_map(map, context, &input).await,
        Recoverable::Parallel(parallel) => self.invoke_parallel(parallel, context, &input).await,
      };

      let failure = match attempt {
        Ok(output) => return Ok(Outcome::new(state.transition().next(), output)),
        Err(failure) => failure,
      };

      match self.recover(state, &input, failure, &mut last_retrier).await? {
        Recovery::Retry => continue,
        Recovery::Caught { next, output } => {
          return Ok(Outcome {
            next: Some(next),
            output,
          });
        }
      }
    }
  }

  async fn recover(
    &mut self,
    state: Recoverable<'a>,
    input: &Value,
    failure: TaskFailure,
    last_retrier: &mut Option<usize>,
  ) -> Result<Recovery, RuntimeError> {
    let rendered = failure.to_string();

    let retrier = state
      .retry()
      .iter()
      .enumerate()
      .find(|(_, retrier)| retrier.matches(&failure.error, &rendered));
    if let Some((position, retrier)) = retrier {
      let record = &mut self.context.state;
      if *last_retrier != Some(position) {
        *last_retrier = Some(position);
        record.retry_count = 0;
        record.retrier = Some(retrier.error_equals.clone());
      }
      record.retry_count += 1;
      let retry_count = record.retry_count;

      if retry_count <= retrier.max_attempts {
        let delay = retrier.sleep_duration(retry_count);
        warn!(
          execution_id = %self.execution_id(),
          state = %state.name(),
          error = %failure,
          retry_count,
          delay_ms = delay.as_millis() as u64,
          "task_retrying"
        );
        self.notify(ExecutionEvent::TaskRetrying {
          execution_id: self.execution_id().to_string(),
          state: state.name().to_string(),
          error: failure.error.clone(),
          retry_count,
          delay_ms: delay.as_millis() as u64,
        });

        tokio::time::sleep(delay).await;
        return Ok(Recovery::Retry);
      }
    }

    let catcher = state
      .catch()
      .iter()
      .find(|catcher| catcher.matches(&failure.error, &rendered));
    if let Some(catcher) = catcher {
      let output = merge_result(catcher.result_path.as_ref(), input, failure.to_value())
        .map_err(|source| RuntimeError::Path {
          state: state.name().to_string(),
          source,
        })?;

      warn!(
        execution_id = %self.execution_id(),
        state = %state.name(),
        error = %failure,
        next = %catcher.next,
        "task_caught"
      );
      self.notify(ExecutionEvent::TaskCaught {
        execution_id: self.execution_id().to_string(),
        state: state.name().to_string(),
        error: failure.error.clone(),
        next: catcher.next.clone(),
      });

      return Ok(Recovery::Caught {
        next: catcher.next.clone(),
        output,
      });
    }

    Err(RuntimeError::TaskFailed {
      state: state.name().to_string(),
      failure,
    })
  }
}
