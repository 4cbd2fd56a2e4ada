//! Workflow execution.

use std::time::Duration;

use floe_workflow::{State, Workflow};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::context::{Context, StateRecord};
use crate::error::RuntimeError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::failure::{BRANCH_FAILED, TaskFailure};
use crate::recovery::Recoverable;
use crate::runtime::WorkflowRuntime;
use crate::status::{ExecutionFailure, Status};

/// What a single state run produced.
pub(crate) struct Outcome {
  /// `None` when the state ends the run.
  pub(crate) next: Option<String>,
  pub(crate) output: Value,
}

impl Outcome {
  pub(crate) fn new(next: Option<&str>, output: Value) -> Self {
    Self {
      next: next.map(str::to_string),
      output,
    }
  }
}

/// A handle to one run of a workflow.
///
/// Drive it one state at a time with [`step`](Self::step) or to completion
/// with [`run`](Self::run). The handle owns the run's [`Context`].
pub struct WorkflowExecution<'a, N: ExecutionNotifier = NoopNotifier> {
  pub(crate) runtime: &'a WorkflowRuntime<N>,
  graph: &'a Workflow,
  pub(crate) context: Context,
  /// `context` as the JSON tree `$$` paths read. Kept in step by
  /// [`sync_context_tree`](Self::sync_context_tree).
  pub(crate) context_tree: Value,
  current: &'a State,
  status: Status,
  output: Option<Value>,
  failure: Option<ExecutionFailure>,
  /// Map iterations and Parallel branches do not report workflow-level
  /// events or enforce the definition timeout.
  nested: bool,
}

impl<'a, N: ExecutionNotifier> WorkflowExecution<'a, N> {
  pub(crate) fn new(
    runtime: &'a WorkflowRuntime<N>,
    graph: &'a Workflow,
    context: Context,
    nested: bool,
  ) -> Self {
    Self {
      runtime,
      graph,
      context,
      context_tree: Value::Null,
      current: graph.start_state(),
      status: Status::Pending,
      output: None,
      failure: None,
      nested,
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.context.execution.id
  }

  pub fn status(&self) -> Status {
    self.status
  }

  pub fn is_end(&self) -> bool {
    self.status.is_terminal()
  }

  /// The state that the next call to `step` runs.
  pub fn current_state(&self) -> &'a State {
    self.current
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Output of the final state, once the run has ended.
  pub fn output(&self) -> Option<&Value> {
    self.output.as_ref()
  }

  /// Details of the Fail state the run ended in.
  pub fn error(&self) -> Option<&ExecutionFailure> {
    self.failure.as_ref()
  }

  /// Run the current state and advance to the next one.
  ///
  /// Returns the status after the step. Stepping an ended run is a no-op.
  pub async fn step(&mut self) -> Result<Status, RuntimeError> {
    if self.is_end() {
      return Ok(self.status);
    }

    if self.status == Status::Pending {
      self.status = Status::Running;
      if !self.nested {
        info!(
          execution_id = %self.execution_id(),
          input = %self.context.execution.input,
          "workflow_started"
        );
        self.notify(ExecutionEvent::WorkflowStarted {
          execution_id: self.execution_id().to_string(),
          input: self.context.execution.input.clone(),
        });
      }
    }

    let state = self.current;
    let input = self.context.state.input.clone();
    self.context.enter(state.name(), input.clone());

    info!(
      execution_id = %self.execution_id(),
      state = %state.name(),
      state_type = state.type_name(),
      input = %input,
      "state_started"
    );
    self.notify(ExecutionEvent::StateStarted {
      execution_id: self.execution_id().to_string(),
      state: state.name().to_string(),
      state_type: state.type_name().to_string(),
      input: input.clone(),
    });

    let outcome = match self.run_state(state, input).await {
      Ok(outcome) => outcome,
      Err(e) => {
        self.status = Status::Errored;
        return Err(e);
      }
    };

    self.context.finish(&outcome.output);

    info!(
      execution_id = %self.execution_id(),
      state = %state.name(),
      output = %outcome.output,
      next = ?outcome.next,
      "state_completed"
    );
    self.notify(ExecutionEvent::StateCompleted {
      execution_id: self.execution_id().to_string(),
      state: state.name().to_string(),
      output: outcome.output.clone(),
      next: outcome.next.clone(),
    });

    match outcome.next {
      Some(next) => {
        let Some(following) = self.graph.state(&next) else {
          self.status = Status::Errored;
          return Err(RuntimeError::StateNotFound { state: next });
        };
        self.current = following;
        self.context.state = StateRecord::pending(&next, outcome.output);
      }
      None => {
        self.status = match state {
          State::Fail(fail) => {
            self.failure = Some(ExecutionFailure {
              error: fail.error.clone(),
              cause: fail.cause.clone(),
            });
            Status::Errored
          }
          _ => Status::Success,
        };
        self.output = Some(outcome.output);
      }
    }

    Ok(self.status)
  }

  /// Step until the run ends and return its output.
  ///
  /// A run that ends in a Fail state returns `Ok`; check [`status`] and
  /// [`error`] for the failure. Errors are unhandled task failures and
  /// data or definition problems found while running.
  ///
  /// [`status`]: Self::status
  /// [`error`]: Self::error
  #[instrument(
    name = "workflow_execute",
    skip(self),
    fields(execution_id = %self.context.execution.id)
  )]
  pub async fn run(&mut self) -> Result<Value, RuntimeError> {
    let timeout = self.graph.timeout_seconds().filter(|_| !self.nested);
    let result = match timeout {
      Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), self.drive())
        .await
        .unwrap_or(Err(RuntimeError::Timeout { seconds })),
      None => self.drive().await,
    };

    match &result {
      Ok(output) => {
        info!(
          execution_id = %self.execution_id(),
          status = %self.status,
          "workflow_completed"
        );
        self.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: self.execution_id().to_string(),
          status: self.status,
          output: output.clone(),
        });
      }
      Err(e) => {
        self.status = Status::Errored;
        error!(
          execution_id = %self.execution_id(),
          error = %e,
          "workflow_failed"
        );
        self.notify(ExecutionEvent::WorkflowFailed {
          execution_id: self.execution_id().to_string(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  async fn drive(&mut self) -> Result<Value, RuntimeError> {
    while !self.is_end() {
      self.step().await?;
    }
    Ok(self.output.clone().unwrap_or(Value::Null))
  }

  /// Run a Map iteration or Parallel branch to completion.
  ///
  /// A Fail state surfaces as a failure named after its `Error`; any other
  /// abort surfaces as `States.BranchFailed`.
  pub(crate) fn run_nested(mut self) -> BoxFuture<'a, Result<Value, TaskFailure>> {
    async move {
      match self.drive().await {
        Ok(output) => match self.failure.take() {
          Some(failure) => Err(TaskFailure::new(
            failure.error.unwrap_or_else(|| BRANCH_FAILED.to_string()),
            failure.cause.unwrap_or_default(),
          )),
          None => Ok(output),
        },
        Err(e) => Err(TaskFailure::new(BRANCH_FAILED, e.to_string())),
      }
    }
    .boxed()
  }

  async fn run_state(&mut self, state: &'a State, input: Value) -> Result<Outcome, RuntimeError> {
    self.sync_context_tree()?;
    match state {
      State::Pass(pass) => self.run_pass(pass, input),
      State::Task(task) => self.run_recoverable(Recoverable::Task(task), input).await,
      State::Choice(choice) => self.run_choice(choice, input),
      State::Wait(wait) => self.run_wait(wait, input).await,
      State::Succeed(succeed) => self.run_succeed(succeed, input),
      State::Fail(_) => Ok(Outcome::new(None, input)),
      State::Map(map) => self.run_recoverable(Recoverable::Map(map), input).await,
      State::Parallel(parallel) => {
        self
          .run_recoverable(Recoverable::Parallel(parallel), input)
          .await
      }
    }
  }

  /// Bring `context_tree` up to date. After the first call only the running
  /// state record and newly finished history entries are serialized.
  pub(crate) fn sync_context_tree(&mut self) -> Result<(), serde_json::Error> {
    if !self.context_tree.is_object() {
      self.context_tree = self.context.to_value()?;
      return Ok(());
    }

    let state = serde_json::to_value(&self.context.state)?;
    if let Value::Object(tree) = &mut self.context_tree {
      tree.insert("State".to_string(), state);
      if let Some(Value::Array(history)) = tree.get_mut("States") {
        for record in self.context.states.iter().skip(history.len()) {
          history.push(serde_json::to_value(record)?);
        }
      }
    }
    Ok(())
  }

  pub(crate) fn notify(&self, event: ExecutionEvent) {
    self.runtime.notifier.notify(event);
  }
}
