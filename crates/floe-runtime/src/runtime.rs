//! Workflow runtime.

use floe_runner::RunnerRegistry;
use floe_workflow::Workflow;
use serde_json::{Map, Value};

use crate::context::Context;
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::execution::WorkflowExecution;

/// The workflow runtime.
///
/// Owns a validated workflow, the runners its Task states resolve against and
/// the credentials they may reference. Each call to [`execute`] starts an
/// independent run with its own [`Context`].
///
/// [`execute`]: WorkflowRuntime::execute
pub struct WorkflowRuntime<N: ExecutionNotifier = NoopNotifier> {
  pub(crate) workflow: Workflow,
  pub(crate) runners: RunnerRegistry,
  pub(crate) credentials: Value,
  pub(crate) notifier: N,
}

impl WorkflowRuntime<NoopNotifier> {
  pub fn new(workflow: Workflow, runners: RunnerRegistry) -> Self {
    Self::with_notifier(workflow, runners, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> WorkflowRuntime<N> {
  /// Create a runtime that reports execution events to `notifier`.
  pub fn with_notifier(workflow: Workflow, runners: RunnerRegistry, notifier: N) -> Self {
    Self {
      workflow,
      runners,
      credentials: Value::Object(Map::new()),
      notifier,
    }
  }

  /// Credentials that Task `Credentials` templates resolve against.
  pub fn with_credentials(mut self, credentials: Value) -> Self {
    self.credentials = credentials;
    self
  }

  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  /// Start a run of the workflow with `input`.
  ///
  /// Returns a [`WorkflowExecution`] handle. Nothing runs until it is stepped
  /// or run.
  pub fn execute(&self, input: Value) -> WorkflowExecution<'_, N> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    let context = Context::new(execution_id, self.workflow.start_at(), input);

    WorkflowExecution::new(self, &self.workflow, context, false)
  }
}
