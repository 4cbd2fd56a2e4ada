#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use floe_runner::{RunOutput, RunRequest, Runner, RunnerError, RunnerRegistry};
use floe_runtime::{ExecutionNotifier, WorkflowRuntime};
use floe_workflow::Workflow;
use serde_json::Value;

type Script = dyn Fn(&RunRequest, usize) -> Result<RunOutput, RunnerError> + Send + Sync;

/// A runner whose answers come from a closure of the request and the
/// zero-based call number.
pub struct ScriptedRunner {
  script: Box<Script>,
  requests: Mutex<Vec<RunRequest>>,
}

impl ScriptedRunner {
  pub fn new(
    script: impl Fn(&RunRequest, usize) -> Result<RunOutput, RunnerError> + Send + Sync + 'static,
  ) -> Arc<Self> {
    Arc::new(Self {
      script: Box::new(script),
      requests: Mutex::new(Vec::new()),
    })
  }

  /// Answers every call with the same output.
  pub fn always(output: RunOutput) -> Arc<Self> {
    Self::new(move |_, _| Ok(output.clone()))
  }

  /// Answers with the request's environment as a JSON object.
  pub fn echo() -> Arc<Self> {
    Self::new(|request, _| Ok(ok(&serde_json::to_string(&request.env)?)))
  }

  pub fn calls(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  pub fn requests(&self) -> Vec<RunRequest> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl Runner for ScriptedRunner {
  async fn run(&self, request: RunRequest) -> Result<RunOutput, RunnerError> {
    let call = {
      let mut requests = self.requests.lock().unwrap();
      requests.push(request.clone());
      requests.len() - 1
    };
    (self.script)(&request, call)
  }
}

pub fn ok(output: &str) -> RunOutput {
  exit(0, output)
}

pub fn exit(exit_status: i32, output: &str) -> RunOutput {
  RunOutput {
    exit_status,
    output: output.to_string(),
  }
}

pub fn workflow(definition: Value) -> Workflow {
  Workflow::from_json(&definition.to_string()).unwrap()
}

/// A runtime serving `test://` resources with `runner`.
pub fn runtime(definition: Value, runner: Arc<ScriptedRunner>) -> WorkflowRuntime {
  WorkflowRuntime::new(workflow(definition), registry(runner))
}

pub fn runtime_with_notifier<N: ExecutionNotifier>(
  definition: Value,
  runner: Arc<ScriptedRunner>,
  notifier: N,
) -> WorkflowRuntime<N> {
  WorkflowRuntime::with_notifier(workflow(definition), registry(runner), notifier)
}

fn registry(runner: Arc<ScriptedRunner>) -> RunnerRegistry {
  RunnerRegistry::new().with_runner("test", runner)
}
