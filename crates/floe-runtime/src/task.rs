use std::time::Duration;

use floe_path::{PathError, PayloadTemplate, ReferencePath};
use floe_runner::RunRequest;
use floe_workflow::{PathFilter, TaskState};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::events::ExecutionNotifier;
use crate::execution::WorkflowExecution;
use crate::failure::TaskFailure;

impl<'a, N: ExecutionNotifier> WorkflowExecution<'a, N> {
  /// One attempt at a Task: project the input, call the runner and shape
  /// its result into the state output.
  pub(crate) async fn invoke_task(
    &self,
    state: &TaskState,
    context: &Value,
    input: &Value,
  ) -> Result<Value, TaskFailure> {
    let effective = state.input_path.apply(context, input);
    let parameters = match &state.parameters {
      Some(template) => template.value(context, &effective),
      None => effective,
    };

    // Credentials never see the run's data, only the credentials map.
    let secrets = state.credentials.as_ref().map_or(Value::Null, |template| {
      template.value(&Value::Object(Map::new()), &self.runtime.credentials)
    });

    let runner = self.runtime.runners.resolve(&state.resource)?;
    let request = RunRequest::new(&state.resource, &parameters)?
      .with_secrets(secrets)
      .with_timeout(state.timeout_seconds.map(Duration::from_secs))
      .with_heartbeat(state.heartbeat_seconds.map(Duration::from_secs));

    debug!(
      execution_id = %self.execution_id(),
      state = %state.name,
      resource = %state.resource,
      "invoking runner"
    );
    let output = runner.run(request).await?;
    if !output.success() {
      return Err(TaskFailure::from_exit(&output));
    }

    shape_result(
      context,
      input,
      parse_output(&output.output),
      state.result_selector.as_ref(),
      state.result_path.as_ref(),
      &state.output_path,
    )
  }
}

/// Runner stdout as JSON. Output that is not JSON is wrapped as
/// `{"results": <raw>}`.
pub(crate) fn parse_output(raw: &str) -> Value {
  let raw = raw.trim();
  serde_json::from_str(raw).unwrap_or_else(|_| json!({"results": raw}))
}

/// Apply ResultSelector, ResultPath and OutputPath to a state's result.
pub(crate) fn shape_result(
  context: &Value,
  input: &Value,
  result: Value,
  selector: Option<&PayloadTemplate>,
  result_path: Option<&ReferencePath>,
  output_path: &PathFilter,
) -> Result<Value, TaskFailure> {
  let result = match selector {
    Some(template) => template.value(context, &result),
    None => result,
  };
  let merged = merge_result(result_path, input, result)?;
  Ok(output_path.apply(context, &merged))
}

/// Write `result` into `input` at `result_path`. `None` discards the result.
pub(crate) fn merge_result(
  result_path: Option<&ReferencePath>,
  input: &Value,
  result: Value,
) -> Result<Value, PathError> {
  match result_path {
    Some(path) => path.set(input, result),
    None => Ok(input.clone()),
  }
}
