//! Map and Parallel states.
//!
//! Every Map item and Parallel branch runs as its own nested execution with a
//! forked [`Context`](crate::Context). Results are collected in item or
//! branch order regardless of completion order.

use floe_workflow::{MapState, ParallelState};
use futures::{StreamExt, TryStreamExt, future, stream};
use serde_json::Value;

use crate::events::ExecutionNotifier;
use crate::execution::WorkflowExecution;
use crate::failure::{RUNTIME, TaskFailure};
use crate::task::shape_result;

impl<'a, N: ExecutionNotifier> WorkflowExecution<'a, N> {
  pub(crate) async fn invoke_map(
    &self,
    state: &'a MapState,
    context: &Value,
    input: &Value,
  ) -> Result<Value, TaskFailure> {
    let effective = state.input_path.apply(context, input);
    let items = match state.items_path.value(context, &effective) {
      Some(Value::Array(items)) => items,
      other => {
        return Err(TaskFailure::new(
          RUNTIME,
          format!(
            "ItemsPath '{}' must select an array, got {}",
            state.items_path,
            other.unwrap_or(Value::Null)
          ),
        ));
      }
    };

    // MaxConcurrency 0 means no limit.
    let limit = match state.max_concurrency {
      0 => items.len().max(1),
      limit => limit,
    };

    let start_at = state.iterator.start_at();
    let effective = &effective;
    let runs = items.into_iter().enumerate().map(|(index, item)| {
      let mut context = self
        .context
        .fork(start_at, item.clone())
        .with_map_item(index, item);
      async move {
        if let Some(selector) = &state.item_selector {
          let selector_context = context
            .to_value()
            .map_err(|e| TaskFailure::new(RUNTIME, e.to_string()))?;
          context.state.input = selector.value(&selector_context, effective);
        }
        WorkflowExecution::new(self.runtime, &state.iterator, context, true)
          .run_nested()
          .await
      }
    });

    let outputs: Vec<Value> = stream::iter(runs).buffered(limit).try_collect().await?;

    shape_result(
      context,
      input,
      Value::Array(outputs),
      state.result_selector.as_ref(),
      state.result_path.as_ref(),
      &state.output_path,
    )
  }

  pub(crate) async fn invoke_parallel(
    &self,
    state: &'a ParallelState,
    context: &Value,
    input: &Value,
  ) -> Result<Value, TaskFailure> {
    let effective = state.input_path.apply(context, input);

    let runs = state.branches.iter().map(|branch| {
      let context = self.context.fork(branch.start_at(), effective.clone());
      WorkflowExecution::new(self.runtime, branch, context, true).run_nested()
    });
    let outputs = future::try_join_all(runs).await?;

    shape_result(
      context,
      input,
      Value::Array(outputs),
      state.result_selector.as_ref(),
      state.result_path.as_ref(),
      &state.output_path,
    )
  }
}
