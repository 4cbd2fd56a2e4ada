mod common;

use std::time::Duration;

use common::{ScriptedRunner, exit, runtime};
use floe_runtime::{BRANCH_FAILED, RUNTIME, RuntimeError};
use serde_json::{Value, json};

fn delayed_map(max_concurrency: u64) -> Value {
  json!({
    "StartAt": "Each",
    "States": {
      "Each": {
        "Type": "Map",
        "ItemsPath": "$.jobs",
        "MaxConcurrency": max_concurrency,
        "Iterator": {
          "StartAt": "Delay",
          "States": {
            "Delay": {"Type": "Wait", "SecondsPath": "$.delay", "Next": "Done"},
            "Done": {"Type": "Pass", "InputPath": "$.id", "End": true}
          }
        },
        "ResultPath": "$.done",
        "End": true
      }
    }
  })
}

fn jobs() -> Value {
  json!({"jobs": [
    {"id": "a", "delay": 3},
    {"id": "b", "delay": 1},
    {"id": "c", "delay": 2}
  ]})
}

#[tokio::test(start_paused = true)]
async fn test_map_keeps_item_order() {
  let runtime = runtime(delayed_map(0), ScriptedRunner::echo());

  let started = tokio::time::Instant::now();
  let mut execution = runtime.execute(jobs());
  let output = execution.run().await.unwrap();

  assert_eq!(output["done"], json!(["a", "b", "c"]));
  // Unbounded: the slowest item dominates.
  assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_map_max_concurrency() {
  let runtime = runtime(delayed_map(1), ScriptedRunner::echo());

  let started = tokio::time::Instant::now();
  let mut execution = runtime.execute(jobs());
  let output = execution.run().await.unwrap();

  assert_eq!(output["done"], json!(["a", "b", "c"]));
  assert!(started.elapsed() >= Duration::from_secs(6));
}

#[tokio::test]
async fn test_map_item_selector_and_tasks() {
  let runner = ScriptedRunner::echo();
  let runtime = runtime(
    json!({
      "StartAt": "Each",
      "States": {
        "Each": {
          "Type": "Map",
          "ItemsPath": "$.users",
          "ItemSelector": {
            "user.$": "$$.Map.Item.Value",
            "index.$": "$$.Map.Item.Index",
            "region.$": "$.region"
          },
          "Iterator": {
            "StartAt": "Greet",
            "States": {"Greet": {"Type": "Task", "Resource": "test://greet", "End": true}}
          },
          "ResultSelector": {"all.$": "$"},
          "ResultPath": "$.greeted",
          "End": true
        }
      }
    }),
    runner.clone(),
  );

  let mut execution = runtime.execute(json!({"users": ["ann", "bob"], "region": "eu"}));
  let output = execution.run().await.unwrap();

  assert_eq!(
    output["greeted"]["all"],
    json!([
      {"index": "0", "region": "eu", "user": "ann"},
      {"index": "1", "region": "eu", "user": "bob"}
    ])
  );
  assert_eq!(runner.calls(), 2);
}

#[tokio::test]
async fn test_map_items_must_be_array() {
  let runtime = runtime(delayed_map(0), ScriptedRunner::echo());

  let mut execution = runtime.execute(json!({"jobs": "nope"}));
  let Err(RuntimeError::TaskFailed { state, failure }) = execution.run().await else {
    panic!("expected an unhandled task failure");
  };
  assert_eq!(state, "Each");
  assert_eq!(failure.error, RUNTIME);
}

#[tokio::test]
async fn test_parallel_keeps_branch_order() {
  let runtime = runtime(
    json!({
      "StartAt": "Both",
      "States": {
        "Both": {
          "Type": "Parallel",
          "Branches": [
            {
              "StartAt": "Slow",
              "States": {
                "Slow": {"Type": "Wait", "Seconds": 0, "Next": "One"},
                "One": {"Type": "Pass", "Result": {"branch": 1}, "End": true}
              }
            },
            {
              "StartAt": "Two",
              "States": {"Two": {"Type": "Pass", "Result": {"branch": 2}, "End": true}}
            }
          ],
          "ResultPath": "$.branches",
          "Next": "Done"
        },
        "Done": {"Type": "Succeed"}
      }
    }),
    ScriptedRunner::echo(),
  );

  let mut execution = runtime.execute(json!({"id": 7}));
  assert_eq!(
    execution.run().await.unwrap(),
    json!({
      "id": 7,
      "branches": [{"id": 7, "branch": 1}, {"id": 7, "branch": 2}]
    })
  );
}

#[tokio::test]
async fn test_parallel_branch_fail_is_catchable() {
  let runtime = runtime(
    json!({
      "StartAt": "Both",
      "States": {
        "Both": {
          "Type": "Parallel",
          "Branches": [
            {"StartAt": "Fine", "States": {"Fine": {"Type": "Succeed"}}},
            {
              "StartAt": "Broken",
              "States": {"Broken": {"Type": "Fail", "Error": "Branch.Broken", "Cause": "nope"}}
            }
          ],
          "Catch": [{"ErrorEquals": ["Branch.Broken"], "Next": "Recovered", "ResultPath": "$.error"}],
          "End": true
        },
        "Recovered": {"Type": "Pass", "End": true}
      }
    }),
    ScriptedRunner::echo(),
  );

  let mut execution = runtime.execute(json!({}));
  assert_eq!(
    execution.run().await.unwrap(),
    json!({"error": {"Error": "Branch.Broken", "Cause": "nope"}})
  );
}

#[tokio::test]
async fn test_unhandled_branch_task_failure() {
  let runner = ScriptedRunner::always(exit(1, "boom"));
  let runtime = runtime(
    json!({
      "StartAt": "Both",
      "States": {
        "Both": {
          "Type": "Parallel",
          "Branches": [{
            "StartAt": "Job",
            "States": {"Job": {"Type": "Task", "Resource": "test://job", "End": true}}
          }],
          "Retry": [{"ErrorEquals": ["States.BranchFailed"], "MaxAttempts": 1, "IntervalSeconds": 0}],
          "End": true
        }
      }
    }),
    runner.clone(),
  );

  let mut execution = runtime.execute(json!({}));
  let Err(RuntimeError::TaskFailed { state, failure }) = execution.run().await else {
    panic!("expected an unhandled task failure");
  };
  assert_eq!(state, "Both");
  assert_eq!(failure.error, BRANCH_FAILED);
  assert!(failure.cause.contains("boom"));
  // The whole branch is retried once.
  assert_eq!(runner.calls(), 2);
}
