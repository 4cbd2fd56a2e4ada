use floe_workflow::{State, Workflow, WorkflowError};
use serde_json::json;

fn build(def: serde_json::Value) -> Result<Workflow, WorkflowError> {
  Workflow::from_json(&def.to_string())
}

#[test]
fn test_valid_workflow() {
  let workflow = build(json!({
    "StartAt": "Check",
    "States": {
      "Check": {
        "Type": "Choice",
        "Choices": [{"Variable": "$.n", "NumericGreaterThan": 5, "Next": "Big"}],
        "Default": "Small"
      },
      "Big": {"Type": "Pass", "Result": "big", "Next": "Done"},
      "Small": {"Type": "Pass", "Result": "small", "Next": "Done"},
      "Done": {"Type": "Succeed"}
    }
  }))
  .unwrap();

  assert_eq!(workflow.start_at(), "Check");
  assert!(matches!(workflow.start_state(), State::Choice(_)));
  assert_eq!(workflow.states().count(), 4);
  assert_eq!(workflow.state("Big").unwrap().type_name(), "Pass");
}

#[test]
fn test_unknown_start_at() {
  let result = build(json!({
    "StartAt": "Missing",
    "States": {"A": {"Type": "Succeed"}}
  }));
  assert!(matches!(result, Err(WorkflowError::UnknownStartAt(name)) if name == "Missing"));
}

#[test]
fn test_empty_states() {
  let result = build(json!({"StartAt": "A", "States": {}}));
  assert!(matches!(result, Err(WorkflowError::NoStates)));
}

#[test]
fn test_dangling_next() {
  let result = build(json!({
    "StartAt": "A",
    "States": {"A": {"Type": "Pass", "Next": "Nowhere"}}
  }));
  assert!(matches!(
    result,
    Err(WorkflowError::UnknownState { state, target }) if state == "A" && target == "Nowhere"
  ));
}

#[test]
fn test_dangling_choice_default_and_catch() {
  let choice = build(json!({
    "StartAt": "A",
    "States": {
      "A": {
        "Type": "Choice",
        "Choices": [{"Variable": "$.x", "IsPresent": true, "Next": "B"}],
        "Default": "Gone"
      },
      "B": {"Type": "Succeed"}
    }
  }));
  assert!(matches!(choice, Err(WorkflowError::UnknownState { target, .. }) if target == "Gone"));

  let catch = build(json!({
    "StartAt": "A",
    "States": {
      "A": {
        "Type": "Task",
        "Resource": "docker://alpine",
        "Catch": [{"ErrorEquals": ["States.ALL"], "Next": "Gone"}],
        "End": true
      }
    }
  }));
  assert!(matches!(catch, Err(WorkflowError::UnknownState { target, .. }) if target == "Gone"));
}

#[test]
fn test_errors_name_the_state() {
  let result = build(json!({
    "StartAt": "A",
    "States": {
      "A": {
        "Type": "Choice",
        "Choices": [{"Variable": "$.x", "Resembles": 1, "Next": "A"}]
      }
    }
  }));

  let Err(WorkflowError::InvalidState { state, source }) = result else {
    panic!("expected InvalidState");
  };
  assert_eq!(state, "A");
  assert!(matches!(*source, WorkflowError::InvalidChoice(_)));
}

#[test]
fn test_invalid_paths_fail_at_construction() {
  for field in ["InputPath", "OutputPath"] {
    let result = build(json!({
      "StartAt": "A",
      "States": {"A": {"Type": "Pass", field: "no-dollar", "End": true}}
    }));
    assert!(matches!(result, Err(WorkflowError::InvalidState { .. })), "{field}");
  }

  let result = build(json!({
    "StartAt": "A",
    "States": {"A": {"Type": "Pass", "ResultPath": "$.a[?(@.b)]", "End": true}}
  }));
  assert!(matches!(result, Err(WorkflowError::InvalidState { .. })));
}

#[test]
fn test_unknown_state_type() {
  let result = build(json!({
    "StartAt": "A",
    "States": {"A": {"Type": "Sleep", "End": true}}
  }));
  assert!(matches!(result, Err(WorkflowError::Config(_))));
}

#[test]
fn test_nested_graphs_are_validated() {
  let result = build(json!({
    "StartAt": "Each",
    "States": {
      "Each": {
        "Type": "Map",
        "Iterator": {
          "StartAt": "Inner",
          "States": {"Inner": {"Type": "Pass", "Next": "Outer"}}
        },
        "End": true
      },
      "Outer": {"Type": "Succeed"}
    }
  }));
  assert!(matches!(result, Err(WorkflowError::InvalidState { state, .. }) if state == "Each"));

  let parallel = build(json!({
    "StartAt": "Fan",
    "States": {
      "Fan": {
        "Type": "Parallel",
        "Branches": [
          {"StartAt": "L", "States": {"L": {"Type": "Pass", "End": true}}},
          {"StartAt": "R", "States": {"R": {"Type": "Succeed"}}}
        ],
        "End": true
      }
    }
  }))
  .unwrap();
  let State::Parallel(fan) = parallel.start_state() else {
    panic!("expected Parallel");
  };
  assert_eq!(fan.branches.len(), 2);
}
