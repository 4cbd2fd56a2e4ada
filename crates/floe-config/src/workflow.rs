use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::StateDef;

/// A workflow definition document.
///
/// Also used for the nested graphs of Map iterators and Parallel branches,
/// which share the `StartAt` + `States` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowDef {
  /// Name of the first state to run.
  pub start_at: String,
  /// States keyed by their unique name.
  pub states: BTreeMap<String, StateDef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_seconds: Option<u64>,
}

impl WorkflowDef {
  /// Parse a definition from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Parse a definition from an already-decoded JSON value.
  pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
    Ok(serde_json::from_value(value)?)
  }

  /// Read and parse a definition file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&contents)
  }

  /// Look up a state definition by name.
  pub fn state(&self, name: &str) -> Option<&StateDef> {
    self.states.get(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_minimal_pass_workflow() {
    let def = WorkflowDef::from_json(
      r#"{"StartAt":"A","States":{"A":{"Type":"Pass","Result":{"x":1},"End":true}}}"#,
    )
    .unwrap();

    assert_eq!(def.start_at, "A");
    match def.state("A").unwrap() {
      StateDef::Pass(pass) => {
        assert!(pass.end);
        assert_eq!(pass.result, Some(json!({"x": 1})));
        assert_eq!(pass.result_path, None);
      }
      other => panic!("expected Pass, got {}", other.type_name()),
    }
  }

  #[test]
  fn test_null_paths_differ_from_absent_paths() {
    let def = WorkflowDef::from_value(json!({
      "StartAt": "A",
      "States": {
        "A": {"Type": "Pass", "ResultPath": null, "OutputPath": "$.x", "End": true}
      }
    }))
    .unwrap();

    let StateDef::Pass(pass) = def.state("A").unwrap() else {
      panic!("expected Pass");
    };
    assert_eq!(pass.result_path, Some(None));
    assert_eq!(pass.output_path, Some(Some("$.x".to_string())));
    assert_eq!(pass.input_path, None);
  }

  #[test]
  fn test_parse_task_with_retry_and_catch() {
    let def = WorkflowDef::from_value(json!({
      "StartAt": "Work",
      "States": {
        "Work": {
          "Type": "Task",
          "Resource": "docker://alpine:latest",
          "Retry": [{"ErrorEquals": ["States.ALL"], "MaxAttempts": 2, "IntervalSeconds": 0}],
          "Catch": [{"ErrorEquals": ["States.TaskFailed"], "Next": "Failed", "ResultPath": "$.error"}],
          "TimeoutSeconds": 30,
          "Next": "Done"
        },
        "Failed": {"Type": "Fail", "Error": "Boom", "Cause": "it broke"},
        "Done": {"Type": "Succeed"}
      }
    }))
    .unwrap();

    let StateDef::Task(task) = def.state("Work").unwrap() else {
      panic!("expected Task");
    };
    assert_eq!(task.resource, "docker://alpine:latest");
    assert_eq!(task.retry[0].max_attempts, Some(2));
    assert_eq!(task.retry[0].backoff_rate, None);
    assert_eq!(task.catch[0].next, "Failed");
    assert_eq!(task.catch[0].result_path, Some(Some("$.error".to_string())));
    assert_eq!(task.timeout_seconds, Some(30));
  }

  #[test]
  fn test_map_accepts_item_processor_alias() {
    let def = WorkflowDef::from_value(json!({
      "StartAt": "Each",
      "States": {
        "Each": {
          "Type": "Map",
          "ItemsPath": "$.items",
          "Parameters": {"value.$": "$$.Map.Item.Value"},
          "ItemProcessor": {
            "StartAt": "Inner",
            "States": {"Inner": {"Type": "Pass", "End": true}}
          },
          "End": true
        }
      }
    }))
    .unwrap();

    let StateDef::Map(map) = def.state("Each").unwrap() else {
      panic!("expected Map");
    };
    assert_eq!(map.iterator.start_at, "Inner");
    assert!(map.item_selector.is_some());
  }

  #[test]
  fn test_unknown_state_type_is_rejected() {
    let result = WorkflowDef::from_json(
      r#"{"StartAt":"A","States":{"A":{"Type":"Teleport","End":true}}}"#,
    );
    assert!(matches!(result, Err(ConfigError::Parse(_))));
  }

  #[test]
  fn test_malformed_json_is_rejected() {
    let result = WorkflowDef::from_json(r#"{"StartAt":"A","States":"#);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
  }

  #[test]
  fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workflow.json");
    std::fs::write(
      &path,
      r#"{"StartAt":"Done","States":{"Done":{"Type":"Succeed"}}}"#,
    )
    .unwrap();

    let def = WorkflowDef::from_file(&path).unwrap();
    assert_eq!(def.states.len(), 1);

    let missing = WorkflowDef::from_file(dir.path().join("missing.json"));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));
  }
}
