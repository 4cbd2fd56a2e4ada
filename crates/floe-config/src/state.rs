use serde::{Deserialize, Serialize};

use crate::retry::{CatcherDef, RetrierDef};
use crate::workflow::WorkflowDef;

/// A single state definition, discriminated by its `Type` field.
///
/// Path fields use `Option<Option<String>>`: `None` means the field was
/// absent (the default `$` applies), `Some(None)` means an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum StateDef {
  Pass(PassDef),
  Task(TaskDef),
  Choice(ChoiceDef),
  Wait(WaitDef),
  Succeed(SucceedDef),
  Fail(FailDef),
  Map(MapDef),
  Parallel(ParallelDef),
}

impl StateDef {
  /// The `Type` discriminant as written in the document.
  pub fn type_name(&self) -> &'static str {
    match self {
      StateDef::Pass(_) => "Pass",
      StateDef::Task(_) => "Task",
      StateDef::Choice(_) => "Choice",
      StateDef::Wait(_) => "Wait",
      StateDef::Succeed(_) => "Succeed",
      StateDef::Fail(_) => "Fail",
      StateDef::Map(_) => "Map",
      StateDef::Parallel(_) => "Parallel",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PassDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  #[serde(default)]
  pub end: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub result_path: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parameters: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDef {
  /// Resource URI, e.g. `docker://docker.io/library/alpine:latest`.
  pub resource: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  #[serde(default)]
  pub end: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub result_path: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parameters: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result_selector: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub retry: Vec<RetrierDef>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub catch: Vec<CatcherDef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_seconds: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub heartbeat_seconds: Option<u64>,
  /// Payload template resolved against the out-of-band credentials map.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub credentials: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChoiceDef {
  /// Choice rules, kept as raw JSON: their comparison keys are dynamic.
  pub choices: Vec<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WaitDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  #[serde(default)]
  pub end: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seconds: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seconds_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timestamp_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SucceedDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailDef {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapDef {
  /// Sub-workflow run once per item.
  #[serde(alias = "ItemProcessor")]
  pub iterator: WorkflowDef,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  #[serde(default)]
  pub end: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub result_path: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub items_path: Option<String>,
  #[serde(alias = "Parameters", skip_serializing_if = "Option::is_none")]
  pub item_selector: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result_selector: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_concurrency: Option<u32>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub retry: Vec<RetrierDef>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub catch: Vec<CatcherDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParallelDef {
  pub branches: Vec<WorkflowDef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
  #[serde(default)]
  pub end: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub input_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub output_path: Option<Option<String>>,
  #[serde(default, deserialize_with = "crate::nullable", skip_serializing_if = "Option::is_none")]
  pub result_path: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result_selector: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub retry: Vec<RetrierDef>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub catch: Vec<CatcherDef>,
}
