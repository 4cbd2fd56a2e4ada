//! The per-run execution record that `$$` paths address.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Mutable record of one workflow run.
///
/// Serialized with PascalCase keys so definitions can read it through
/// `$$.Execution.Input`, `$$.State.RetryCount`, `$$.Map.Item.Value` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Context {
  /// Set once when the run starts.
  pub execution: ExecutionInfo,
  /// Scratch record of the state currently running.
  pub state: StateRecord,
  /// Completed state snapshots in execution order.
  pub states: Vec<StateRecord>,
  pub state_machine: Map<String, Value>,
  pub task: Map<String, Value>,
  /// Present inside a Map iteration.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub map: Option<MapInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionInfo {
  pub id: String,
  pub start_time: String,
  pub input: Value,
}

/// What is known about one state run. `Context::state` holds the running
/// record; `Context::states` the finished ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateRecord {
  pub name: String,
  pub guid: String,
  pub input: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub entered_time: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub finished_time: Option<String>,
  /// Seconds between entering and finishing.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output: Option<Value>,
  pub retry_count: u32,
  /// `ErrorEquals` of the retrier that last matched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retrier: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapInfo {
  pub item: MapItem,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapItem {
  pub index: usize,
  pub value: Value,
}

pub(crate) fn timestamp(time: DateTime<Utc>) -> String {
  time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Context {
  /// A fresh context for a run starting at `start_at` with `input`.
  pub fn new(execution_id: impl Into<String>, start_at: &str, input: Value) -> Self {
    Self {
      execution: ExecutionInfo {
        id: execution_id.into(),
        start_time: timestamp(Utc::now()),
        input: input.clone(),
      },
      state: StateRecord::pending(start_at, input),
      states: Vec::new(),
      state_machine: Map::new(),
      task: Map::new(),
      map: None,
    }
  }

  /// A context for a nested run (Map iteration or Parallel branch).
  ///
  /// Execution metadata is shared with the parent; the state scratch and
  /// history start empty.
  pub fn fork(&self, start_at: &str, input: Value) -> Self {
    Self {
      execution: self.execution.clone(),
      state: StateRecord::pending(start_at, input),
      states: Vec::new(),
      state_machine: self.state_machine.clone(),
      task: Map::new(),
      map: None,
    }
  }

  pub fn with_map_item(mut self, index: usize, value: Value) -> Self {
    self.map = Some(MapInfo {
      item: MapItem { index, value },
    });
    self
  }

  /// Reset the state scratch for entering `name`.
  pub(crate) fn enter(&mut self, name: &str, input: Value) {
    self.state = StateRecord {
      name: name.to_string(),
      guid: Uuid::new_v4().to_string(),
      input,
      entered_time: Some(timestamp(Utc::now())),
      ..StateRecord::default()
    };
  }

  /// Close the running record with `output` and append it to the history.
  pub(crate) fn finish(&mut self, output: &Value) {
    let finished = Utc::now();
    let duration = self
      .state
      .entered_time
      .as_deref()
      .and_then(|entered| DateTime::parse_from_rfc3339(entered).ok())
      .and_then(|entered| (finished - entered.with_timezone(&Utc)).num_microseconds())
      .map(|micros| micros as f64 / 1_000_000.0);

    self.state.finished_time = Some(timestamp(finished));
    self.state.duration = duration;
    self.state.output = Some(output.clone());
    self.states.push(self.state.clone());
  }

  /// The context as the JSON tree `$$` paths are evaluated against.
  pub fn to_value(&self) -> Result<Value, serde_json::Error> {
    serde_json::to_value(self)
  }
}

impl StateRecord {
  pub(crate) fn pending(name: &str, input: Value) -> Self {
    Self {
      name: name.to_string(),
      input,
      ..Self::default()
    }
  }
}
