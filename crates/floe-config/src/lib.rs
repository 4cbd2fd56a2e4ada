//! Floe Config
//!
//! This crate contains the serializable workflow definition types for floe.
//! A definition is an Amazon States Language style JSON document: a `StartAt`
//! state name and a `States` map of state name to state definition.
//!
//! Definitions can be loaded from:
//! - JSON files (via the CLI)
//! - JSON strings (embedded or generated definitions)
//!
//! The types here are a faithful mirror of the document. Validation (dangling
//! `Next` references, path syntax, choice rule shape) happens when the
//! definition is built into a `floe_workflow::Workflow`.

mod error;
mod retry;
mod state;
mod workflow;

pub use error::ConfigError;
pub use retry::{CatcherDef, RetrierDef};
pub use state::{
  ChoiceDef, FailDef, MapDef, ParallelDef, PassDef, StateDef, SucceedDef, TaskDef, WaitDef,
};
pub use workflow::WorkflowDef;

/// Deserialize a field whose explicit `null` differs from being absent.
///
/// Absent fields keep `None` through `#[serde(default)]`, an explicit `null`
/// becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: serde::Deserializer<'de>,
  T: serde::Deserialize<'de>,
{
  use serde::Deserialize;
  Option::<T>::deserialize(deserializer).map(Some)
}
