//! Floe Workflow
//!
//! This crate provides the validated, immutable form of a workflow definition.
//! A `Workflow` is built once from a `floe_config::WorkflowDef` and never
//! changes while it runs.
//!
//! Key differences from `floe-config`:
//! - Every `Next`, `Default` and `Catch[].Next` names an existing state
//! - Each non-terminal state sets exactly one of `Next` / `End`
//! - Paths, reference paths and payload templates are compiled
//! - Choice rules are built into a `ChoiceRule` tree
//! - Retry and Catch entries carry their defaults

mod choice;
mod error;
mod retry;
mod state;
mod workflow;

pub use choice::{Choice, ChoiceRule, Comparator, DataRule, Kind, Operand, Test};
pub use error::{EvaluationError, WorkflowError};
pub use retry::{ALL_ERRORS, Catcher, Retrier};
pub use state::{
  ChoiceState, FailState, MapState, ParallelState, PassState, PathFilter, State, SucceedState,
  TaskState, Transition, WaitDuration, WaitState,
};
pub use workflow::Workflow;
