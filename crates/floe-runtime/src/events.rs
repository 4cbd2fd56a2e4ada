//! Execution events and notifiers for observability.
//!
//! Events are emitted as a workflow runs so consumers can follow progress,
//! persist history or stream it elsewhere.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::status::Status;

/// Events emitted during workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// The first state is about to run.
  WorkflowStarted { execution_id: String, input: Value },

  /// A state has been entered.
  StateStarted {
    execution_id: String,
    state: String,
    state_type: String,
    input: Value,
  },

  /// A state has produced its output. `next` is `None` when the state ended
  /// the run.
  StateCompleted {
    execution_id: String,
    state: String,
    output: Value,
    next: Option<String>,
  },

  /// A retrier matched a failure and the state will run again.
  TaskRetrying {
    execution_id: String,
    state: String,
    error: String,
    retry_count: u32,
    delay_ms: u64,
  },

  /// A catcher matched a failure and routed the run to `next`.
  TaskCaught {
    execution_id: String,
    state: String,
    error: String,
    next: String,
  },

  /// The run reached a terminal state.
  WorkflowCompleted {
    execution_id: String,
    status: Status,
    output: Value,
  },

  /// The run was aborted by an unhandled error.
  WorkflowFailed { execution_id: String, error: String },
}

/// Trait for receiving execution events.
///
/// The runtime calls `notify` for each event; implementations decide what to
/// do with them.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // NOTE: Unbounded so a slow consumer never stalls a run. Volume is a few
  // events per state.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
