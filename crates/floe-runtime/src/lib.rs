//! Workflow runtime for floe.
//!
//! This crate steps a validated [`Workflow`](floe_workflow::Workflow) over a
//! JSON context, calling out to runners for Task states.
//!
//! # Architecture
//!
//! ```text
//! WorkflowRuntime
//! ├── new(workflow, runners) / with_notifier(workflow, runners, notifier)
//! ├── with_credentials(credentials)
//! └── execute(input) -> WorkflowExecution
//!
//! WorkflowExecution
//! ├── step()  - run the current state, append it to Context.States, advance
//! ├── run()   - step until Succeed, Fail or End
//! └── status() / output() / error() / context()
//!
//! Task, Map, Parallel
//! └── attempt -> TaskFailure -> Retry (backoff) -> Catch -> RuntimeError
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use floe_runner::{RunnerConfig, RunnerRegistry};
//! use floe_runtime::WorkflowRuntime;
//! use floe_workflow::Workflow;
//!
//! let workflow = Workflow::from_file("workflow.json")?;
//! let runners = RunnerRegistry::from_config(&RunnerConfig::default());
//! let runtime = WorkflowRuntime::new(workflow, runners);
//!
//! let mut execution = runtime.execute(serde_json::json!({"n": 10}));
//! let output = execution.run().await?;
//! ```

mod context;
mod error;
mod events;
mod execution;
mod failure;
mod fanout;
mod flow;
mod recovery;
mod runtime;
mod status;
mod task;

pub use context::{Context, ExecutionInfo, MapInfo, MapItem, StateRecord};
pub use error::RuntimeError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use execution::WorkflowExecution;
pub use failure::{
  BRANCH_FAILED, PARAMETER_PATH_FAILURE, RESULT_PATH_MATCH_FAILURE, RUNTIME, TASK_FAILED, TIMEOUT,
  TaskFailure,
};
pub use runtime::WorkflowRuntime;
pub use status::{ExecutionFailure, Status};
