//! Floe Runner
//!
//! This crate provides the boundary between the interpreter and the outside
//! world: a [`Runner`] executes a Task's `Resource` and reports an exit status
//! and raw output.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RunnerRegistry                         │
//! │  - scheme → Arc<dyn Runner>                                 │
//! │  - resolve("docker://alpine") → runner                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            DockerRunner / PodmanRunner / KubernetesRunner   │
//! │  - run(RunRequest) → RunOutput { exit_status, output }      │
//! │  - env from the task input, secrets from Credentials        │
//! │  - enforce TimeoutSeconds, kill on expiry                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Which backend serves `docker://` is chosen by [`RunnerConfig`].

mod config;
mod docker;
mod error;
mod kubernetes;
mod podman;
mod process;
mod registry;
mod runner;

pub use config::{ContainerConfig, DockerRunnerKind, KubernetesConfig, RunnerConfig};
pub use docker::{DockerRunner, SECRETS_DIR};
pub use error::RunnerError;
pub use kubernetes::KubernetesRunner;
pub use podman::PodmanRunner;
pub use registry::RunnerRegistry;
pub use runner::{RunOutput, RunRequest, Runner, scheme};
