use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{DockerRunnerKind, RunnerConfig};
use crate::docker::DockerRunner;
use crate::error::RunnerError;
use crate::kubernetes::KubernetesRunner;
use crate::podman::PodmanRunner;
use crate::runner::{Runner, scheme};

/// Maps resource URI schemes to runners.
#[derive(Clone, Default)]
pub struct RunnerRegistry {
  runners: HashMap<String, Arc<dyn Runner>>,
}

impl RunnerRegistry {
  /// An empty registry. Every resource is unsupported until a runner is
  /// registered.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry serving `docker://` with the backend `config` selects.
  pub fn from_config(config: &RunnerConfig) -> Self {
    let docker: Arc<dyn Runner> = match config.docker_runner {
      DockerRunnerKind::Docker => Arc::new(DockerRunner::new(config.docker.clone())),
      DockerRunnerKind::Podman => Arc::new(PodmanRunner::new(config.podman.clone())),
      DockerRunnerKind::Kubernetes => Arc::new(KubernetesRunner::new(config.kubernetes.clone())),
    };
    Self::new().with_runner("docker", docker)
  }

  pub fn register(&mut self, scheme: impl Into<String>, runner: Arc<dyn Runner>) {
    self.runners.insert(scheme.into(), runner);
  }

  pub fn with_runner(mut self, scheme: impl Into<String>, runner: Arc<dyn Runner>) -> Self {
    self.register(scheme, runner);
    self
  }

  /// The runner for `resource`'s scheme.
  pub fn resolve(&self, resource: &str) -> Result<Arc<dyn Runner>, RunnerError> {
    scheme(resource)
      .and_then(|scheme| self.runners.get(scheme))
      .cloned()
      .ok_or_else(|| RunnerError::UnsupportedScheme {
        resource: resource.to_string(),
      })
  }

  pub fn schemes(&self) -> impl Iterator<Item = &str> {
    self.runners.keys().map(String::as_str)
  }
}

impl fmt::Debug for RunnerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RunnerRegistry")
      .field("schemes", &self.runners.keys().collect::<Vec<_>>())
      .finish()
  }
}
