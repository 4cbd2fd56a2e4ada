use async_trait::async_trait;

use crate::config::ContainerConfig;
use crate::docker::DockerRunner;
use crate::error::RunnerError;
use crate::runner::{RunOutput, RunRequest, Runner};

/// Runs `docker://` resources through `podman`, which shares the docker CLI
/// surface.
#[derive(Debug, Clone)]
pub struct PodmanRunner(DockerRunner);

impl PodmanRunner {
  pub fn new(config: ContainerConfig) -> Self {
    Self(DockerRunner::with_binary("podman", config))
  }

  pub fn binary(&self) -> &str {
    self.0.binary()
  }
}

#[async_trait]
impl Runner for PodmanRunner {
  async fn run(&self, request: RunRequest) -> Result<RunOutput, RunnerError> {
    self.0.run(request).await
  }
}
