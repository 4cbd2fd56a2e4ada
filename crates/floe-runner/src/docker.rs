use std::path::Path;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::config::ContainerConfig;
use crate::error::RunnerError;
use crate::process::run_command;
use crate::runner::{RunOutput, RunRequest, Runner};

/// Where credentials are mounted inside the container.
pub const SECRETS_DIR: &str = "/run/secrets";
const SECRETS_FILE: &str = "credentials.json";

/// Runs `docker://` resources with a docker-compatible CLI.
///
/// `docker run --rm [--network N] [--pull P] -e K=V ... IMAGE`. Credentials
/// are written to a private temp directory, mounted read-only at
/// [`SECRETS_DIR`], and `_CREDENTIALS` names the file inside it.
#[derive(Debug, Clone)]
pub struct DockerRunner {
  binary: String,
  config: ContainerConfig,
}

impl DockerRunner {
  pub fn new(config: ContainerConfig) -> Self {
    Self::with_binary("docker", config)
  }

  /// Use another docker-compatible CLI, such as `podman`.
  pub(crate) fn with_binary(default: &str, config: ContainerConfig) -> Self {
    let binary = config
      .binary
      .as_ref()
      .map_or_else(|| default.to_string(), |path| path.display().to_string());
    Self { binary, config }
  }

  pub fn binary(&self) -> &str {
    &self.binary
  }

  pub(crate) fn args(
    &self,
    request: &RunRequest,
    secrets_dir: Option<&Path>,
  ) -> Result<Vec<String>, RunnerError> {
    let image = request.target();
    if image.is_empty() {
      return Err(RunnerError::InvalidResource {
        resource: request.resource.clone(),
        message: "missing image".to_string(),
      });
    }

    let mut args = vec!["run".to_string(), "--rm".to_string()];
    if let Some(network) = &self.config.network {
      args.push(format!("--network={network}"));
    }
    if let Some(pull) = &self.config.pull {
      args.push(format!("--pull={pull}"));
    }
    for (key, value) in &request.env {
      args.push("-e".to_string());
      args.push(format!("{key}={value}"));
    }
    if let Some(dir) = secrets_dir {
      args.push("-v".to_string());
      args.push(format!("{}:{SECRETS_DIR}:ro", dir.display()));
      args.push("-e".to_string());
      args.push(format!("_CREDENTIALS={SECRETS_DIR}/{SECRETS_FILE}"));
    }
    args.push(image.to_string());

    Ok(args)
  }
}

#[async_trait]
impl Runner for DockerRunner {
  #[instrument(name = "docker_run", skip(self, request), fields(binary = %self.binary, resource = %request.resource))]
  async fn run(&self, request: RunRequest) -> Result<RunOutput, RunnerError> {
    // Removed when dropped, after the container exits.
    let secrets = if request.has_secrets() {
      let dir = tempfile::tempdir()?;
      let contents = serde_json::to_vec(&request.secrets)?;
      tokio::fs::write(dir.path().join(SECRETS_FILE), contents).await?;
      Some(dir)
    } else {
      None
    };

    let args = self.args(&request, secrets.as_ref().map(|dir| dir.path()))?;
    info!(image = %request.target(), env_vars = request.env.len(), "starting container");

    let output = run_command(&self.binary, &args, &request.resource, request.timeout).await?;
    info!(exit_status = output.exit_status, "container exited");
    Ok(output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::path::PathBuf;

  fn request() -> RunRequest {
    RunRequest::new("docker://alpine:3.20", &json!({"A": "1", "B": 2})).unwrap()
  }

  #[test]
  fn test_args() {
    let runner = DockerRunner::new(ContainerConfig::default());
    assert_eq!(runner.binary(), "docker");
    assert_eq!(
      runner.args(&request(), None).unwrap(),
      vec!["run", "--rm", "-e", "A=1", "-e", "B=2", "alpine:3.20"]
    );
  }

  #[test]
  fn test_args_with_config_and_secrets() {
    let runner = DockerRunner::new(ContainerConfig {
      binary: Some(PathBuf::from("/usr/local/bin/docker")),
      network: Some("tasks".to_string()),
      pull: Some("never".to_string()),
    });
    assert_eq!(runner.binary(), "/usr/local/bin/docker");

    let args = runner
      .args(&request(), Some(Path::new("/tmp/floe-secrets")))
      .unwrap();
    assert_eq!(
      args,
      vec![
        "run",
        "--rm",
        "--network=tasks",
        "--pull=never",
        "-e",
        "A=1",
        "-e",
        "B=2",
        "-v",
        "/tmp/floe-secrets:/run/secrets:ro",
        "-e",
        "_CREDENTIALS=/run/secrets/credentials.json",
        "alpine:3.20",
      ]
    );
  }

  #[test]
  fn test_missing_image() {
    let runner = DockerRunner::new(ContainerConfig::default());
    let request = RunRequest::new("docker://", &json!({})).unwrap();
    assert!(matches!(
      runner.args(&request, None),
      Err(RunnerError::InvalidResource { .. })
    ));
  }
}
