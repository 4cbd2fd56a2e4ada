use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::KubernetesConfig;
use crate::error::RunnerError;
use crate::process::run_command;
use crate::runner::{RunOutput, RunRequest, Runner};

/// Runs `docker://` resources as one-shot pods via `kubectl run`.
///
/// Credentials travel as JSON in the `_CREDENTIALS` environment variable.
#[derive(Debug, Clone)]
pub struct KubernetesRunner {
  binary: String,
  config: KubernetesConfig,
}

impl KubernetesRunner {
  pub fn new(config: KubernetesConfig) -> Self {
    let binary = config
      .binary
      .as_ref()
      .map_or_else(|| "kubectl".to_string(), |path| path.display().to_string());
    Self { binary, config }
  }

  fn namespace_args(&self) -> Vec<String> {
    self
      .config
      .namespace
      .iter()
      .map(|namespace| format!("--namespace={namespace}"))
      .collect()
  }

  pub(crate) fn args(&self, request: &RunRequest, pod: &str) -> Result<Vec<String>, RunnerError> {
    let image = request.target();
    if image.is_empty() {
      return Err(RunnerError::InvalidResource {
        resource: request.resource.clone(),
        message: "missing image".to_string(),
      });
    }

    let mut args = vec![
      "run".to_string(),
      pod.to_string(),
      "--rm".to_string(),
      "-i".to_string(),
      "--quiet".to_string(),
      "--restart=Never".to_string(),
      format!("--image={image}"),
    ];
    args.extend(self.namespace_args());
    if let Some(policy) = &self.config.image_pull_policy {
      args.push(format!("--image-pull-policy={policy}"));
    }
    for (key, value) in &request.env {
      args.push(format!("--env={key}={value}"));
    }
    if request.has_secrets() {
      args.push(format!("--env=_CREDENTIALS={}", request.secrets));
    }

    Ok(args)
  }

  /// `--rm` only cleans up when kubectl exits normally.
  async fn delete_pod(&self, pod: &str) {
    let mut args = vec![
      "delete".to_string(),
      "pod".to_string(),
      pod.to_string(),
      "--ignore-not-found".to_string(),
      "--wait=false".to_string(),
    ];
    args.extend(self.namespace_args());

    if let Err(e) = run_command(&self.binary, &args, pod, None).await {
      warn!(pod, error = %e, "failed to delete timed out pod");
    }
  }
}

fn pod_name() -> String {
  let id = uuid::Uuid::new_v4().simple().to_string();
  format!("floe-task-{}", &id[..12])
}

#[async_trait]
impl Runner for KubernetesRunner {
  #[instrument(name = "kubernetes_run", skip(self, request), fields(resource = %request.resource))]
  async fn run(&self, request: RunRequest) -> Result<RunOutput, RunnerError> {
    let pod = pod_name();
    let args = self.args(&request, &pod)?;
    info!(pod = %pod, image = %request.target(), "starting pod");

    let result = run_command(&self.binary, &args, &request.resource, request.timeout).await;
    match &result {
      Ok(output) => info!(pod = %pod, exit_status = output.exit_status, "pod exited"),
      Err(RunnerError::Timeout { .. }) => self.delete_pod(&pod).await,
      Err(_) => {}
    }
    result
  }
}
