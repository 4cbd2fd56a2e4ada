use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Which backend serves `docker://` resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockerRunnerKind {
  #[default]
  Docker,
  Podman,
  Kubernetes,
}

impl FromStr for DockerRunnerKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "docker" => Ok(Self::Docker),
      "podman" => Ok(Self::Podman),
      "kubernetes" => Ok(Self::Kubernetes),
      other => Err(format!(
        "unknown docker runner '{other}' (expected docker, podman or kubernetes)"
      )),
    }
  }
}

impl fmt::Display for DockerRunnerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Docker => "docker",
      Self::Podman => "podman",
      Self::Kubernetes => "kubernetes",
    })
  }
}

/// Settings shared by the docker and podman CLIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
  /// Overrides the CLI binary (`docker` / `podman` on `PATH`).
  pub binary: Option<PathBuf>,
  /// `--network` for every container.
  pub network: Option<String>,
  /// `--pull` policy: `always`, `missing` or `never`.
  pub pull: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
  /// Overrides the `kubectl` binary.
  pub binary: Option<PathBuf>,
  pub namespace: Option<String>,
  /// `--image-pull-policy` for task pods.
  pub image_pull_policy: Option<String>,
}

/// Runner selection and tuning, read from `runner.json`.
///
/// ```json
/// {
///   "docker_runner": "podman",
///   "podman": { "network": "tasks" },
///   "kubernetes": { "namespace": "floe" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
  pub docker_runner: DockerRunnerKind,
  pub docker: ContainerConfig,
  pub podman: ContainerConfig,
  pub kubernetes: KubernetesConfig,
}

impl RunnerConfig {
  /// `<config dir>/floe/runner.json`, when the platform has a config dir.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("floe").join("runner.json"))
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| RunnerError::Config {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&contents).map_err(|source| RunnerError::ConfigParse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load `path` if given, else the default file if it exists, else the
  /// built-in defaults.
  pub fn load(path: Option<&Path>) -> Result<Self, RunnerError> {
    match path {
      Some(path) => Self::from_file(path),
      None => match Self::default_path() {
        Some(path) if path.is_file() => Self::from_file(path),
        _ => Ok(Self::default()),
      },
    }
  }
}
