use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use floe_runner::{DockerRunnerKind, RunnerConfig, RunnerRegistry};
use floe_runtime::{Status, WorkflowRuntime};
use floe_workflow::Workflow;

/// Floe - run Amazon States Language workflows with container tasks
#[derive(Parser, Debug)]
#[command(name = "floe")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the workflow definition (JSON)
  #[arg(value_name = "FILE", required_unless_present = "workflow")]
  workflow_file: Option<PathBuf>,

  /// Path to the workflow definition, as a flag
  #[arg(long, value_name = "FILE", conflicts_with = "workflow_file")]
  workflow: Option<PathBuf>,

  /// Workflow input as JSON (default: stdin when piped, else {})
  #[arg(long, value_name = "JSON")]
  input: Option<String>,

  /// Credentials as a JSON object
  #[arg(long, value_name = "JSON", conflicts_with = "credentials_file")]
  credentials: Option<String>,

  /// Path to a JSON file of credentials
  #[arg(long, value_name = "FILE")]
  credentials_file: Option<PathBuf>,

  /// Backend for docker:// resources: docker, podman or kubernetes
  #[arg(long, value_name = "NAME")]
  docker_runner: Option<DockerRunnerKind>,

  /// Path to the runner configuration (default: <config dir>/floe/runner.json)
  #[arg(long, value_name = "FILE")]
  runner_config: Option<PathBuf>,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run(cli).await })
}

async fn run(cli: Cli) -> Result<()> {
  let workflow_file = cli
    .workflow
    .or(cli.workflow_file)
    .context("no workflow file given")?;

  let workflow = Workflow::from_file(&workflow_file)
    .with_context(|| format!("failed to load workflow: {}", workflow_file.display()))?;

  let input = match &cli.input {
    Some(input) => serde_json::from_str(input).context("failed to parse --input JSON")?,
    None => read_payload_from_stdin()?,
  };
  let credentials = read_credentials(cli.credentials.as_deref(), cli.credentials_file.as_deref())?;

  let mut config = RunnerConfig::load(cli.runner_config.as_deref())
    .context("failed to load runner configuration")?;
  if let Some(kind) = cli.docker_runner {
    config.docker_runner = kind;
  }
  info!(docker_runner = %config.docker_runner, "runner selected");

  let runtime = WorkflowRuntime::new(workflow, RunnerRegistry::from_config(&config))
    .with_credentials(credentials);
  let mut execution = runtime.execute(input);
  let output = execution.run().await.context("workflow execution failed")?;

  if execution.status() == Status::Errored {
    let failure = execution
      .error()
      .map(ToString::to_string)
      .unwrap_or_else(|| "workflow failed".to_string());
    bail!("workflow failed: {failure}");
  }

  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn read_credentials(inline: Option<&str>, file: Option<&Path>) -> Result<Value> {
  let credentials: Value = match (inline, file) {
    (Some(inline), _) => serde_json::from_str(inline).context("failed to parse --credentials JSON")?,
    (None, Some(path)) => {
      let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read credentials file: {}", path.display()))?;
      serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse credentials file: {}", path.display()))?
    }
    (None, None) => serde_json::json!({}),
  };

  if !credentials.is_object() {
    bail!("credentials must be a JSON object");
  }
  Ok(credentials)
}

fn read_payload_from_stdin() -> Result<Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    Ok(serde_json::json!({}))
  } else {
    let mut input = String::new();
    io::stdin()
      .read_to_string(&mut input)
      .context("failed to read input from stdin")?;

    if input.trim().is_empty() {
      Ok(serde_json::json!({}))
    } else {
      serde_json::from_str(&input).context("failed to parse input JSON from stdin")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;
  use std::io::Write;

  #[test]
  fn test_cli_definition() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_parse_workflow_positional_or_flag() {
    let cli = Cli::try_parse_from(["floe", "wf.json", "--docker-runner", "podman"]).unwrap();
    assert_eq!(cli.workflow_file, Some(PathBuf::from("wf.json")));
    assert_eq!(cli.docker_runner, Some(DockerRunnerKind::Podman));

    let cli = Cli::try_parse_from(["floe", "--workflow", "wf.json"]).unwrap();
    assert_eq!(cli.workflow, Some(PathBuf::from("wf.json")));

    assert!(Cli::try_parse_from(["floe"]).is_err());
    assert!(Cli::try_parse_from(["floe", "wf.json", "--docker-runner", "lxc"]).is_err());
  }

  #[test]
  fn test_read_credentials() {
    assert_eq!(read_credentials(None, None).unwrap(), serde_json::json!({}));
    assert_eq!(
      read_credentials(Some(r#"{"token": "t"}"#), None).unwrap(),
      serde_json::json!({"token": "t"})
    );
    assert!(read_credentials(Some("[1]"), None).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"api": "k"}}"#).unwrap();
    assert_eq!(
      read_credentials(None, Some(file.path())).unwrap(),
      serde_json::json!({"api": "k"})
    );
  }
}
