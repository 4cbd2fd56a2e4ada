use chrono::{DateTime, FixedOffset};
use floe_config::{
  ChoiceDef, FailDef, MapDef, ParallelDef, PassDef, StateDef, SucceedDef, TaskDef, WaitDef,
};
use floe_path::{Path, PayloadTemplate, ReferencePath};
use serde_json::{Map, Value};

use crate::choice::Choice;
use crate::error::WorkflowError;
use crate::retry::{Catcher, Retrier};
use crate::workflow::Workflow;

/// Where a state goes once it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  Next(String),
  End,
}

impl Transition {
  fn build(next: &Option<String>, end: bool) -> Result<Self, WorkflowError> {
    match (next, end) {
      (Some(next), false) => Ok(Transition::Next(next.clone())),
      (None, true) => Ok(Transition::End),
      _ => Err(WorkflowError::InvalidTransition),
    }
  }

  pub fn next(&self) -> Option<&str> {
    match self {
      Transition::Next(next) => Some(next),
      Transition::End => None,
    }
  }
}

/// An `InputPath` or `OutputPath`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFilter(Option<Path>);

impl PathFilter {
  /// Absent fields default to `$`; an explicit `null` keeps nothing.
  fn build(field: &Option<Option<String>>) -> Result<Self, WorkflowError> {
    Ok(match field {
      None => PathFilter(Some(Path::new("$")?)),
      Some(None) => PathFilter(None),
      Some(Some(path)) => PathFilter(Some(Path::new(path)?)),
    })
  }

  /// A null filter yields `{}`; a path that matches nothing yields `null`.
  pub fn apply(&self, context: &Value, value: &Value) -> Value {
    match &self.0 {
      Some(path) => path.value(context, value).unwrap_or(Value::Null),
      None => Value::Object(Map::new()),
    }
  }
}

fn result_path(field: &Option<Option<String>>) -> Result<Option<ReferencePath>, WorkflowError> {
  Ok(match field {
    None => Some(ReferencePath::new("$")?),
    Some(None) => None,
    Some(Some(path)) => Some(ReferencePath::new(path)?),
  })
}

fn template(field: &Option<Value>) -> Result<Option<PayloadTemplate>, WorkflowError> {
  Ok(field.as_ref().map(PayloadTemplate::new).transpose()?)
}

fn retriers(defs: &[floe_config::RetrierDef]) -> Result<Vec<Retrier>, WorkflowError> {
  defs.iter().map(Retrier::new).collect()
}

fn catchers(defs: &[floe_config::CatcherDef]) -> Result<Vec<Catcher>, WorkflowError> {
  defs.iter().map(Catcher::new).collect()
}

#[derive(Debug, Clone)]
pub struct PassState {
  pub name: String,
  pub comment: Option<String>,
  pub transition: Transition,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
  /// `None` discards the result.
  pub result_path: Option<ReferencePath>,
  pub parameters: Option<PayloadTemplate>,
  pub result: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct TaskState {
  pub name: String,
  pub comment: Option<String>,
  pub transition: Transition,
  pub resource: String,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
  pub result_path: Option<ReferencePath>,
  pub parameters: Option<PayloadTemplate>,
  pub result_selector: Option<PayloadTemplate>,
  pub retry: Vec<Retrier>,
  pub catch: Vec<Catcher>,
  pub timeout_seconds: Option<u64>,
  pub heartbeat_seconds: Option<u64>,
  /// Rendered against the credentials map, never the state input.
  pub credentials: Option<PayloadTemplate>,
}

#[derive(Debug, Clone)]
pub struct ChoiceState {
  pub name: String,
  pub comment: Option<String>,
  /// Evaluated in order; the first rule that holds wins.
  pub choices: Vec<Choice>,
  pub default: Option<String>,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
}

#[derive(Debug, Clone)]
pub enum WaitDuration {
  Seconds(u64),
  SecondsPath(Path),
  Timestamp(DateTime<FixedOffset>),
  TimestampPath(Path),
}

#[derive(Debug, Clone)]
pub struct WaitState {
  pub name: String,
  pub comment: Option<String>,
  pub transition: Transition,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
  pub duration: WaitDuration,
}

#[derive(Debug, Clone)]
pub struct SucceedState {
  pub name: String,
  pub comment: Option<String>,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
}

#[derive(Debug, Clone)]
pub struct FailState {
  pub name: String,
  pub comment: Option<String>,
  pub error: Option<String>,
  pub cause: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MapState {
  pub name: String,
  pub comment: Option<String>,
  pub transition: Transition,
  pub iterator: Workflow,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
  pub result_path: Option<ReferencePath>,
  pub items_path: Path,
  pub item_selector: Option<PayloadTemplate>,
  pub result_selector: Option<PayloadTemplate>,
  /// Zero runs every item at once.
  pub max_concurrency: usize,
  pub retry: Vec<Retrier>,
  pub catch: Vec<Catcher>,
}

#[derive(Debug, Clone)]
pub struct ParallelState {
  pub name: String,
  pub comment: Option<String>,
  pub transition: Transition,
  pub branches: Vec<Workflow>,
  pub input_path: PathFilter,
  pub output_path: PathFilter,
  pub result_path: Option<ReferencePath>,
  pub result_selector: Option<PayloadTemplate>,
  pub retry: Vec<Retrier>,
  pub catch: Vec<Catcher>,
}

/// A validated state, one variant per `Type`.
#[derive(Debug, Clone)]
pub enum State {
  Pass(PassState),
  Task(TaskState),
  Choice(ChoiceState),
  Wait(WaitState),
  Succeed(SucceedState),
  Fail(FailState),
  Map(MapState),
  Parallel(ParallelState),
}

impl State {
  pub(crate) fn build(name: &str, def: &StateDef) -> Result<Self, WorkflowError> {
    let name = name.to_string();
    let state = match def {
      StateDef::Pass(def) => State::Pass(build_pass(name, def)?),
      StateDef::Task(def) => State::Task(build_task(name, def)?),
      StateDef::Choice(def) => State::Choice(build_choice(name, def)?),
      StateDef::Wait(def) => State::Wait(build_wait(name, def)?),
      StateDef::Succeed(def) => State::Succeed(build_succeed(name, def)?),
      StateDef::Fail(def) => State::Fail(build_fail(name, def)),
      StateDef::Map(def) => State::Map(build_map(name, def)?),
      StateDef::Parallel(def) => State::Parallel(build_parallel(name, def)?),
    };
    Ok(state)
  }

  pub fn name(&self) -> &str {
    match self {
      State::Pass(s) => &s.name,
      State::Task(s) => &s.name,
      State::Choice(s) => &s.name,
      State::Wait(s) => &s.name,
      State::Succeed(s) => &s.name,
      State::Fail(s) => &s.name,
      State::Map(s) => &s.name,
      State::Parallel(s) => &s.name,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      State::Pass(_) => "Pass",
      State::Task(_) => "Task",
      State::Choice(_) => "Choice",
      State::Wait(_) => "Wait",
      State::Succeed(_) => "Succeed",
      State::Fail(_) => "Fail",
      State::Map(_) => "Map",
      State::Parallel(_) => "Parallel",
    }
  }

  pub fn comment(&self) -> Option<&str> {
    match self {
      State::Pass(s) => s.comment.as_deref(),
      State::Task(s) => s.comment.as_deref(),
      State::Choice(s) => s.comment.as_deref(),
      State::Wait(s) => s.comment.as_deref(),
      State::Succeed(s) => s.comment.as_deref(),
      State::Fail(s) => s.comment.as_deref(),
      State::Map(s) => s.comment.as_deref(),
      State::Parallel(s) => s.comment.as_deref(),
    }
  }

  /// The declared transition. Choice, Succeed and Fail have none.
  pub fn transition(&self) -> Option<&Transition> {
    match self {
      State::Pass(s) => Some(&s.transition),
      State::Task(s) => Some(&s.transition),
      State::Wait(s) => Some(&s.transition),
      State::Map(s) => Some(&s.transition),
      State::Parallel(s) => Some(&s.transition),
      State::Choice(_) | State::Succeed(_) | State::Fail(_) => None,
    }
  }

  /// Whether the run stops after this state.
  pub fn is_end(&self) -> bool {
    match self {
      State::Succeed(_) | State::Fail(_) => true,
      State::Choice(_) => false,
      _ => self.transition() == Some(&Transition::End),
    }
  }

  /// Every state name this state can hand control to.
  pub(crate) fn targets(&self) -> Vec<&str> {
    let mut targets: Vec<&str> = self.transition().and_then(Transition::next).into_iter().collect();
    match self {
      State::Choice(s) => {
        targets.extend(s.choices.iter().map(|choice| choice.next.as_str()));
        targets.extend(s.default.as_deref());
      }
      State::Task(s) => targets.extend(s.catch.iter().map(|c| c.next.as_str())),
      State::Map(s) => targets.extend(s.catch.iter().map(|c| c.next.as_str())),
      State::Parallel(s) => targets.extend(s.catch.iter().map(|c| c.next.as_str())),
      _ => {}
    }
    targets
  }
}

fn build_pass(name: String, def: &PassDef) -> Result<PassState, WorkflowError> {
  Ok(PassState {
    name,
    comment: def.comment.clone(),
    transition: Transition::build(&def.next, def.end)?,
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
    result_path: result_path(&def.result_path)?,
    parameters: template(&def.parameters)?,
    result: def.result.clone(),
  })
}

fn build_task(name: String, def: &TaskDef) -> Result<TaskState, WorkflowError> {
  if def.resource.is_empty() {
    return Err(WorkflowError::InvalidDefinition(
      "Task Resource must not be empty".into(),
    ));
  }

  Ok(TaskState {
    name,
    comment: def.comment.clone(),
    transition: Transition::build(&def.next, def.end)?,
    resource: def.resource.clone(),
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
    result_path: result_path(&def.result_path)?,
    parameters: template(&def.parameters)?,
    result_selector: template(&def.result_selector)?,
    retry: retriers(&def.retry)?,
    catch: catchers(&def.catch)?,
    timeout_seconds: def.timeout_seconds,
    heartbeat_seconds: def.heartbeat_seconds,
    credentials: template(&def.credentials)?,
  })
}

fn build_choice(name: String, def: &ChoiceDef) -> Result<ChoiceState, WorkflowError> {
  if def.choices.is_empty() {
    return Err(WorkflowError::InvalidChoice(
      "Choices must not be empty".into(),
    ));
  }

  Ok(ChoiceState {
    name,
    comment: def.comment.clone(),
    choices: def.choices.iter().map(Choice::build).collect::<Result<_, _>>()?,
    default: def.default.clone(),
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
  })
}

fn build_wait(name: String, def: &WaitDef) -> Result<WaitState, WorkflowError> {
  let duration = match (
    def.seconds,
    &def.seconds_path,
    &def.timestamp,
    &def.timestamp_path,
  ) {
    (Some(seconds), None, None, None) => WaitDuration::Seconds(seconds),
    (None, Some(path), None, None) => WaitDuration::SecondsPath(Path::new(path)?),
    (None, None, Some(timestamp), None) => WaitDuration::Timestamp(
      DateTime::parse_from_rfc3339(timestamp).map_err(|e| {
        WorkflowError::InvalidDefinition(format!("invalid Timestamp '{timestamp}': {e}"))
      })?,
    ),
    (None, None, None, Some(path)) => WaitDuration::TimestampPath(Path::new(path)?),
    _ => {
      return Err(WorkflowError::InvalidDefinition(
        "Wait must set exactly one of Seconds, SecondsPath, Timestamp or TimestampPath".into(),
      ));
    }
  };

  Ok(WaitState {
    name,
    comment: def.comment.clone(),
    transition: Transition::build(&def.next, def.end)?,
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
    duration,
  })
}

fn build_succeed(name: String, def: &SucceedDef) -> Result<SucceedState, WorkflowError> {
  Ok(SucceedState {
    name,
    comment: def.comment.clone(),
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
  })
}

fn build_fail(name: String, def: &FailDef) -> FailState {
  FailState {
    name,
    comment: def.comment.clone(),
    error: def.error.clone(),
    cause: def.cause.clone(),
  }
}

fn build_map(name: String, def: &MapDef) -> Result<MapState, WorkflowError> {
  Ok(MapState {
    name,
    comment: def.comment.clone(),
    transition: Transition::build(&def.next, def.end)?,
    iterator: Workflow::new(&def.iterator)?,
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
    result_path: result_path(&def.result_path)?,
    items_path: Path::new(def.items_path.as_deref().unwrap_or("$"))?,
    item_selector: template(&def.item_selector)?,
    result_selector: template(&def.result_selector)?,
    max_concurrency: def.max_concurrency.unwrap_or(0) as usize,
    retry: retriers(&def.retry)?,
    catch: catchers(&def.catch)?,
  })
}

fn build_parallel(name: String, def: &ParallelDef) -> Result<ParallelState, WorkflowError> {
  if def.branches.is_empty() {
    return Err(WorkflowError::InvalidDefinition(
      "Parallel Branches must not be empty".into(),
    ));
  }

  Ok(ParallelState {
    name,
    comment: def.comment.clone(),
    transition: Transition::build(&def.next, def.end)?,
    branches: def.branches.iter().map(Workflow::new).collect::<Result<_, _>>()?,
    input_path: PathFilter::build(&def.input_path)?,
    output_path: PathFilter::build(&def.output_path)?,
    result_path: result_path(&def.result_path)?,
    result_selector: template(&def.result_selector)?,
    retry: retriers(&def.retry)?,
    catch: catchers(&def.catch)?,
  })
}
