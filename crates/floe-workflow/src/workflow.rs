use std::collections::HashMap;
use std::path::Path;

use floe_config::WorkflowDef;

use crate::error::WorkflowError;
use crate::state::State;

/// A validated workflow, ready for execution.
///
/// Every transition names an existing state and every path, template and
/// choice rule has been compiled. Nested graphs (Map iterators, Parallel
/// branches) are validated the same way, in their own scope.
#[derive(Debug, Clone)]
pub struct Workflow {
  start_at: String,
  states: HashMap<String, State>,
  comment: Option<String>,
  timeout_seconds: Option<u64>,
}

impl Workflow {
  pub fn new(def: &WorkflowDef) -> Result<Self, WorkflowError> {
    if def.states.is_empty() {
      return Err(WorkflowError::NoStates);
    }

    let states = def
      .states
      .iter()
      .map(|(name, state)| {
        State::build(name, state)
          .map(|state| (name.clone(), state))
          .map_err(|e| WorkflowError::in_state(name, e))
      })
      .collect::<Result<HashMap<_, _>, _>>()?;

    if !states.contains_key(&def.start_at) {
      return Err(WorkflowError::UnknownStartAt(def.start_at.clone()));
    }

    // BTreeMap order keeps the reported error deterministic.
    for name in def.states.keys() {
      for target in states[name].targets() {
        if !states.contains_key(target) {
          return Err(WorkflowError::UnknownState {
            state: name.clone(),
            target: target.to_string(),
          });
        }
      }
    }

    Ok(Self {
      start_at: def.start_at.clone(),
      states,
      comment: def.comment.clone(),
      timeout_seconds: def.timeout_seconds,
    })
  }

  /// Parse and validate a definition from JSON.
  pub fn from_json(json: &str) -> Result<Self, WorkflowError> {
    Self::new(&WorkflowDef::from_json(json)?)
  }

  /// Read, parse and validate a definition file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
    Self::new(&WorkflowDef::from_file(path)?)
  }

  pub fn start_at(&self) -> &str {
    &self.start_at
  }

  /// The state the run begins in.
  pub fn start_state(&self) -> &State {
    &self.states[&self.start_at]
  }

  pub fn state(&self, name: &str) -> Option<&State> {
    self.states.get(name)
  }

  pub fn states(&self) -> impl Iterator<Item = &State> {
    self.states.values()
  }

  pub fn comment(&self) -> Option<&str> {
    self.comment.as_deref()
  }

  /// Overall run timeout, if the definition sets one.
  pub fn timeout_seconds(&self) -> Option<u64> {
    self.timeout_seconds
  }
}
