use std::fmt;

use serde_json::Value;

use crate::error::PathError;
use crate::parser::parse_query;
use crate::query::{self, Step};

/// A compiled read path.
///
/// Paths starting with `$$` address the execution context; every other path
/// addresses the state input.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
  expression: String,
  context: bool,
  steps: Vec<Step>,
}

impl Path {
  pub fn new(expression: &str) -> Result<Self, PathError> {
    if !expression.starts_with('$') {
      return Err(PathError::invalid_path(expression, "must start with '$'"));
    }

    let context = expression.starts_with("$$");
    let query = if context { &expression[1..] } else { expression };
    let steps = parse_query(query).map_err(|message| PathError::invalid_path(expression, message))?;

    Ok(Self {
      expression: expression.to_string(),
      context,
      steps,
    })
  }

  /// The source expression.
  pub fn expression(&self) -> &str {
    &self.expression
  }

  /// Whether this path reads the execution context rather than the input.
  pub fn is_context(&self) -> bool {
    self.context
  }

  pub(crate) fn steps(&self) -> &[Step] {
    &self.steps
  }

  /// Resolve the path.
  ///
  /// No match yields `None`, a single match yields that value, and several
  /// matches yield them as an array in document order.
  pub fn value(&self, context: &Value, input: &Value) -> Option<Value> {
    let root = if self.context { context } else { input };
    let mut matches = query::select(root, &self.steps);
    match matches.len() {
      0 => None,
      1 => matches.pop().cloned(),
      _ => Some(Value::Array(matches.into_iter().cloned().collect())),
    }
  }
}

impl fmt::Display for Path {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.expression)
  }
}
