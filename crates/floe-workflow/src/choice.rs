//! Choice rules: boolean combinators over data comparisons.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use floe_path::Path;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{EvaluationError, WorkflowError};

/// One entry of a Choice state's `Choices` list.
#[derive(Debug, Clone)]
pub struct Choice {
  pub rule: ChoiceRule,
  pub next: String,
}

impl Choice {
  pub fn build(rule: &Value) -> Result<Self, WorkflowError> {
    let next = rule
      .get("Next")
      .and_then(Value::as_str)
      .ok_or_else(|| WorkflowError::InvalidChoice("top-level choice rule must set Next".into()))?;

    Ok(Self {
      rule: ChoiceRule::build(rule)?,
      next: next.to_string(),
    })
  }
}

/// A node of the choice rule tree.
#[derive(Debug, Clone)]
pub enum ChoiceRule {
  And(Vec<ChoiceRule>),
  Or(Vec<ChoiceRule>),
  Not(Box<ChoiceRule>),
  Data(DataRule),
}

impl ChoiceRule {
  /// Build a rule from its JSON form. Objects carrying `And`, `Or` or `Not`
  /// become boolean nodes; anything else must be a data comparison.
  pub fn build(rule: &Value) -> Result<Self, WorkflowError> {
    let Value::Object(fields) = rule else {
      return Err(WorkflowError::InvalidChoice(format!(
        "expected an object, got {rule}"
      )));
    };

    if let Some(children) = fields.get("And") {
      return Ok(ChoiceRule::And(build_children("And", children)?));
    }
    if let Some(children) = fields.get("Or") {
      return Ok(ChoiceRule::Or(build_children("Or", children)?));
    }
    if let Some(child) = fields.get("Not") {
      return Ok(ChoiceRule::Not(Box::new(ChoiceRule::build(child)?)));
    }

    DataRule::build(fields).map(ChoiceRule::Data)
  }

  pub fn is_true(&self, context: &Value, input: &Value) -> Result<bool, EvaluationError> {
    match self {
      ChoiceRule::And(rules) => {
        for rule in rules {
          if !rule.is_true(context, input)? {
            return Ok(false);
          }
        }
        Ok(true)
      }
      ChoiceRule::Or(rules) => {
        for rule in rules {
          if rule.is_true(context, input)? {
            return Ok(true);
          }
        }
        Ok(false)
      }
      ChoiceRule::Not(rule) => Ok(!rule.is_true(context, input)?),
      ChoiceRule::Data(rule) => rule.is_true(context, input),
    }
  }
}

fn build_children(key: &str, rule: &Value) -> Result<Vec<ChoiceRule>, WorkflowError> {
  match rule {
    Value::Array(children) if !children.is_empty() => {
      children.iter().map(ChoiceRule::build).collect()
    }
    _ => Err(WorkflowError::InvalidChoice(format!(
      "{key} must be a non-empty list of rules"
    ))),
  }
}

/// A comparison of the value at `variable` against an operand.
#[derive(Debug, Clone)]
pub struct DataRule {
  pub variable: Path,
  pub test: Test,
}

#[derive(Debug, Clone)]
pub enum Test {
  IsNull(bool),
  IsPresent(bool),
  IsNumeric(bool),
  IsString(bool),
  IsBoolean(bool),
  IsTimestamp(bool),
  StringMatches(Regex),
  Compare {
    kind: Kind,
    comparator: Comparator,
    operand: Operand,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  String,
  Numeric,
  Boolean,
  Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
  Equals,
  LessThan,
  GreaterThan,
  LessThanEquals,
  GreaterThanEquals,
}

impl Comparator {
  fn holds(self, ordering: Ordering) -> bool {
    match self {
      Comparator::Equals => ordering == Ordering::Equal,
      Comparator::LessThan => ordering == Ordering::Less,
      Comparator::GreaterThan => ordering == Ordering::Greater,
      Comparator::LessThanEquals => ordering != Ordering::Greater,
      Comparator::GreaterThanEquals => ordering != Ordering::Less,
    }
  }
}

#[derive(Debug, Clone)]
pub enum Operand {
  Literal(Value),
  Path(Path),
}

const RESERVED_KEYS: [&str; 3] = ["Variable", "Next", "Comment"];

impl DataRule {
  fn build(fields: &Map<String, Value>) -> Result<Self, WorkflowError> {
    let variable = fields
      .get("Variable")
      .and_then(Value::as_str)
      .ok_or_else(|| WorkflowError::InvalidChoice("rule is missing Variable".into()))?;
    let variable = Path::new(variable)?;

    let mut operators = fields
      .iter()
      .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()));
    let (key, operand) = match (operators.next(), operators.next()) {
      (Some(operator), None) => operator,
      (None, _) => {
        return Err(WorkflowError::InvalidChoice(
          "rule has no comparison operator".into(),
        ));
      }
      (Some(_), Some(_)) => {
        return Err(WorkflowError::InvalidChoice(
          "rule has more than one comparison operator".into(),
        ));
      }
    };

    Ok(Self {
      variable,
      test: Test::build(key, operand)?,
    })
  }

  pub fn is_true(&self, context: &Value, input: &Value) -> Result<bool, EvaluationError> {
    let lhs = self.variable.value(context, input);
    // Only IsNull and IsPresent accept a missing variable.
    let required = || {
      lhs.as_ref().ok_or_else(|| EvaluationError::VariableNotFound {
        variable: self.variable.expression().to_string(),
      })
    };

    Ok(match &self.test {
      Test::IsNull(expected) => matches!(lhs, None | Some(Value::Null)) == *expected,
      Test::IsPresent(expected) => lhs.is_some() == *expected,
      Test::IsNumeric(expected) => required()?.is_number() == *expected,
      Test::IsString(expected) => required()?.is_string() == *expected,
      Test::IsBoolean(expected) => required()?.is_boolean() == *expected,
      Test::IsTimestamp(expected) => timestamp(required()?).is_some() == *expected,
      Test::StringMatches(pattern) => required()?.as_str().is_some_and(|s| pattern.is_match(s)),
      Test::Compare {
        kind,
        comparator,
        operand,
      } => {
        let lhs = required()?;
        let rhs = match operand {
          Operand::Literal(value) => value.clone(),
          Operand::Path(path) => {
            path
              .value(context, input)
              .ok_or_else(|| EvaluationError::OperandNotFound {
                path: path.expression().to_string(),
              })?
          }
        };
        compare(*kind, lhs, &rhs).is_some_and(|ordering| comparator.holds(ordering))
      }
    })
  }
}

impl Test {
  fn build(key: &str, operand: &Value) -> Result<Self, WorkflowError> {
    let predicate = |make: fn(bool) -> Test| {
      operand
        .as_bool()
        .map(make)
        .ok_or_else(|| WorkflowError::InvalidChoice(format!("{key} expects a boolean")))
    };

    match key {
      "IsNull" => return predicate(Test::IsNull),
      "IsPresent" => return predicate(Test::IsPresent),
      "IsNumeric" => return predicate(Test::IsNumeric),
      "IsString" => return predicate(Test::IsString),
      "IsBoolean" => return predicate(Test::IsBoolean),
      "IsTimestamp" => return predicate(Test::IsTimestamp),
      "StringMatches" => {
        let pattern = operand.as_str().ok_or_else(|| {
          WorkflowError::InvalidChoice("StringMatches expects a string".into())
        })?;
        return Ok(Test::StringMatches(glob(pattern)?));
      }
      _ => {}
    }

    let invalid = || WorkflowError::InvalidChoice(format!("unknown operator '{key}'"));

    let (name, is_path) = match key.strip_suffix("Path") {
      Some(name) => (name, true),
      None => (key, false),
    };
    let (kind, comparator) = [
      ("String", Kind::String),
      ("Numeric", Kind::Numeric),
      ("Boolean", Kind::Boolean),
      ("Timestamp", Kind::Timestamp),
    ]
    .into_iter()
    .find_map(|(prefix, kind)| Some((kind, name.strip_prefix(prefix)?)))
    .ok_or_else(invalid)?;

    let comparator = match comparator {
      "Equals" => Comparator::Equals,
      "LessThan" => Comparator::LessThan,
      "GreaterThan" => Comparator::GreaterThan,
      "LessThanEquals" => Comparator::LessThanEquals,
      "GreaterThanEquals" => Comparator::GreaterThanEquals,
      _ => return Err(invalid()),
    };
    if kind == Kind::Boolean && comparator != Comparator::Equals {
      return Err(invalid());
    }

    let operand = if is_path {
      let path = operand
        .as_str()
        .ok_or_else(|| WorkflowError::InvalidChoice(format!("{key} expects a path string")))?;
      Operand::Path(Path::new(path)?)
    } else {
      let valid = match kind {
        Kind::String => operand.is_string(),
        Kind::Numeric => operand.is_number(),
        Kind::Boolean => operand.is_boolean(),
        Kind::Timestamp => timestamp(operand).is_some(),
      };
      if !valid {
        return Err(WorkflowError::InvalidChoice(format!(
          "{key} has an operand of the wrong type: {operand}"
        )));
      }
      Operand::Literal(operand.clone())
    };

    Ok(Test::Compare {
      kind,
      comparator,
      operand,
    })
  }
}

/// Compare two values as `kind`. Values of another type never compare.
fn compare(kind: Kind, lhs: &Value, rhs: &Value) -> Option<Ordering> {
  match kind {
    Kind::String => Some(lhs.as_str()?.cmp(rhs.as_str()?)),
    Kind::Numeric => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
    Kind::Boolean => Some(lhs.as_bool()?.cmp(&rhs.as_bool()?)),
    Kind::Timestamp => Some(timestamp(lhs)?.cmp(&timestamp(rhs)?)),
  }
}

fn timestamp(value: &Value) -> Option<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc3339(value.as_str()?).ok()
}

/// Translate a `StringMatches` pattern into an anchored regex. `*` matches
/// any run of characters; `\*` and `\\` match a literal star and backslash.
fn glob(pattern: &str) -> Result<Regex, WorkflowError> {
  let mut regex = String::from("(?s)^");
  let mut chars = pattern.chars();
  while let Some(c) = chars.next() {
    match c {
      '*' => regex.push_str(".*"),
      '\\' => match chars.next() {
        Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
        None => regex.push_str(&regex::escape("\\")),
      },
      other => regex.push_str(&regex::escape(&other.to_string())),
    }
  }
  regex.push('$');

  Regex::new(&regex).map_err(|e| WorkflowError::InvalidChoice(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn eval(rule: Value, input: Value) -> Result<bool, EvaluationError> {
    ChoiceRule::build(&rule).unwrap().is_true(&json!({}), &input)
  }

  #[test]
  fn test_numeric_comparisons() {
    let rule = json!({"Variable": "$.n", "NumericGreaterThan": 5});
    assert!(eval(rule.clone(), json!({"n": 10})).unwrap());
    assert!(!eval(rule.clone(), json!({"n": 5})).unwrap());
    assert!(eval(json!({"Variable": "$.n", "NumericLessThanEquals": 5}), json!({"n": 5})).unwrap());
    assert!(eval(json!({"Variable": "$.n", "NumericEquals": 2}), json!({"n": 2.0})).unwrap());
  }

  #[test]
  fn test_string_and_boolean_comparisons() {
    assert!(eval(json!({"Variable": "$.s", "StringEquals": "a"}), json!({"s": "a"})).unwrap());
    assert!(eval(json!({"Variable": "$.s", "StringLessThan": "b"}), json!({"s": "a"})).unwrap());
    assert!(eval(json!({"Variable": "$.b", "BooleanEquals": false}), json!({"b": false})).unwrap());
  }

  #[test]
  fn test_mismatched_types_are_false() {
    assert!(!eval(json!({"Variable": "$.n", "NumericEquals": 1}), json!({"n": "1"})).unwrap());
    assert!(!eval(json!({"Variable": "$.s", "StringEquals": "1"}), json!({"s": 1})).unwrap());
  }

  #[test]
  fn test_timestamp_comparisons() {
    let rule = json!({"Variable": "$.t", "TimestampGreaterThan": "2020-01-01T00:00:00Z"});
    assert!(eval(rule.clone(), json!({"t": "2021-06-01T12:00:00+02:00"})).unwrap());
    assert!(!eval(rule, json!({"t": "2019-12-31T23:59:59Z"})).unwrap());
  }

  #[test]
  fn test_path_operands() {
    let rule = json!({"Variable": "$.a", "NumericLessThanPath": "$.b"});
    assert!(eval(rule.clone(), json!({"a": 1, "b": 2})).unwrap());
    assert_eq!(
      eval(rule, json!({"a": 1})),
      Err(EvaluationError::OperandNotFound {
        path: "$.b".to_string()
      })
    );
  }

  #[test]
  fn test_string_matches() {
    let rule = json!({"Variable": "$.f", "StringMatches": "*.txt"});
    assert!(eval(rule.clone(), json!({"f": "report.txt"})).unwrap());
    assert!(!eval(rule, json!({"f": "report.csv"})).unwrap());

    let literal = json!({"Variable": "$.f", "StringMatches": "a\\*b.c"});
    assert!(eval(literal.clone(), json!({"f": "a*b.c"})).unwrap());
    assert!(!eval(literal, json!({"f": "axxb.c"})).unwrap());
  }

  #[test]
  fn test_type_predicates() {
    let input = json!({"n": 1, "s": "x", "b": true, "t": "2024-02-29T10:00:00Z", "z": null});
    assert!(eval(json!({"Variable": "$.n", "IsNumeric": true}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.s", "IsString": true}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.b", "IsBoolean": true}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.t", "IsTimestamp": true}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.s", "IsTimestamp": false}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.z", "IsNull": true}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.missing", "IsNull": true}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.missing", "IsPresent": false}), input.clone()).unwrap());
    assert!(eval(json!({"Variable": "$.z", "IsPresent": true}), input).unwrap());
  }

  #[test]
  fn test_missing_variable_is_an_error() {
    assert_eq!(
      eval(json!({"Variable": "$.missing", "NumericEquals": 1}), json!({})),
      Err(EvaluationError::VariableNotFound {
        variable: "$.missing".to_string()
      })
    );
  }

  #[test]
  fn test_boolean_combinators() {
    let rule = json!({
      "And": [
        {"Variable": "$.n", "NumericGreaterThan": 0},
        {"Or": [
          {"Variable": "$.s", "StringEquals": "a"},
          {"Not": {"Variable": "$.s", "StringEquals": "b"}}
        ]}
      ]
    });
    assert!(eval(rule.clone(), json!({"n": 1, "s": "a"})).unwrap());
    assert!(eval(rule.clone(), json!({"n": 1, "s": "c"})).unwrap());
    assert!(!eval(rule.clone(), json!({"n": 1, "s": "b"})).unwrap());
    assert!(!eval(rule, json!({"n": 0, "s": "a"})).unwrap());
  }

  #[test]
  fn test_and_short_circuits_before_missing_variable() {
    let rule = json!({
      "And": [
        {"Variable": "$.a", "IsPresent": true},
        {"Variable": "$.a", "NumericEquals": 1}
      ]
    });
    assert!(!eval(rule, json!({})).unwrap());
  }

  #[test]
  fn test_invalid_rules() {
    for rule in [
      json!({"Variable": "$.a", "NumericSortOf": 1}),
      json!({"Variable": "$.a", "BooleanLessThan": true}),
      json!({"Variable": "$.a", "NumericEquals": "1"}),
      json!({"Variable": "$.a", "TimestampEquals": "yesterday"}),
      json!({"Variable": "$.a", "IsNull": "yes"}),
      json!({"Variable": "$.a"}),
      json!({"Variable": "$.a", "NumericEquals": 1, "StringEquals": "1"}),
      json!({"NumericEquals": 1}),
      json!({"And": []}),
    ] {
      assert!(
        matches!(ChoiceRule::build(&rule), Err(WorkflowError::InvalidChoice(_))),
        "expected {rule} to be rejected"
      );
    }
  }

  #[test]
  fn test_top_level_choice_requires_next() {
    assert!(Choice::build(&json!({"Variable": "$.a", "IsPresent": true})).is_err());
    let choice = Choice::build(&json!({"Variable": "$.a", "IsPresent": true, "Next": "B"})).unwrap();
    assert_eq!(choice.next, "B");
  }
}
