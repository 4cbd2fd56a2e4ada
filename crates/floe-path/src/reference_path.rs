use std::fmt;

use serde_json::{Map, Value};

use crate::error::PathError;
use crate::path::Path;
use crate::query::{Selector, resolve_index};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
  Key(String),
  Index(i64),
}

/// A path that identifies exactly one node, so that it can be written to.
///
/// Only plain member and index steps are allowed: no wildcards, filters,
/// unions, slices, recursive descent or context (`$$`) references.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePath {
  path: Path,
  segments: Vec<Segment>,
}

impl ReferencePath {
  pub fn new(expression: &str) -> Result<Self, PathError> {
    if let Some(c) = expression.chars().find(|c| matches!(c, '@' | ',' | ':' | '?')) {
      return Err(PathError::invalid_reference(
        expression,
        format!("'{c}' is not allowed"),
      ));
    }
    if expression.starts_with("$$") {
      return Err(PathError::invalid_reference(
        expression,
        "context paths are read-only",
      ));
    }

    let path = Path::new(expression).map_err(|e| match e {
      PathError::InvalidPath { message, .. } => PathError::invalid_reference(expression, message),
      other => other,
    })?;

    let segments = path
      .steps()
      .iter()
      .map(|step| match (&step.selector, step.descendant) {
        (_, true) => Err(PathError::invalid_reference(
          expression,
          "recursive descent is not allowed",
        )),
        (Selector::Name(name), false) => Ok(Segment::Key(name.clone())),
        (Selector::Index(index), false) => Ok(Segment::Index(*index)),
        (Selector::Wildcard, false) => Err(PathError::invalid_reference(
          expression,
          "wildcards are not allowed",
        )),
        _ => Err(PathError::invalid_reference(
          expression,
          "only member and index steps are allowed",
        )),
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { path, segments })
  }

  pub fn expression(&self) -> &str {
    self.path.expression()
  }

  /// Read the single node this path identifies.
  pub fn value(&self, input: &Value) -> Option<Value> {
    self.path.value(&Value::Null, input)
  }

  /// Return a copy of `target` with `value` written at this path.
  ///
  /// At the root (`$`) two objects are merged shallowly, with `value`
  /// winning on conflicts; any other combination replaces `target`.
  /// Missing intermediate containers are created. Walking into a scalar,
  /// or indexing into an object, fails with
  /// [`PathError::ResultPathMatchFailure`].
  pub fn set(&self, target: &Value, value: Value) -> Result<Value, PathError> {
    let Some((last, parents)) = self.segments.split_last() else {
      return Ok(match (target, value) {
        (Value::Object(base), Value::Object(update)) => {
          let mut merged = base.clone();
          merged.extend(update);
          Value::Object(merged)
        }
        (_, value) => value,
      });
    };

    let mut result = target.clone();
    let mut node = &mut result;
    for (depth, segment) in parents.iter().enumerate() {
      let next = &self.segments[depth + 1];
      node = self.child_mut(node, segment, || empty_container(next))?;
    }

    let slot = self.child_mut(node, last, || Value::Null)?;
    *slot = value;
    Ok(result)
  }

  /// Step into `segment` of `node`, creating the child with `create` when it
  /// is missing or null.
  fn child_mut<'a>(
    &self,
    node: &'a mut Value,
    segment: &Segment,
    create: impl FnOnce() -> Value,
  ) -> Result<&'a mut Value, PathError> {
    if node.is_null() {
      *node = empty_container(segment);
    }

    match (node, segment) {
      (Value::Object(map), Segment::Key(key)) => {
        let child = map.entry(key.clone()).or_insert(Value::Null);
        if child.is_null() {
          *child = create();
        }
        Ok(child)
      }
      (Value::Array(items), Segment::Index(index)) => {
        // Writing one past the end appends; anything further is a mismatch.
        let position = match resolve_index(items.len(), *index) {
          Some(position) => position,
          None if usize::try_from(*index).ok() == Some(items.len()) => {
            items.push(Value::Null);
            items.len() - 1
          }
          None => return Err(self.mismatch(format!("index {index} is out of bounds"))),
        };
        let child = &mut items[position];
        if child.is_null() {
          *child = create();
        }
        Ok(child)
      }
      (node, Segment::Key(key)) => Err(self.mismatch(format!(
        "cannot set field '{key}' on {}",
        type_name(node)
      ))),
      (node, Segment::Index(index)) => Err(self.mismatch(format!(
        "cannot set index {index} on {}",
        type_name(node)
      ))),
    }
  }

  fn mismatch(&self, message: String) -> PathError {
    PathError::ResultPathMatchFailure {
      expression: self.expression().to_string(),
      message,
    }
  }
}

impl fmt::Display for ReferencePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.expression())
  }
}

fn empty_container(segment: &Segment) -> Value {
  match segment {
    Segment::Key(_) => Value::Object(Map::new()),
    Segment::Index(_) => Value::Array(Vec::new()),
  }
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn set(expr: &str, target: Value, value: Value) -> Result<Value, PathError> {
    ReferencePath::new(expr).unwrap().set(&target, value)
  }

  #[test]
  fn test_rejects_non_reference_syntax() {
    for expr in [
      "$.a[?(@.b)]",
      "$['a','b']",
      "$.a[1:2]",
      "$$.Execution.Id",
      "$..a",
      "$.a.*",
      "$.a[*]",
    ] {
      assert!(
        matches!(
          ReferencePath::new(expr),
          Err(PathError::InvalidReferencePath { .. })
        ),
        "expected '{expr}' to be rejected"
      );
    }
  }

  #[test]
  fn test_root_merges_objects() {
    assert_eq!(
      set("$", json!({"a": 1, "b": 1}), json!({"b": 2, "c": 3})).unwrap(),
      json!({"a": 1, "b": 2, "c": 3})
    );
  }

  #[test]
  fn test_root_replaces_non_objects() {
    assert_eq!(set("$", json!({"a": 1}), json!(5)).unwrap(), json!(5));
    assert_eq!(set("$", json!([1]), json!({"a": 1})).unwrap(), json!({"a": 1}));
  }

  #[test]
  fn test_nested_set_creates_containers() {
    assert_eq!(
      set("$.a.b", json!({}), json!(1)).unwrap(),
      json!({"a": {"b": 1}})
    );
    assert_eq!(
      set("$.list[0].name", json!({"keep": true}), json!("x")).unwrap(),
      json!({"keep": true, "list": [{"name": "x"}]})
    );
    assert_eq!(
      set("$.list[2]", json!({"list": [1, 2]}), json!(3)).unwrap(),
      json!({"list": [1, 2, 3]})
    );
  }

  #[test]
  fn test_set_past_end_of_array_fails() {
    for expr in ["$.a[2]", "$.a[10000000000]", "$.a[9223372036854775807]"] {
      assert!(
        matches!(
          set(expr, json!({"a": [1]}), json!(1)),
          Err(PathError::ResultPathMatchFailure { .. })
        ),
        "expected '{expr}' to fail"
      );
    }
    assert!(matches!(
      set("$.a[9223372036854775807]", json!({}), json!(1)),
      Err(PathError::ResultPathMatchFailure { .. })
    ));
  }

  #[test]
  fn test_set_replaces_existing_value() {
    assert_eq!(
      set("$.a.b", json!({"a": {"b": 1, "c": 2}}), json!([1])).unwrap(),
      json!({"a": {"b": [1], "c": 2}})
    );
    assert_eq!(
      set("$.items[-1]", json!({"items": [1, 2]}), json!(9)).unwrap(),
      json!({"items": [1, 9]})
    );
  }

  #[test]
  fn test_set_through_scalar_fails() {
    assert!(matches!(
      set("$.a.b", json!({"a": 5}), json!(1)),
      Err(PathError::ResultPathMatchFailure { .. })
    ));
    assert!(matches!(
      set("$.a[0]", json!({"a": {}}), json!(1)),
      Err(PathError::ResultPathMatchFailure { .. })
    ));
  }

  #[test]
  fn test_set_then_read() {
    let path = ReferencePath::new("$.a.b").unwrap();
    let updated = path.set(&json!({}), json!({"deep": true})).unwrap();
    assert_eq!(path.value(&updated), Some(json!({"deep": true})));
  }
}
