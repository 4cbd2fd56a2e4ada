//! Query AST and evaluation over `serde_json::Value`.

use std::cmp::Ordering;

use serde_json::Value;

/// One step of a query: a selector applied to the current nodes, or to the
/// current nodes and all of their descendants.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
  pub descendant: bool,
  pub selector: Selector,
}

impl Step {
  pub fn child(selector: Selector) -> Self {
    Self {
      descendant: false,
      selector,
    }
  }

  pub fn descendant(selector: Selector) -> Self {
    Self {
      descendant: true,
      selector,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Selector {
  Name(String),
  Index(i64),
  Wildcard,
  Union(Vec<UnionItem>),
  Slice {
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
  },
  Filter(FilterExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UnionItem {
  Name(String),
  Index(i64),
}

impl From<UnionItem> for Selector {
  fn from(item: UnionItem) -> Self {
    match item {
      UnionItem::Name(name) => Selector::Name(name),
      UnionItem::Index(index) => Selector::Index(index),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FilterExpr {
  Or(Box<FilterExpr>, Box<FilterExpr>),
  And(Box<FilterExpr>, Box<FilterExpr>),
  Not(Box<FilterExpr>),
  Exists(Operand),
  Compare(Operand, CompareOp, Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
  /// `@...`, relative to the element being filtered.
  Current(Vec<Step>),
  /// `$...`, relative to the query root.
  Root(Vec<Step>),
  Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

/// Run `steps` against `root`, returning every match in document order.
pub(crate) fn select<'a>(root: &'a Value, steps: &[Step]) -> Vec<&'a Value> {
  let mut current = vec![root];

  for step in steps {
    let mut next = Vec::new();
    for node in current {
      if step.descendant {
        let mut nodes = Vec::new();
        collect_descendants(node, &mut nodes);
        for node in nodes {
          apply(&step.selector, node, root, &mut next);
        }
      } else {
        apply(&step.selector, node, root, &mut next);
      }
    }
    current = next;
  }

  current
}

fn collect_descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
  out.push(node);
  match node {
    Value::Array(items) => items.iter().for_each(|item| collect_descendants(item, out)),
    Value::Object(map) => map.values().for_each(|item| collect_descendants(item, out)),
    _ => {}
  }
}

fn children(node: &Value) -> Vec<&Value> {
  match node {
    Value::Array(items) => items.iter().collect(),
    Value::Object(map) => map.values().collect(),
    _ => Vec::new(),
  }
}

fn apply<'a>(selector: &Selector, node: &'a Value, root: &'a Value, out: &mut Vec<&'a Value>) {
  match selector {
    Selector::Name(name) => {
      if let Value::Object(map) = node
        && let Some(value) = map.get(name)
      {
        out.push(value);
      }
    }
    Selector::Index(index) => {
      if let Value::Array(items) = node
        && let Some(value) = resolve_index(items.len(), *index).and_then(|i| items.get(i))
      {
        out.push(value);
      }
    }
    Selector::Wildcard => out.extend(children(node)),
    Selector::Union(items) => {
      for item in items {
        apply(&Selector::from(item.clone()), node, root, out);
      }
    }
    Selector::Slice { start, end, step } => {
      if let Value::Array(items) = node {
        for i in slice_indices(items.len(), *start, *end, *step) {
          out.push(&items[i]);
        }
      }
    }
    Selector::Filter(expr) => {
      for child in children(node) {
        if expr.matches(child, root) {
          out.push(child);
        }
      }
    }
  }
}

/// Map a possibly negative index onto `0..len`.
pub(crate) fn resolve_index(len: usize, index: i64) -> Option<usize> {
  let len = len as i64;
  let resolved = if index < 0 { len + index } else { index };
  (0..len).contains(&resolved).then_some(resolved as usize)
}

fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Vec<usize> {
  let len = len as i64;
  let step = step.unwrap_or(1);
  let normalize = |i: i64| if i < 0 { i + len } else { i };
  let mut indices = Vec::new();

  if step > 0 {
    let mut i = start.map(normalize).unwrap_or(0).clamp(0, len);
    let end = end.map(normalize).unwrap_or(len).clamp(0, len);
    while i < end {
      indices.push(i as usize);
      let Some(next) = i.checked_add(step) else { break };
      i = next;
    }
  } else if step < 0 {
    let mut i = start.map(normalize).unwrap_or(len - 1).clamp(-1, len - 1);
    let end = end.map(normalize).unwrap_or(-1).clamp(-1, len - 1);
    while i > end {
      indices.push(i as usize);
      let Some(next) = i.checked_add(step) else { break };
      i = next;
    }
  }

  indices
}

impl FilterExpr {
  fn matches(&self, current: &Value, root: &Value) -> bool {
    match self {
      FilterExpr::Or(lhs, rhs) => lhs.matches(current, root) || rhs.matches(current, root),
      FilterExpr::And(lhs, rhs) => lhs.matches(current, root) && rhs.matches(current, root),
      FilterExpr::Not(expr) => !expr.matches(current, root),
      FilterExpr::Exists(operand) => match operand {
        Operand::Literal(value) => truthy(value),
        _ => operand.resolve(current, root).is_some(),
      },
      FilterExpr::Compare(lhs, op, rhs) => {
        let (Some(lhs), Some(rhs)) = (lhs.resolve(current, root), rhs.resolve(current, root))
        else {
          return false;
        };
        match op {
          CompareOp::Eq => loosely_equal(lhs, rhs),
          CompareOp::Ne => !loosely_equal(lhs, rhs),
          CompareOp::Lt => compare(lhs, rhs) == Some(Ordering::Less),
          CompareOp::Le => matches!(compare(lhs, rhs), Some(Ordering::Less | Ordering::Equal)),
          CompareOp::Gt => compare(lhs, rhs) == Some(Ordering::Greater),
          CompareOp::Ge => {
            matches!(compare(lhs, rhs), Some(Ordering::Greater | Ordering::Equal))
          }
        }
      }
    }
  }
}

impl Operand {
  fn resolve<'a>(&'a self, current: &'a Value, root: &'a Value) -> Option<&'a Value> {
    match self {
      Operand::Current(steps) => select(current, steps).into_iter().next(),
      Operand::Root(steps) => select(root, steps).into_iter().next(),
      Operand::Literal(value) => Some(value),
    }
  }
}

fn truthy(value: &Value) -> bool {
  !matches!(value, Value::Null | Value::Bool(false))
}

fn loosely_equal(lhs: &Value, rhs: &Value) -> bool {
  match (lhs, rhs) {
    (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
    _ => lhs == rhs,
  }
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
  match (lhs, rhs) {
    (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slice_indices_forward() {
    assert_eq!(slice_indices(5, Some(1), Some(3), None), vec![1, 2]);
    assert_eq!(slice_indices(5, None, None, Some(2)), vec![0, 2, 4]);
    assert_eq!(slice_indices(5, Some(-2), None, None), vec![3, 4]);
    assert_eq!(slice_indices(3, Some(0), Some(10), None), vec![0, 1, 2]);
  }

  #[test]
  fn test_slice_indices_backward() {
    assert_eq!(slice_indices(4, None, None, Some(-1)), vec![3, 2, 1, 0]);
    assert_eq!(slice_indices(4, Some(2), Some(0), Some(-1)), vec![2, 1]);
    assert!(slice_indices(0, None, None, Some(-1)).is_empty());
  }

  #[test]
  fn test_slice_indices_extreme_steps() {
    assert_eq!(slice_indices(3, Some(1), None, Some(i64::MAX)), vec![1]);
    assert_eq!(slice_indices(3, None, None, Some(i64::MIN)), vec![2]);
    assert_eq!(slice_indices(3, Some(-1), None, Some(i64::MIN + 1)), vec![2]);
  }

  #[test]
  fn test_zero_step_selects_nothing() {
    assert!(slice_indices(4, None, None, Some(0)).is_empty());
  }

  #[test]
  fn test_resolve_index() {
    assert_eq!(resolve_index(3, 0), Some(0));
    assert_eq!(resolve_index(3, -1), Some(2));
    assert_eq!(resolve_index(3, 3), None);
    assert_eq!(resolve_index(3, -4), None);
  }
}
