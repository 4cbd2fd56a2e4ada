use serde_json::{Map, Value};

use crate::error::PathError;
use crate::path::Path;

#[derive(Debug, Clone, PartialEq)]
enum Node {
  Literal(Value),
  Path(Path),
  Array(Vec<Node>),
  Object(Vec<(String, Node)>),
}

/// A compiled `Parameters` style document.
///
/// Object keys ending in `.$` take their value from the path they name, with
/// the suffix stripped from the output key. Bare strings that start with `$`
/// are resolved as paths too. Everything else is copied as is.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadTemplate {
  root: Node,
}

impl PayloadTemplate {
  pub fn new(template: &Value) -> Result<Self, PathError> {
    Ok(Self {
      root: compile(template)?,
    })
  }

  /// Render the template. Paths that match nothing render as `null`.
  pub fn value(&self, context: &Value, input: &Value) -> Value {
    render(&self.root, context, input)
  }
}

fn compile(value: &Value) -> Result<Node, PathError> {
  match value {
    Value::String(s) if s.starts_with('$') => Ok(Node::Path(Path::new(s)?)),
    Value::Array(items) => Ok(Node::Array(
      items.iter().map(compile).collect::<Result<_, _>>()?,
    )),
    Value::Object(map) => {
      let mut fields = Vec::with_capacity(map.len());
      for (key, value) in map {
        let field = match (key.strip_suffix(".$"), value) {
          (Some(name), Value::String(expression)) => {
            (name.to_string(), Node::Path(Path::new(expression)?))
          }
          (Some(_), _) => {
            return Err(PathError::InvalidTemplate {
              message: format!("value of '{key}' must be a path string"),
            });
          }
          (None, value) => (key.clone(), compile(value)?),
        };
        fields.push(field);
      }
      Ok(Node::Object(fields))
    }
    other => Ok(Node::Literal(other.clone())),
  }
}

fn render(node: &Node, context: &Value, input: &Value) -> Value {
  match node {
    Node::Literal(value) => value.clone(),
    Node::Path(path) => path.value(context, input).unwrap_or(Value::Null),
    Node::Array(items) => Value::Array(
      items
        .iter()
        .map(|item| render(item, context, input))
        .collect(),
    ),
    Node::Object(fields) => Value::Object(
      fields
        .iter()
        .map(|(key, node)| (key.clone(), render(node, context, input)))
        .collect::<Map<_, _>>(),
    ),
  }
}
