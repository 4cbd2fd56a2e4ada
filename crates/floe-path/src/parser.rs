//! Nom parser for the JSONPath subset.

use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, opt, recognize, value};
use nom::error::{Error, ErrorKind};
use nom::multi::{many0, separated_list1};
use nom::number::complete::recognize_float;
use nom::sequence::{delimited, pair, preceded, tuple};
use serde_json::Value;

use crate::query::{CompareOp, FilterExpr, Operand, Selector, Step, UnionItem};

/// Parse a `$`-rooted query into its steps.
///
/// Returns a human readable message on failure; callers attach the
/// expression to it.
pub(crate) fn parse_query(input: &str) -> Result<Vec<Step>, String> {
  match all_consuming(preceded(char('$'), many0(step)))(input) {
    Ok((_, steps)) => Ok(steps),
    Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) if e.input.is_empty() => {
      Err("unexpected end of expression".to_string())
    }
    Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
      Err(format!("unexpected input at '{}'", e.input))
    }
    Err(nom::Err::Incomplete(_)) => Err("incomplete expression".to_string()),
  }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
  F: FnMut(&'a str) -> IResult<&'a str, O>,
{
  delimited(multispace0, inner, multispace0)
}

fn step(input: &str) -> IResult<&str, Step> {
  alt((descendant_step, child_step, map(bracket, Step::child)))(input)
}

/// `..name`, `..*` or `..[...]`
fn descendant_step(input: &str) -> IResult<&str, Step> {
  map(
    preceded(tag(".."), alt((wildcard, name_selector, bracket))),
    Step::descendant,
  )(input)
}

/// `.name` or `.*`
fn child_step(input: &str) -> IResult<&str, Step> {
  map(preceded(char('.'), alt((wildcard, name_selector))), Step::child)(input)
}

fn wildcard(input: &str) -> IResult<&str, Selector> {
  value(Selector::Wildcard, char('*'))(input)
}

fn is_name_char(c: char) -> bool {
  !c.is_whitespace()
    && !matches!(
      c,
      '.' | '[' | ']' | '(' | ')' | ',' | '=' | '!' | '<' | '>' | '&' | '|' | '\'' | '"' | '?'
        | '@' | '*' | ':' | '$'
    )
}

fn name_selector(input: &str) -> IResult<&str, Selector> {
  map(take_while1(is_name_char), |name: &str| {
    Selector::Name(name.to_string())
  })(input)
}

fn bracket(input: &str) -> IResult<&str, Selector> {
  delimited(
    pair(char('['), multispace0),
    alt((filter_selector, wildcard, slice_selector, union_selector)),
    pair(multispace0, char(']')),
  )(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
  map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
    s.parse::<i64>()
  })(input)
}

/// A single or double quoted string with backslash escapes.
fn quoted(input: &str) -> IResult<&str, String> {
  let mut chars = input.char_indices();
  let quote = match chars.next() {
    Some((_, q @ ('\'' | '"'))) => q,
    _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
  };

  let mut out = String::new();
  let mut escaped = false;
  for (i, c) in chars {
    if escaped {
      out.push(match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
      });
      escaped = false;
    } else if c == '\\' {
      escaped = true;
    } else if c == quote {
      return Ok((&input[i + c.len_utf8()..], out));
    } else {
      out.push(c);
    }
  }

  Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

/// `[start:end:step]` with every part optional.
fn slice_selector(input: &str) -> IResult<&str, Selector> {
  map(
    tuple((
      opt(ws(integer)),
      preceded(char(':'), opt(ws(integer))),
      opt(preceded(char(':'), opt(ws(integer)))),
    )),
    |(start, end, step)| Selector::Slice {
      start,
      end,
      step: step.flatten(),
    },
  )(input)
}

/// `['a']`, `[0]`, `['a', 'b']`, `[0, 2]`
fn union_selector(input: &str) -> IResult<&str, Selector> {
  map(
    separated_list1(ws(char(',')), union_item),
    |mut items: Vec<UnionItem>| {
      if items.len() == 1 {
        Selector::from(items.remove(0))
      } else {
        Selector::Union(items)
      }
    },
  )(input)
}

fn union_item(input: &str) -> IResult<&str, UnionItem> {
  alt((map(quoted, UnionItem::Name), map(integer, UnionItem::Index)))(input)
}

/// `?(<expression>)`
fn filter_selector(input: &str) -> IResult<&str, Selector> {
  map(
    delimited(
      tuple((char('?'), multispace0, char('('))),
      ws(filter_or),
      char(')'),
    ),
    Selector::Filter,
  )(input)
}

fn filter_or(input: &str) -> IResult<&str, FilterExpr> {
  let (input, first) = filter_and(input)?;
  let (input, rest) = many0(preceded(ws(tag("||")), filter_and))(input)?;
  let expr = rest.into_iter().fold(first, |acc, expr| {
    FilterExpr::Or(Box::new(acc), Box::new(expr))
  });
  Ok((input, expr))
}

fn filter_and(input: &str) -> IResult<&str, FilterExpr> {
  let (input, first) = filter_unary(input)?;
  let (input, rest) = many0(preceded(ws(tag("&&")), filter_unary))(input)?;
  let expr = rest.into_iter().fold(first, |acc, expr| {
    FilterExpr::And(Box::new(acc), Box::new(expr))
  });
  Ok((input, expr))
}

fn filter_unary(input: &str) -> IResult<&str, FilterExpr> {
  alt((
    map(preceded(ws(char('!')), filter_unary), |expr| {
      FilterExpr::Not(Box::new(expr))
    }),
    delimited(ws(char('(')), filter_or, ws(char(')'))),
    filter_comparison,
  ))(input)
}

fn filter_comparison(input: &str) -> IResult<&str, FilterExpr> {
  let (input, lhs) = ws(operand)(input)?;
  let (input, rhs) = opt(pair(ws(compare_op), ws(operand)))(input)?;
  let expr = match rhs {
    Some((op, rhs)) => FilterExpr::Compare(lhs, op, rhs),
    None => FilterExpr::Exists(lhs),
  };
  Ok((input, expr))
}

fn compare_op(input: &str) -> IResult<&str, CompareOp> {
  alt((
    value(CompareOp::Eq, tag("==")),
    value(CompareOp::Ne, tag("!=")),
    value(CompareOp::Le, tag("<=")),
    value(CompareOp::Ge, tag(">=")),
    value(CompareOp::Lt, tag("<")),
    value(CompareOp::Gt, tag(">")),
  ))(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
  alt((
    map(preceded(char('@'), many0(step)), Operand::Current),
    map(preceded(char('$'), many0(step)), Operand::Root),
    map(literal, Operand::Literal),
  ))(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
  alt((
    map(quoted, Value::String),
    value(Value::Bool(true), tag("true")),
    value(Value::Bool(false), tag("false")),
    value(Value::Null, tag("null")),
    map_res(recognize_float, |s: &str| {
      serde_json::from_str::<serde_json::Number>(s).map(Value::Number)
    }),
  ))(input)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn name(n: &str) -> Step {
    Step::child(Selector::Name(n.to_string()))
  }

  #[test]
  fn test_parse_root() {
    assert_eq!(parse_query("$").unwrap(), vec![]);
  }

  #[test]
  fn test_parse_dot_and_bracket_members() {
    assert_eq!(
      parse_query("$.store['book'].title").unwrap(),
      vec![name("store"), name("book"), name("title")]
    );
  }

  #[test]
  fn test_parse_index_wildcard_and_descendant() {
    assert_eq!(
      parse_query("$.items[-1]..price[*]").unwrap(),
      vec![
        name("items"),
        Step::child(Selector::Index(-1)),
        Step::descendant(Selector::Name("price".to_string())),
        Step::child(Selector::Wildcard),
      ]
    );
  }

  #[test]
  fn test_parse_union_and_slice() {
    assert_eq!(
      parse_query("$['a', 'b'][1:3]").unwrap(),
      vec![
        Step::child(Selector::Union(vec![
          UnionItem::Name("a".to_string()),
          UnionItem::Name("b".to_string()),
        ])),
        Step::child(Selector::Slice {
          start: Some(1),
          end: Some(3),
          step: None,
        }),
      ]
    );
    assert_eq!(
      parse_query("$[::2]").unwrap(),
      vec![Step::child(Selector::Slice {
        start: None,
        end: None,
        step: Some(2),
      })]
    );
  }

  #[test]
  fn test_parse_filter() {
    let steps = parse_query("$.books[?(@.price < 10 && !@.sold)]").unwrap();
    let Selector::Filter(expr) = &steps[1].selector else {
      panic!("expected filter, got {:?}", steps[1]);
    };
    assert_eq!(
      expr,
      &FilterExpr::And(
        Box::new(FilterExpr::Compare(
          Operand::Current(vec![name("price")]),
          CompareOp::Lt,
          Operand::Literal(json!(10)),
        )),
        Box::new(FilterExpr::Not(Box::new(FilterExpr::Exists(
          Operand::Current(vec![name("sold")])
        )))),
      )
    );
  }

  #[test]
  fn test_parse_quoted_escapes() {
    assert_eq!(
      parse_query(r#"$["it's"]['a\'b']"#).unwrap(),
      vec![name("it's"), name("a'b")]
    );
  }

  #[test]
  fn test_parse_errors() {
    assert!(parse_query("").is_err());
    assert!(parse_query("a.b").is_err());
    assert!(parse_query("$.").is_err());
    assert!(parse_query("$[").is_err());
    assert!(parse_query("$.a[?(@.b ==)]").is_err());
  }
}
