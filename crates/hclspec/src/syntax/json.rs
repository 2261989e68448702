//! JSON syntax
//!
//! The root must be an object. Its properties become raw [ItemKind::Json] items which are interpreted once a
//! schema asks for them (see [crate::body]). Strings are templates, so `"${var.name}"` interpolates just like in
//! the native syntax.
//!
//! `serde_json` does not track spans. Root properties get the range of their key, found by scanning the source.
//! Everything nested inside a root property reports the range of that root property's key.
use crate::body::{Body, Item, ItemKind};
use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use crate::util::SourceIndex;
use hcl::{Expression, ObjectKey, TemplateExpr};
use std::collections::HashMap;
use std::ops::Range;

pub fn parse(src: &str, filename: &str) -> (Body, Diagnostics) {
    let index = SourceIndex::new(filename, src);

    match serde_json::from_str::<serde_json::Value>(src) {
        Ok(serde_json::Value::Object(object)) => {
            let spans = root_key_spans(src);
            let items = object
                .iter()
                .map(|(name, value)| {
                    let range = spans.get(name).map(|span| index.range(span.clone()));
                    item(name, value, range)
                })
                .collect();

            (Body::new(items), Diagnostics::new())
        }
        Ok(_) => (
            Body::default(),
            Diagnostic::error(
                "Root value must be object",
                "The root value in a JSON-based configuration must be an object, containing attributes and blocks.",
            )
            .with_range(Some(index.range(0..src.len().min(1))))
            .into(),
        ),
        Err(err) => {
            let offset = index.offset(err.line(), err.column());
            let range = index.range(offset..(offset + 1).min(src.len()));

            tracing::debug!(%filename, %err, "syntax error");
            (
                Body::default(),
                Diagnostic::error("Invalid JSON syntax", err.to_string())
                    .with_range(Some(range))
                    .into(),
            )
        }
    }
}

/// Items of a nested object, all located at `range`
pub(crate) fn body_from_object(
    object: &serde_json::Map<String, serde_json::Value>,
    range: Option<&SourceRange>,
) -> Body {
    Body::new(
        object
            .iter()
            .map(|(name, value)| item(name, value, range.cloned()))
            .collect(),
    )
}

fn item(name: &str, value: &serde_json::Value, range: Option<SourceRange>) -> Item {
    Item {
        name: name.to_owned(),
        range,
        kind: ItemKind::Json(value.clone()),
    }
}

/// Byte spans (quotes included) of the root object's keys, first occurrence wins
///
/// Only called on sources `serde_json` accepted.
fn root_key_spans(src: &str) -> HashMap<String, Range<usize>> {
    let bytes = src.as_bytes();
    let mut spans = HashMap::new();
    let mut depth = 0usize;
    let mut expect_key = false;
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'{' => {
                depth += 1;
                expect_key = depth == 1;
            }
            b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            b',' if depth == 1 => expect_key = true,
            b'"' => {
                let start = index;
                index += 1;
                while index < bytes.len() && bytes[index] != b'"' {
                    if bytes[index] == b'\\' {
                        index += 1;
                    }
                    index += 1;
                }
                let end = (index + 1).min(bytes.len());

                if depth == 1 && expect_key {
                    if let Ok(key) = serde_json::from_str::<String>(&src[start..end]) {
                        spans.entry(key).or_insert(start..end);
                    }
                    expect_key = false;
                }
            }
            _ => {}
        }
        index += 1;
    }

    spans
}

/// Reads a JSON value as expression
pub(crate) fn expression(value: &serde_json::Value) -> Expression {
    use serde_json::Value;

    match value {
        Value::Null => Expression::Null,
        Value::Bool(b) => Expression::Bool(*b),
        Value::Number(number) => number_expression(number),
        Value::String(s) if is_template(s) => {
            Expression::TemplateExpr(Box::new(TemplateExpr::QuotedString(s.clone())))
        }
        Value::String(s) => Expression::String(s.clone()),
        Value::Array(array) => Expression::Array(array.iter().map(expression).collect()),
        Value::Object(object) => Expression::Object(
            object
                .iter()
                .map(|(key, value)| {
                    (
                        ObjectKey::Expression(Expression::String(key.clone())),
                        expression(value),
                    )
                })
                .collect(),
        ),
    }
}

fn number_expression(number: &serde_json::Number) -> Expression {
    if let Some(int) = number.as_i64() {
        return Expression::Number(hcl::Number::from(int));
    }

    if let Some(uint) = number.as_u64() {
        return Expression::Number(hcl::Number::from(uint));
    }

    number
        .as_f64()
        .and_then(hcl::Number::from_f64)
        .map(Expression::Number)
        .unwrap_or(Expression::Null)
}

fn is_template(s: &str) -> bool {
    s.contains("${") || s.contains("%{")
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn properties_become_items() {
        let (body, diagnostics) = parse(r#"{"one": 1, "two": {"three": 3}}"#, "main.json");

        assert!(diagnostics.is_empty());
        let names: Vec<_> = body.items().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn properties_are_located_at_their_key() {
        let (body, _diagnostics) = parse(
            "{\n  \"one\": {\"two\": 2},\n  \"t\\u0068ree\": [1, {\"four\": 4}]\n}",
            "main.json",
        );

        let positions: Vec<_> = body
            .items()
            .iter()
            .map(|item| {
                let range = item.range.as_ref().expect("root properties carry a range");
                (item.name.as_str(), range.line, range.column)
            })
            .collect();

        assert_eq!(positions, vec![("one", 2, 3), ("three", 3, 3)]);
    }

    #[test]
    fn root_must_be_object() {
        let (_body, diagnostics) = parse("[1, 2]", "main.json");

        assert_eq!(diagnostics.as_slice()[0].summary, "Root value must be object");
    }

    #[test]
    fn syntax_error_points_at_position() {
        let (_body, diagnostics) = parse("{\n  \"one\": ,\n}", "main.json");

        let range = diagnostics.as_slice()[0]
            .range
            .clone()
            .expect("syntax errors carry a range");
        assert_eq!(range.line, 2);
    }

    #[test]
    fn strings_with_interpolation_are_templates() {
        assert_eq!(
            expression(&serde_json::json!("plain")),
            Expression::String("plain".into())
        );
        assert!(matches!(
            expression(&serde_json::json!("${var.one}")),
            Expression::TemplateExpr(_)
        ));
    }
}
