//! decoding bodies against grammars
//!
//! - [partial_decode]: consume what a grammar asks for, return the decoded value and the residual body
//! - [decode]: like [partial_decode] but leftover items are errors
//! - [decode_into]: evaluate a whole body and deserialize it into any [serde] type
//! - [variables]: list the traversals a grammar would evaluate, without evaluating anything
//!
//! None of these stop at the first problem. Whatever fails to decode becomes `null` (or is left out, for
//! [decode_into]) and is reported as a diagnostic.
use crate::body::{Body, BodyContent, ItemKind};
use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use crate::eval::{evaluate, EvalContext};
use crate::grammar::Grammar;
use crate::syntax::json;
use crate::value::Type;
use crate::visit::VisitTraversals;
use hcl::eval::Context;
use hcl::{Traversal, Value};
use indexmap::IndexMap;

type Map = hcl::value::Map<String, Value>;

/// Decodes the part of `body` described by `grammar`
///
/// Returns the decoded value, the residual body (everything the grammar did not ask for) and all diagnostics.
pub fn partial_decode(
    body: &Body,
    grammar: &Grammar,
    context: &EvalContext,
) -> (Value, Body, Diagnostics) {
    let engine = context.engine();
    let (content, remainder, mut diagnostics) = body.partial_content(&grammar.schema());
    let value = decode_content(grammar, &content, &engine, &mut diagnostics);

    (value, remainder, diagnostics)
}

/// Decodes all of `body` against `grammar`
pub fn decode(body: &Body, grammar: &Grammar, context: &EvalContext) -> (Value, Diagnostics) {
    let engine = context.engine();
    let mut diagnostics = Diagnostics::new();
    let value = decode_body(grammar, body, &engine, &mut diagnostics);

    (value, diagnostics)
}

/// Evaluates the whole body and deserializes it into `target`
///
/// Attributes map to fields/keys by name. Blocks map by type, then one object level per label. Repeated
/// unlabeled blocks of the same type become a list.
///
/// `target` is only replaced when deserialization succeeds. Attributes that fail to evaluate are left out, so a
/// target with `#[serde(default)]` fields still receives everything that could be evaluated.
pub fn decode_into<T>(body: &Body, context: &EvalContext, target: &mut T) -> Diagnostics
where
    T: serde::de::DeserializeOwned,
{
    let engine = context.engine();
    let mut diagnostics = Diagnostics::new();
    let value = body_value(body, &engine, &mut diagnostics);

    match serde_json::to_value(&value).and_then(serde_json::from_value::<T>) {
        Ok(decoded) => *target = decoded,
        Err(err) => diagnostics.push(Diagnostic::error(
            "Unsuitable value type",
            format!("Unsuitable value: {err}"),
        )),
    }

    diagnostics
}

/// Traversals `grammar` would evaluate when decoding `body`
pub fn variables(body: &Body, grammar: &Grammar) -> Vec<Traversal> {
    let (content, _remainder, _diagnostics) = body.partial_content(&grammar.schema());

    let mut traversals = vec![];
    collect_variables(grammar, &content, &mut traversals);
    traversals
}

fn decode_body(
    grammar: &Grammar,
    body: &Body,
    engine: &Context,
    diagnostics: &mut Diagnostics,
) -> Value {
    let (content, content_diagnostics) = body.content(&grammar.schema());
    diagnostics.extend(content_diagnostics);
    decode_content(grammar, &content, engine, diagnostics)
}

fn decode_content(
    grammar: &Grammar,
    content: &BodyContent,
    engine: &Context,
    diagnostics: &mut Diagnostics,
) -> Value {
    match grammar {
        Grammar::Object(children) => Value::Object(
            children
                .iter()
                .map(|(key, child)| {
                    (
                        key.clone(),
                        decode_content(child, content, engine, diagnostics),
                    )
                })
                .collect(),
        ),
        Grammar::Tuple(children) => Value::Array(
            children
                .iter()
                .map(|child| decode_content(child, content, engine, diagnostics))
                .collect(),
        ),
        Grammar::Attr { name, ty, .. } => {
            let Some(attribute) = content.attributes.get(name) else {
                return Value::Null;
            };

            evaluate_typed(
                name,
                &attribute.expr,
                ty,
                attribute.range.as_ref(),
                engine,
                diagnostics,
            )
        }
        Grammar::Literal(value) => value.clone(),
        Grammar::Expr(expr) => {
            let (value, expr_diagnostics) = evaluate(expr, engine, None);
            diagnostics.extend(expr_diagnostics);
            value
        }
        Grammar::Block {
            type_name,
            nested,
            required,
        } => {
            let Some(block) = single_block(content, type_name, *required, diagnostics) else {
                return Value::Null;
            };

            decode_body(nested, &block.body, engine, diagnostics)
        }
        Grammar::BlockList {
            type_name,
            nested,
            min_items,
            max_items,
        } => {
            let values: Vec<_> = content
                .blocks_of_type(type_name)
                .map(|block| decode_body(nested, &block.body, engine, diagnostics))
                .collect();

            if values.len() < *min_items {
                diagnostics.push(Diagnostic::error(
                    format!("Insufficient {type_name} blocks"),
                    format!("At least {min_items} {type_name:?} blocks are required."),
                ));
            }

            if let Some(max_items) = max_items.filter(|max| values.len() > *max) {
                let extra = content.blocks_of_type(type_name).nth(max_items);
                diagnostics.push(
                    Diagnostic::error(
                        format!("Too many {type_name} blocks"),
                        format!("No more than {max_items} {type_name:?} blocks are allowed."),
                    )
                    .with_range(extra.and_then(|block| block.range.clone())),
                );
            }

            Value::Array(values)
        }
        Grammar::BlockMap {
            type_name, nested, ..
        } => {
            let mut map = Map::new();

            for block in content.blocks_of_type(type_name) {
                let value = decode_body(nested, &block.body, engine, diagnostics);
                if !insert_path(&mut map, &block.labels, value) {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("Duplicate {type_name} block"),
                            format!(
                                "A {type_name} block with labels {:?} was already defined. \
                                 Each block must have a unique set of labels.",
                                block.labels
                            ),
                        )
                        .with_range(block.range.clone()),
                    );
                }
            }

            Value::Object(map)
        }
        Grammar::BlockAttrs {
            type_name,
            element_type,
            required,
        } => {
            let Some(block) = single_block(content, type_name, *required, diagnostics) else {
                return Value::Null;
            };

            let (attributes, attribute_diagnostics) = block.body.just_attributes();
            diagnostics.extend(attribute_diagnostics);

            Value::Object(
                attributes
                    .values()
                    .map(|attribute| {
                        let value = evaluate_typed(
                            &attribute.name,
                            &attribute.expr,
                            element_type,
                            attribute.range.as_ref(),
                            engine,
                            diagnostics,
                        );
                        (attribute.name.clone(), value)
                    })
                    .collect(),
            )
        }
        Grammar::Default { primary, default } => {
            match decode_content(primary, content, engine, diagnostics) {
                Value::Null => decode_content(default, content, engine, diagnostics),
                value => value,
            }
        }
    }
}

fn evaluate_typed(
    name: &str,
    expr: &hcl::Expression,
    ty: &Type,
    range: Option<&SourceRange>,
    engine: &Context,
    diagnostics: &mut Diagnostics,
) -> Value {
    let (value, expr_diagnostics) = evaluate(expr, engine, range);
    if !expr_diagnostics.is_empty() {
        diagnostics.extend(expr_diagnostics);
        return Value::Null;
    }

    ty.convert(value).unwrap_or_else(|err| {
        diagnostics.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!("Inappropriate value for attribute {name:?}: {err}."),
            )
            .with_range(range.cloned()),
        );
        Value::Null
    })
}

fn single_block<'a>(
    content: &'a BodyContent,
    type_name: &'a str,
    required: bool,
    diagnostics: &mut Diagnostics,
) -> Option<&'a crate::body::Block> {
    let mut blocks = content.blocks_of_type(type_name);
    let first = blocks.next();

    for duplicate in blocks {
        let location = first
            .and_then(|block| block.range.as_ref())
            .map(|range| format!(" at {range}"))
            .unwrap_or_default();

        diagnostics.push(
            Diagnostic::error(
                format!("Duplicate {type_name} block"),
                format!("Only one {type_name} block is allowed. Another was defined{location}."),
            )
            .with_range(duplicate.range.clone()),
        );
    }

    if first.is_none() && required {
        diagnostics.push(Diagnostic::error(
            format!("Missing {type_name} block"),
            format!("A block of type {type_name:?} is required here."),
        ));
    }

    first
}

/// Inserts `value` at `path`, creating intermediate objects. Returns `false` when the path is taken.
fn insert_path(map: &mut Map, path: &[String], value: Value) -> bool {
    let Some((key, rest)) = path.split_first() else {
        return false;
    };

    if rest.is_empty() {
        if map.contains_key(key) {
            return false;
        }
        map.insert(key.clone(), value);
        return true;
    }

    let entry = map
        .entry(key.clone())
        .or_insert_with(|| Value::Object(Map::new()));

    match entry {
        Value::Object(nested) => insert_path(nested, rest, value),
        _ => false,
    }
}

/// Generic view of a body: attributes by name, blocks grouped by type and nested by labels
fn body_value(body: &Body, engine: &Context, diagnostics: &mut Diagnostics) -> Value {
    let mut object = Map::new();
    let mut attribute_ranges: IndexMap<&str, Option<&SourceRange>> = IndexMap::new();
    let mut blocks: IndexMap<&str, Vec<(&[String], Value, Option<&SourceRange>)>> =
        IndexMap::new();

    for item in body.items() {
        let expr = match &item.kind {
            ItemKind::Attribute(expr) => expr.clone(),
            ItemKind::Json(value) => json::expression(value),
            ItemKind::Block { labels, body } => {
                let value = body_value(body, engine, diagnostics);
                blocks.entry(item.name.as_str()).or_default().push((
                    labels.as_slice(),
                    value,
                    item.range.as_ref(),
                ));
                continue;
            }
        };

        if let Some(existing) = attribute_ranges.get(item.name.as_str()) {
            let location = existing
                .map(|range| format!(" at {range}"))
                .unwrap_or_default();
            diagnostics.push(
                Diagnostic::error(
                    "Duplicate argument",
                    format!(
                        "The argument {:?} was already set{location}. Each argument may be set only once.",
                        item.name
                    ),
                )
                .with_range(item.range.clone()),
            );
            continue;
        }
        attribute_ranges.insert(item.name.as_str(), item.range.as_ref());

        let (value, expr_diagnostics) = evaluate(&expr, engine, item.range.as_ref());
        if expr_diagnostics.is_empty() {
            object.insert(item.name.clone(), value);
        } else {
            diagnostics.extend(expr_diagnostics);
        }
    }

    for (type_name, group) in blocks {
        if attribute_ranges.contains_key(type_name) {
            diagnostics.push(
                Diagnostic::error(
                    "Conflicting block and argument",
                    format!("{type_name:?} is defined both as argument and as block type."),
                )
                .with_range(group[0].2.cloned()),
            );
            continue;
        }

        let value = if group.iter().all(|(labels, _, _)| labels.is_empty()) {
            let mut values: Vec<_> = group.into_iter().map(|(_, value, _)| value).collect();
            if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            }
        } else {
            let mut map = Map::new();
            for (labels, value, range) in group {
                if !insert_path(&mut map, labels, value) {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("Duplicate {type_name} block"),
                            format!(
                                "A {type_name} block with labels {labels:?} was already defined. \
                                 Each block must have a unique set of labels."
                            ),
                        )
                        .with_range(range.cloned()),
                    );
                }
            }
            Value::Object(map)
        };

        object.insert(type_name.to_owned(), value);
    }

    Value::Object(object)
}

fn collect_variables(grammar: &Grammar, content: &BodyContent, traversals: &mut Vec<Traversal>) {
    match grammar {
        Grammar::Object(children) => children
            .values()
            .for_each(|child| collect_variables(child, content, traversals)),
        Grammar::Tuple(children) => children
            .iter()
            .for_each(|child| collect_variables(child, content, traversals)),
        Grammar::Attr { name, .. } => {
            if let Some(attribute) = content.attributes.get(name) {
                collect_traversals(&attribute.expr, traversals);
            }
        }
        Grammar::Expr(expr) => collect_traversals(expr, traversals),
        Grammar::Literal(_) => {}
        Grammar::Block {
            type_name, nested, ..
        }
        | Grammar::BlockList {
            type_name, nested, ..
        }
        | Grammar::BlockMap {
            type_name, nested, ..
        } => {
            for block in content.blocks_of_type(type_name) {
                let (nested_content, _diagnostics) = block.body.content(&nested.schema());
                collect_variables(nested, &nested_content, traversals);
            }
        }
        Grammar::BlockAttrs { type_name, .. } => {
            for block in content.blocks_of_type(type_name) {
                let (attributes, _diagnostics) = block.body.just_attributes();
                attributes
                    .values()
                    .for_each(|attr| collect_traversals(&attr.expr, traversals));
            }
        }
        Grammar::Default { primary, default } => {
            collect_variables(primary, content, traversals);
            collect_variables(default, content, traversals);
        }
    }
}

fn collect_traversals(expr: &hcl::Expression, traversals: &mut Vec<Traversal>) {
    expr.visit_traversals(&mut |traversal: &Traversal| traversals.push(traversal.clone()));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::syntax::{self, Format};
    use crate::visit::root_name;
    use pretty_assertions::assert_eq;

    fn hcl(src: &str) -> Body {
        let (body, diagnostics) = syntax::parse(src.as_bytes(), "test.hcl", Format::Hcl);
        assert!(diagnostics.is_empty(), "{diagnostics}");
        body
    }

    fn service_grammar() -> Grammar {
        Grammar::object([
            ("name", Grammar::attr("name", Type::String, true)),
            (
                "port",
                Grammar::attr("port", Type::Number, false)
                    .with_default(Grammar::Literal(Value::from(80))),
            ),
            (
                "listeners",
                Grammar::block_map(
                    "listener",
                    ["protocol"],
                    Grammar::object([("port", Grammar::attr("port", Type::Number, true))]),
                ),
            ),
            ("tags", Grammar::block_attrs("tags", Type::String, false)),
        ])
    }

    #[test]
    fn partial_decode_values_and_residual() {
        let body = hcl(
            r#"
            name = "web"
            listener "http" { port = 80 }
            listener "https" { port = 443 }
            tags {
              team = "core"
              tier = 1
            }
            unrelated = true
            "#,
        );

        let (value, remainder, diagnostics) =
            partial_decode(&body, &service_grammar(), &EvalContext::new());

        assert!(diagnostics.is_empty(), "{diagnostics}");
        assert_eq!(remainder.items().len(), 1);

        let expected = serde_json::json!({
            "name": "web",
            "port": 80,
            "listeners": { "http": { "port": 80 }, "https": { "port": 443 } },
            "tags": { "team": "core", "tier": "1" },
        });
        assert_eq!(serde_json::to_value(&value).unwrap(), expected);
    }

    #[test]
    fn nested_bodies_are_strict() {
        let body = hcl("name = \"web\"\nlistener \"http\" {\n  port = 80\n  extra = 1\n}\n");

        let (_value, diagnostics) = decode(&body, &service_grammar(), &EvalContext::new());

        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Unsupported argument"]);
    }

    #[test]
    fn type_mismatch_is_reported_and_decoding_continues() {
        let body = hcl("name = \"web\"\nport = \"eighty\"\nlistener \"http\" {}\n");

        let (value, diagnostics) = decode(&body, &service_grammar(), &EvalContext::new());

        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Incorrect attribute value type", "Missing required argument"]
        );
        // `port` failed to convert, so the default applies
        assert_eq!(
            serde_json::to_value(&value).unwrap()["port"],
            serde_json::json!(80)
        );
    }

    #[test]
    fn block_cardinality() {
        let grammar = Grammar::object([
            (
                "db",
                Grammar::block("db", Grammar::default(), true),
            ),
            (
                "replicas",
                Grammar::BlockList {
                    type_name: "replica".into(),
                    nested: Box::new(Grammar::default()),
                    min_items: 1,
                    max_items: Some(2),
                },
            ),
        ]);

        let (_value, diagnostics) = decode(
            &hcl("replica {}\nreplica {}\nreplica {}\n"),
            &grammar,
            &EvalContext::new(),
        );

        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Missing db block", "Too many replica blocks"]);
    }

    #[test]
    fn decode_into_struct() {
        #[derive(serde::Deserialize, Default, Debug, PartialEq)]
        struct Config {
            name: String,
            #[serde(default)]
            port: u16,
            service: std::collections::BTreeMap<String, Service>,
        }

        #[derive(serde::Deserialize, Default, Debug, PartialEq)]
        struct Service {
            replicas: u32,
        }

        let mut context = EvalContext::new();
        context.declare_var("base", 2);

        let body = hcl(
            r#"
            name = "app"
            port = undefined_variable
            service "api" { replicas = base * 2 }
            "#,
        );

        let mut config = Config::default();
        let diagnostics = decode_into(&body, &context, &mut config);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].summary, "Unknown variable");
        assert_eq!(config.name, "app");
        assert_eq!(config.port, 0);
        assert_eq!(config.service["api"], Service { replicas: 4 });
    }

    #[test]
    fn decode_into_rejects_unsuitable_targets() {
        #[derive(serde::Deserialize, Default)]
        struct Strict {
            #[allow(dead_code)]
            count: u32,
        }

        let mut target = Strict::default();
        let diagnostics = decode_into(&hcl("count = \"many\""), &EvalContext::new(), &mut target);

        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.as_slice()[0].summary, "Unsuitable value type");
    }

    #[test]
    fn json_diagnostics_point_at_the_property() {
        let (body, diagnostics) = syntax::parse(
            b"{\n  \"name\": \"${missing}\"\n}",
            "main.json",
            Format::Json,
        );
        assert!(diagnostics.is_empty(), "{diagnostics}");

        let (_value, diagnostics) = decode(
            &body,
            &Grammar::attr("name", Type::String, true),
            &EvalContext::new(),
        );

        let range = diagnostics.as_slice()[0]
            .range
            .clone()
            .expect("JSON properties carry a range");
        assert_eq!((range.filename.as_str(), range.line), ("main.json", 2));
    }

    #[test]
    fn variables_lists_referenced_traversals() {
        let body = hcl(
            r#"
            name = "${var.prefix}-web"
            tags { owner = local.owner }
            ignored = not_part_of_the_grammar
            "#,
        );

        let roots: Vec<_> = variables(&body, &service_grammar())
            .iter()
            .filter_map(|traversal| root_name(traversal).map(str::to_owned))
            .collect();

        assert_eq!(roots, vec!["var", "local"]);
    }
}
