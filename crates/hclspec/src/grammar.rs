//! declarative grammars
//!
//! A [Grammar] describes what a block definition consumes from a body and what shape the decoded value has.
//! It is only a description: [crate::decode] does the work.
//!
//! | grammar | consumes | decoded value |
//! |---|---|---|
//! | `Object` | union of its children | object with one key per child |
//! | `Tuple` | union of its children | tuple with one element per child |
//! | `Attr` | attribute `name` | the converted attribute value or `null` |
//! | `Literal` | nothing | the literal |
//! | `Expr` | nothing | the evaluated expression |
//! | `Block` | at most one `type_name` block | decoded nested body or `null` |
//! | `BlockList` | any number of `type_name` blocks | tuple of decoded nested bodies |
//! | `BlockMap` | labeled `type_name` blocks | object nested one level per label |
//! | `BlockAttrs` | at most one `type_name` block | object of its attributes |
//! | `Default` | union of both | `primary`, or `default` when `primary` is `null` |
use crate::body::BodySchema;
use crate::value::Type;
use hcl::Value;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub enum Grammar {
    Object(IndexMap<String, Grammar>),
    Tuple(Vec<Grammar>),
    Attr {
        name: String,
        ty: Type,
        required: bool,
    },
    Literal(Value),
    Expr(hcl::Expression),
    Block {
        type_name: String,
        nested: Box<Grammar>,
        required: bool,
    },
    BlockList {
        type_name: String,
        nested: Box<Grammar>,
        min_items: usize,
        max_items: Option<usize>,
    },
    BlockMap {
        type_name: String,
        label_names: Vec<String>,
        nested: Box<Grammar>,
    },
    BlockAttrs {
        type_name: String,
        element_type: Type,
        required: bool,
    },
    Default {
        primary: Box<Grammar>,
        default: Box<Grammar>,
    },
}

impl Default for Grammar {
    /// An empty object: consumes nothing
    fn default() -> Self {
        Grammar::Object(IndexMap::new())
    }
}

impl Grammar {
    pub fn object<K: Into<String>>(children: impl IntoIterator<Item = (K, Grammar)>) -> Self {
        Grammar::Object(
            children
                .into_iter()
                .map(|(key, grammar)| (key.into(), grammar))
                .collect(),
        )
    }

    pub fn attr(name: impl Into<String>, ty: Type, required: bool) -> Self {
        Grammar::Attr {
            name: name.into(),
            ty,
            required,
        }
    }

    pub fn block(type_name: impl Into<String>, nested: Grammar, required: bool) -> Self {
        Grammar::Block {
            type_name: type_name.into(),
            nested: Box::new(nested),
            required,
        }
    }

    pub fn block_list(type_name: impl Into<String>, nested: Grammar) -> Self {
        Grammar::BlockList {
            type_name: type_name.into(),
            nested: Box::new(nested),
            min_items: 0,
            max_items: None,
        }
    }

    pub fn block_map<L: Into<String>>(
        type_name: impl Into<String>,
        label_names: impl IntoIterator<Item = L>,
        nested: Grammar,
    ) -> Self {
        Grammar::BlockMap {
            type_name: type_name.into(),
            label_names: label_names.into_iter().map(Into::into).collect(),
            nested: Box::new(nested),
        }
    }

    pub fn block_attrs(type_name: impl Into<String>, element_type: Type, required: bool) -> Self {
        Grammar::BlockAttrs {
            type_name: type_name.into(),
            element_type,
            required,
        }
    }

    pub fn with_default(self, default: Grammar) -> Self {
        Grammar::Default {
            primary: Box::new(self),
            default: Box::new(default),
        }
    }

    /// Attribute names and block types this grammar reads from a body
    pub fn schema(&self) -> BodySchema {
        let mut schema = BodySchema::default();
        self.collect_schema(&mut schema);
        schema
    }

    fn collect_schema(&self, schema: &mut BodySchema) {
        match self {
            Grammar::Object(children) => children
                .values()
                .for_each(|child| child.collect_schema(schema)),
            Grammar::Tuple(children) => children
                .iter()
                .for_each(|child| child.collect_schema(schema)),
            Grammar::Attr { name, required, .. } => schema.add_attribute(name, *required),
            Grammar::Literal(_) | Grammar::Expr(_) => {}
            Grammar::Block { type_name, .. }
            | Grammar::BlockList { type_name, .. }
            | Grammar::BlockAttrs { type_name, .. } => schema.add_block(type_name, &[]),
            Grammar::BlockMap {
                type_name,
                label_names,
                ..
            } => schema.add_block(type_name, label_names),
            Grammar::Default { primary, default } => {
                primary.collect_schema(schema);
                default.collect_schema(schema);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::body::{AttributeSchema, BlockHeaderSchema};
    use pretty_assertions::assert_eq;

    #[test]
    fn schema_collects_children() {
        let grammar = Grammar::object([
            ("name", Grammar::attr("name", Type::String, true)),
            (
                "port",
                Grammar::attr("port", Type::Number, false)
                    .with_default(Grammar::Literal(Value::from(80))),
            ),
            (
                "services",
                Grammar::block_map("service", ["kind"], Grammar::default()),
            ),
            ("env", Grammar::block_attrs("env", Type::String, false)),
        ]);

        let schema = grammar.schema();

        assert_eq!(
            schema.attributes,
            vec![
                AttributeSchema {
                    name: "name".into(),
                    required: true
                },
                AttributeSchema {
                    name: "port".into(),
                    required: false
                },
            ]
        );
        assert_eq!(
            schema.blocks,
            vec![
                BlockHeaderSchema {
                    type_name: "service".into(),
                    label_names: vec!["kind".into()]
                },
                BlockHeaderSchema {
                    type_name: "env".into(),
                    label_names: vec![]
                },
            ]
        );
    }

    #[test]
    fn empty_grammar_consumes_nothing() {
        assert_eq!(Grammar::default().schema(), BodySchema::default());
    }
}
