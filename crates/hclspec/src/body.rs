//! document body shared by both syntaxes
//!
//! A [Body] is a flat list of root [Item]s. Items parsed from the block syntax are already attributes or blocks.
//! Items parsed from JSON stay raw ([ItemKind::Json]) until a [BodySchema] says how to read them: the same JSON
//! property can be an attribute holding an object, or one or more blocks, depending on what is asked for.
//!
//! Extracting content from a body never fails. Problems are reported as diagnostics and the offending item is
//! skipped. [Body::partial_content] additionally returns the residual body: every item the schema did not ask for.
use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use crate::syntax::json;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct Body {
    items: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub range: Option<SourceRange>,
    pub kind: ItemKind,
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Attribute(hcl::Expression),
    Block { labels: Vec<String>, body: Body },
    /// JSON property, interpreted on demand
    Json(serde_json::Value),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: hcl::Expression,
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub type_name: String,
    pub labels: Vec<String>,
    pub body: Body,
    pub range: Option<SourceRange>,
}

/// Attribute names and block types a decoder wants from a body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodySchema {
    pub attributes: Vec<AttributeSchema>,
    pub blocks: Vec<BlockHeaderSchema>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub name: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockHeaderSchema {
    pub type_name: String,
    pub label_names: Vec<String>,
}

impl BodySchema {
    /// Adds an attribute. Asking for the same attribute twice keeps one entry, required if either was.
    pub fn add_attribute(&mut self, name: &str, required: bool) {
        if let Some(existing) = self.attributes.iter_mut().find(|attr| attr.name == name) {
            existing.required |= required;
            return;
        }

        self.attributes.push(AttributeSchema {
            name: name.to_owned(),
            required,
        });
    }

    pub fn add_block(&mut self, type_name: &str, label_names: &[String]) {
        if self.block(type_name).is_some() {
            return;
        }

        self.blocks.push(BlockHeaderSchema {
            type_name: type_name.to_owned(),
            label_names: label_names.to_vec(),
        });
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn block(&self, type_name: &str) -> Option<&BlockHeaderSchema> {
        self.blocks.iter().find(|block| block.type_name == type_name)
    }
}

/// Attributes and blocks matched by a [BodySchema]
#[derive(Debug, Clone, Default)]
pub struct BodyContent {
    pub attributes: IndexMap<String, Attribute>,
    pub blocks: Vec<Block>,
}

impl BodyContent {
    pub fn blocks_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks
            .iter()
            .filter(move |block| block.type_name == type_name)
    }
}

impl Body {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Union of all root items, in the given order
    pub fn merge(bodies: impl IntoIterator<Item = Body>) -> Self {
        Self {
            items: bodies.into_iter().flat_map(|body| body.items).collect(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Extracts everything the schema asks for. Any other item is an error.
    pub fn content(&self, schema: &BodySchema) -> (BodyContent, Diagnostics) {
        let (content, _remainder, diagnostics) = self.extract(schema, false);
        (content, diagnostics)
    }

    /// Extracts everything the schema asks for and returns the rest as residual body
    pub fn partial_content(&self, schema: &BodySchema) -> (BodyContent, Body, Diagnostics) {
        self.extract(schema, true)
    }

    /// Reads the body as attributes only. Blocks are an error.
    pub fn just_attributes(&self) -> (IndexMap<String, Attribute>, Diagnostics) {
        let mut attributes = IndexMap::new();
        let mut diagnostics = Diagnostics::new();

        for item in &self.items {
            let attribute = match &item.kind {
                ItemKind::Attribute(expr) => item.attribute(expr.clone()),
                ItemKind::Json(value) => item.attribute(json::expression(value)),
                ItemKind::Block { .. } => {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("Unexpected {:?} block", item.name),
                            "Blocks are not allowed here.",
                        )
                        .with_range(item.range.clone()),
                    );
                    continue;
                }
            };

            insert_attribute(&mut attributes, attribute, &mut diagnostics);
        }

        (attributes, diagnostics)
    }

    fn extract(&self, schema: &BodySchema, partial: bool) -> (BodyContent, Body, Diagnostics) {
        let mut content = BodyContent::default();
        let mut remainder = vec![];
        let mut diagnostics = Diagnostics::new();

        for item in &self.items {
            if schema.attribute(&item.name).is_some() {
                let attribute = match &item.kind {
                    ItemKind::Attribute(expr) => item.attribute(expr.clone()),
                    ItemKind::Json(value) => item.attribute(json::expression(value)),
                    ItemKind::Block { .. } => {
                        diagnostics.push(
                            Diagnostic::error(
                                "Unsupported block type",
                                format!(
                                    "Blocks of type {:?} are not expected here. Did you mean to define argument {:?}? \
                                     If so, use the equals sign to assign it a value.",
                                    item.name, item.name
                                ),
                            )
                            .with_range(item.range.clone()),
                        );
                        continue;
                    }
                };

                insert_attribute(&mut content.attributes, attribute, &mut diagnostics);
                continue;
            }

            if let Some(header) = schema.block(&item.name) {
                match &item.kind {
                    ItemKind::Block { labels, body } => {
                        if let Some(diagnostic) = check_labels(header, labels) {
                            diagnostics.push(diagnostic.with_range(item.range.clone()));
                            continue;
                        }

                        content.blocks.push(Block {
                            type_name: item.name.clone(),
                            labels: labels.clone(),
                            body: body.clone(),
                            range: item.range.clone(),
                        });
                    }
                    ItemKind::Json(value) => {
                        let mut labels = vec![];
                        expand_json_blocks(
                            header,
                            &mut labels,
                            value,
                            &item.range,
                            &mut content.blocks,
                            &mut diagnostics,
                        );
                    }
                    ItemKind::Attribute(_) => {
                        diagnostics.push(
                            Diagnostic::error(
                                "Unsupported argument",
                                format!(
                                    "An argument named {:?} is not expected here. Did you mean to define a block of type {:?}?",
                                    item.name, item.name
                                ),
                            )
                            .with_range(item.range.clone()),
                        );
                    }
                }
                continue;
            }

            if partial {
                remainder.push(item.clone());
                continue;
            }

            let diagnostic = match &item.kind {
                ItemKind::Attribute(_) => Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named {:?} is not expected here.", item.name),
                ),
                ItemKind::Block { .. } => Diagnostic::error(
                    "Unsupported block type",
                    format!("Blocks of type {:?} are not expected here.", item.name),
                ),
                ItemKind::Json(_) => Diagnostic::error(
                    "Extraneous JSON object property",
                    format!("No argument or block type is named {:?}.", item.name),
                ),
            };
            diagnostics.push(diagnostic.with_range(item.range.clone()));
        }

        for attribute in schema.attributes.iter().filter(|attr| attr.required) {
            if !content.attributes.contains_key(&attribute.name) {
                diagnostics.push(Diagnostic::error(
                    "Missing required argument",
                    format!(
                        "The argument {:?} is required, but no definition was found.",
                        attribute.name
                    ),
                ));
            }
        }

        (content, Body::new(remainder), diagnostics)
    }
}

impl Item {
    fn attribute(&self, expr: hcl::Expression) -> Attribute {
        Attribute {
            name: self.name.clone(),
            expr,
            range: self.range.clone(),
        }
    }
}

/// First definition wins
fn insert_attribute(
    attributes: &mut IndexMap<String, Attribute>,
    attribute: Attribute,
    diagnostics: &mut Diagnostics,
) {
    if let Some(existing) = attributes.get(&attribute.name) {
        let location = existing
            .range
            .as_ref()
            .map(|range| format!(" at {range}"))
            .unwrap_or_default();

        diagnostics.push(
            Diagnostic::error(
                "Duplicate argument",
                format!(
                    "The argument {:?} was already set{location}. Each argument may be set only once.",
                    attribute.name
                ),
            )
            .with_range(attribute.range),
        );
        return;
    }

    attributes.insert(attribute.name.clone(), attribute);
}

fn check_labels(header: &BlockHeaderSchema, labels: &[String]) -> Option<Diagnostic> {
    let expected = header.label_names.len();
    let names = header.label_names.join(", ");

    if labels.len() < expected {
        return Some(Diagnostic::error(
            format!("Missing name for {}", header.type_name),
            format!(
                "All {} blocks must have {expected} labels ({names}).",
                header.type_name
            ),
        ));
    }

    if labels.len() > expected {
        let detail = if expected == 0 {
            format!("No labels are expected for {} blocks.", header.type_name)
        } else {
            format!(
                "Only {expected} labels ({names}) are expected for {} blocks.",
                header.type_name
            )
        };
        return Some(Diagnostic::error(
            format!("Extraneous label for {}", header.type_name),
            detail,
        ));
    }

    None
}

/// A JSON block property nests one object level per label. Arrays at any level define several blocks.
fn expand_json_blocks(
    header: &BlockHeaderSchema,
    labels: &mut Vec<String>,
    value: &serde_json::Value,
    range: &Option<SourceRange>,
    blocks: &mut Vec<Block>,
    diagnostics: &mut Diagnostics,
) {
    use serde_json::Value;

    match value {
        Value::Array(elements) => {
            for element in elements {
                expand_json_blocks(header, labels, element, range, blocks, diagnostics);
            }
        }
        Value::Object(object) if labels.len() == header.label_names.len() => {
            blocks.push(Block {
                type_name: header.type_name.clone(),
                labels: labels.clone(),
                body: json::body_from_object(object, range.as_ref()),
                range: range.clone(),
            });
        }
        Value::Object(object) => {
            for (label, nested) in object {
                labels.push(label.clone());
                expand_json_blocks(header, labels, nested, range, blocks, diagnostics);
                labels.pop();
            }
        }
        _ => {
            let detail = match header.label_names.get(labels.len()) {
                Some(label_name) => format!(
                    "A JSON object is required here, whose keys represent the {label_name} labels of {} blocks.",
                    header.type_name
                ),
                None => "A JSON object is required here, to define arguments and child blocks."
                    .to_string(),
            };
            diagnostics
                .push(Diagnostic::error("Incorrect JSON value type", detail).with_range(range.clone()));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::syntax::{self, Format};
    use pretty_assertions::assert_eq;

    fn hcl(src: &str) -> Body {
        let (body, diagnostics) = syntax::parse(src.as_bytes(), "test.hcl", Format::Hcl);
        assert!(diagnostics.is_empty(), "{diagnostics}");
        body
    }

    fn json(src: &str) -> Body {
        let (body, diagnostics) = syntax::parse(src.as_bytes(), "test.json", Format::Json);
        assert!(diagnostics.is_empty(), "{diagnostics}");
        body
    }

    fn schema() -> BodySchema {
        let mut schema = BodySchema::default();
        schema.add_attribute("name", true);
        schema.add_block("service", &["kind".to_string()]);
        schema
    }

    #[test]
    fn partial_content_returns_residual_body() {
        let body = hcl(
            r#"
            name = "one"
            other = 2
            service "web" {}
            unrelated {}
            "#,
        );

        let (content, remainder, diagnostics) = body.partial_content(&schema());

        assert!(diagnostics.is_empty());
        assert_eq!(content.attributes.len(), 1);
        assert_eq!(content.blocks.len(), 1);
        assert_eq!(content.blocks[0].labels, vec!["web".to_string()]);

        let remaining: Vec<_> = remainder.items().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(remaining, vec!["other", "unrelated"]);
    }

    #[test]
    fn content_rejects_unknown_items() {
        let body = hcl("name = \"one\"\nother = 2\n");

        let (_content, diagnostics) = body.content(&schema());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].summary, "Unsupported argument");
    }

    #[test]
    fn missing_required_argument() {
        let (_content, _remainder, diagnostics) = hcl("").partial_content(&schema());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].summary, "Missing required argument");
    }

    #[test]
    fn duplicate_argument_keeps_first() {
        let body = Body::merge([hcl("name = \"first\""), hcl("name = \"second\"")]);

        let (content, _remainder, diagnostics) = body.partial_content(&schema());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].summary, "Duplicate argument");
        assert_eq!(
            content.attributes["name"].expr,
            hcl::Expression::String("first".into())
        );
    }

    #[test]
    fn label_count_is_checked() {
        let body = hcl("name = 1\nservice {}\nservice a b {}\n");

        let (content, _remainder, diagnostics) = body.partial_content(&schema());

        assert!(content.blocks.is_empty());
        let summaries: Vec<_> = diagnostics.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Missing name for service", "Extraneous label for service"]
        );
    }

    #[test]
    fn json_properties_follow_the_schema() {
        let body = json(
            r#"{
                "name": "one",
                "service": {
                    "web": { "port": 80 },
                    "db": [{ "port": 5432 }, { "port": 5433 }]
                }
            }"#,
        );

        let (content, remainder, diagnostics) = body.partial_content(&schema());

        assert!(diagnostics.is_empty());
        assert!(remainder.is_empty());
        assert!(content.attributes.contains_key("name"));

        let labels: Vec<_> = content
            .blocks_of_type("service")
            .map(|block| block.labels.join("."))
            .collect();
        assert_eq!(labels, vec!["web", "db", "db"]);
    }

    #[test]
    fn just_attributes_rejects_blocks() {
        let (attributes, diagnostics) = hcl("a = 1\nb {}\n").just_attributes();

        assert_eq!(attributes.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].summary, "Unexpected \"b\" block");
    }
}
