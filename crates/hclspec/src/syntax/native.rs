//! native block syntax, parsed by [hcl_edit]
//!
//! `hcl_edit` keeps byte spans for every structure. They are turned into [SourceRange]s right away so that the
//! rest of the crate only deals with [hcl::Expression]s.
use crate::body::{Body, Item, ItemKind};
use crate::diagnostic::{Diagnostic, Diagnostics, SourceRange};
use crate::util::SourceIndex;
use hcl_edit::structure::Structure;
use hcl_edit::Span;

pub fn parse(src: &str, filename: &str) -> (Body, Diagnostics) {
    let index = SourceIndex::new(filename, src);

    // some malformed input makes the parser panic instead of failing
    let Ok(parsed) = std::panic::catch_unwind(|| hcl_edit::parser::parse_body(src)) else {
        tracing::debug!(%filename, "parser panicked");
        return (
            Body::default(),
            Diagnostic::error(
                "Invalid HCL syntax",
                format!("The HCL file {filename:?} could not be parsed."),
            )
            .into(),
        );
    };

    match parsed {
        Ok(body) => (convert(body, &index), Diagnostics::new()),
        Err(err) => {
            let offset = err.location().offset();
            let range = index.range(offset..(offset + 1).min(src.len()));

            tracing::debug!(%filename, %err, "syntax error");
            (
                Body::default(),
                Diagnostic::error("Invalid HCL syntax", err.message())
                    .with_range(Some(range))
                    .into(),
            )
        }
    }
}

fn convert(body: hcl_edit::structure::Body, index: &SourceIndex) -> Body {
    let range = |span: Option<std::ops::Range<usize>>| -> Option<SourceRange> {
        span.map(|span| index.range(span))
    };

    let items = body
        .into_iter()
        .map(|structure| match structure {
            Structure::Attribute(attribute) => Item {
                name: attribute.key.value().to_string(),
                range: range(attribute.span()),
                kind: ItemKind::Attribute(attribute.value.into()),
            },
            Structure::Block(block) => Item {
                name: block.ident.value().to_string(),
                // the identifier, not the whole block, is what diagnostics should point at
                range: range(block.ident.span()),
                kind: ItemKind::Block {
                    labels: block
                        .labels
                        .iter()
                        .map(|label| label.as_str().to_owned())
                        .collect(),
                    body: convert(block.body, index),
                },
            },
        })
        .collect();

    Body::new(items)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn items_keep_source_ranges() {
        let (body, diagnostics) = parse("one = 1\nblock \"label\" {\n  two = 2\n}\n", "main.hcl");
        assert!(diagnostics.is_empty());

        let items = body.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "one");
        assert_eq!(items[1].name, "block");

        let range = items[1].range.as_ref().expect("block has a range");
        assert_eq!(range.filename, "main.hcl");
        assert_eq!((range.line, range.column), (2, 1));

        let ItemKind::Block { labels, body } = &items[1].kind else {
            panic!("expected a block");
        };
        assert_eq!(labels, &vec!["label".to_string()]);
        assert_eq!(body.items()[0].name, "two");
    }

    #[test]
    fn syntax_error_is_a_diagnostic() {
        let (body, diagnostics) = parse("not = valid = hcl", "broken.hcl");

        assert!(body.is_empty());
        assert_eq!(diagnostics.len(), 1);

        let diagnostic = &diagnostics.as_slice()[0];
        assert_eq!(diagnostic.summary, "Invalid HCL syntax");
        assert_eq!(
            diagnostic.range.as_ref().map(|range| range.filename.as_str()),
            Some("broken.hcl")
        );
    }

    #[test]
    fn parser_panic_is_a_diagnostic() {
        let (body, diagnostics) = parse("a = é\n", "broken.hcl");

        assert!(body.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.as_slice()[0].summary, "Invalid HCL syntax");
    }
}
