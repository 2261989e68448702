//! caller facing entry point
//!
//! A [Schema] combines a [Registrar] (what to decode, in which order) with [Documents] (what to decode it from).
//!
//! ```
//! use hclspec::blocks;
//! use hclspec::eval::EvalContext;
//! use hclspec::schema::Schema;
//!
//! let mut schema = Schema::new(blocks::stock());
//! let report = schema.parse_hcl(b"variables { name = \"web\" }", "main.hcl");
//! assert!(!report.has_errors());
//!
//! let mut context = EvalContext::new();
//! let report = schema.parse(&mut context);
//! assert!(!report.has_errors());
//! assert!(context.variable("var").is_some());
//! ```
use crate::body::Body;
use crate::decode;
use crate::definition::NamedBlockDefinitions;
use crate::diagnostic::Diagnostics;
use crate::documents::Documents;
use crate::eval::EvalContext;
use crate::grammar::Grammar;
use crate::registrar::{Registrar, Registration};
use crate::report::Report;
use crate::syntax::Format;
use hcl::Traversal;
use std::path::Path;

#[derive(Debug, Default)]
pub struct Schema {
    registrar: Registrar,
    documents: Documents,
}

impl Schema {
    /// Registers `definitions` in the given order
    pub fn new(definitions: NamedBlockDefinitions) -> Self {
        let mut registrar = Registrar::new(1);
        for definition in definitions {
            let name = definition.name().to_owned();
            registrar.register_block(name, definition);
        }

        Self {
            registrar,
            documents: Documents::default(),
        }
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    pub fn registrar_mut(&mut self) -> &mut Registrar {
        &mut self.registrar
    }

    pub fn registrations(&self) -> &[Registration] {
        self.registrar.registrations()
    }

    pub fn registrations_mut(&mut self) -> &mut Vec<Registration> {
        self.registrar.registrations_mut()
    }

    /// See [Registrar::build]
    pub fn build(&self) -> Grammar {
        self.registrar.build()
    }

    pub fn documents(&self) -> &Documents {
        &self.documents
    }

    pub fn parse_hcl(&mut self, src: &[u8], filename: &str) -> Report {
        let diagnostics = self.documents.add_source(filename, src, Format::Hcl);
        self.report(diagnostics)
    }

    pub fn parse_hcl_file(&mut self, path: impl AsRef<Path>) -> Report {
        let diagnostics = self.documents.add_file_as(path.as_ref(), Format::Hcl);
        self.report(diagnostics)
    }

    pub fn parse_json(&mut self, src: &[u8], filename: &str) -> Report {
        let diagnostics = self.documents.add_source(filename, src, Format::Json);
        self.report(diagnostics)
    }

    pub fn parse_json_file(&mut self, path: impl AsRef<Path>) -> Report {
        let diagnostics = self.documents.add_file_as(path.as_ref(), Format::Json);
        self.report(diagnostics)
    }

    /// Loads `.hcl` and `.json` files, the format is picked by extension
    pub fn files<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> Report {
        let diagnostics = self.documents.add_files(paths);
        self.report(diagnostics)
    }

    /// Loads all files matching `pattern`, see [Documents::add_glob]
    pub fn file_glob(&mut self, pattern: &str) -> Report {
        let diagnostics = self.documents.add_glob(pattern);
        self.report(diagnostics)
    }

    /// Filenames loaded so far, including files with syntax errors
    pub fn parsed_files(&self) -> Vec<&str> {
        self.documents.filenames().collect()
    }

    /// All loaded files as one body
    pub fn body(&self) -> Body {
        self.documents.merged_body()
    }

    /// Runs the ordered decode over all loaded files
    ///
    /// `context` receives every injected variable and function.
    pub fn parse(&self, context: &mut EvalContext) -> Report {
        let diagnostics = self.registrar.parse(&self.body(), context);
        self.report(diagnostics)
    }

    /// Decodes all loaded files into `target`, typically with the context left by [Schema::parse]
    pub fn decode<T>(&self, context: &EvalContext, target: &mut T) -> Report
    where
        T: serde::de::DeserializeOwned,
    {
        let diagnostics = decode::decode_into(&self.body(), context, target);
        self.report(diagnostics)
    }

    /// Traversals the registered grammars would evaluate
    pub fn variables(&self) -> Vec<Traversal> {
        decode::variables(&self.body(), &self.build())
    }

    fn report(&self, diagnostics: Diagnostics) -> Report {
        Report::new(diagnostics, self.documents.sources())
    }
}
