//! collection of parsed source files
//!
//! [Documents] keeps one parsed [Body] per filename together with its source text. The source is kept so
//! diagnostics can be rendered with a code snippet later on (see [crate::report::Report]).
//!
//! Adding the same filename again replaces the earlier file. The merged body is computed on request from
//! whatever is stored at that moment, so it can never be stale.
use crate::body::Body;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::syntax::{self, Format};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Source text by filename
pub type SourceMap = BTreeMap<String, Arc<str>>;

pub const UNKNOWN_FILE_TYPE_SUMMARY: &str =
    "Cannot determine file type based on extension, only .json and .hcl files are supported";
pub const UNKNOWN_FILE_TYPE_DETAIL: &str = "You must provide a file with either a .json or .hcl extension, only json and hcl files are supported";
pub const GLOB_ERROR_SUMMARY: &str = "There was a problem parsing the file pattern";
pub const GLOB_ERROR_DETAIL: &str =
    "The file pattern was not able to be parsed. This might be an implementation problem.";
pub const READ_ERROR_SUMMARY: &str = "Failed to read file";

#[derive(Debug, Clone)]
pub struct File {
    pub format: Format,
    pub source: Arc<str>,
    pub body: Body,
}

#[derive(Debug, Default, Clone)]
pub struct Documents {
    files: BTreeMap<String, File>,
}

impl Documents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores one source
    ///
    /// The file is stored even when it has syntax errors, so that its diagnostics can be rendered.
    pub fn add_source(
        &mut self,
        filename: impl Into<String>,
        src: &[u8],
        format: Format,
    ) -> Diagnostics {
        let filename = filename.into();
        let (body, diagnostics) = syntax::parse(src, &filename, format);
        tracing::debug!(%filename, %format, items = body.items().len(), "parsed");

        let file = File {
            format,
            source: String::from_utf8_lossy(src).into(),
            body,
        };

        if self.files.insert(filename, file).is_some() {
            tracing::debug!("replaced previously parsed file");
        }

        diagnostics
    }

    /// Reads and stores a file in the given format, regardless of its extension
    pub fn add_file_as(&mut self, path: &Path, format: Format) -> Diagnostics {
        let filename = path.display().to_string();
        tracing::info!(path = %filename, %format, "loading file");

        match std::fs::read(path) {
            Ok(src) => self.add_source(filename, &src, format),
            Err(err) => {
                tracing::debug!(%err, "failed to read file");
                Diagnostic::error(
                    READ_ERROR_SUMMARY,
                    format!("The {format} file {filename:?} could not be read."),
                )
                .into()
            }
        }
    }

    /// Reads and stores a file, the format is detected by extension
    pub fn add_file(&mut self, path: &Path) -> Diagnostics {
        match Format::from_path(path) {
            Some(format) => self.add_file_as(path, format),
            None => {
                tracing::debug!(path = %path.display(), "unsupported file extension");
                Diagnostic::error(UNKNOWN_FILE_TYPE_SUMMARY, UNKNOWN_FILE_TYPE_DETAIL).into()
            }
        }
    }

    /// Adds every file, one failing file does not stop the others
    pub fn add_files<P: AsRef<Path>>(&mut self, paths: impl IntoIterator<Item = P>) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for path in paths {
            diagnostics.extend(self.add_file(path.as_ref()));
        }
        diagnostics
    }

    /// Adds every file matching `pattern`
    ///
    /// A pattern without matches is fine. Directories that can not be read while walking the pattern are reported
    /// and skipped.
    pub fn add_glob(&mut self, pattern: &str) -> Diagnostics {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(err) => {
                tracing::debug!(%pattern, %err, "invalid file pattern");
                return Diagnostic::error(GLOB_ERROR_SUMMARY, GLOB_ERROR_DETAIL).into();
            }
        };

        let mut diagnostics = Diagnostics::new();
        let mut matches = vec![];
        for entry in paths {
            match entry {
                Ok(path) => matches.push(path),
                Err(err) => {
                    tracing::debug!(
                        path = %err.path().display(),
                        error = %err.error(),
                        "failed to walk file pattern"
                    );
                    diagnostics.push(Diagnostic::error(
                        READ_ERROR_SUMMARY,
                        format!(
                            "The path {:?} could not be read while matching {pattern:?}.",
                            err.path()
                        ),
                    ));
                }
            }
        }
        tracing::debug!(%pattern, matches = matches.len(), "expanded file pattern");

        diagnostics.extend(self.add_files(matches));
        diagnostics
    }

    /// All root items of all files, ordered by filename
    pub fn merged_body(&self) -> Body {
        Body::merge(self.files.values().map(|file| file.body.clone()))
    }

    pub fn get(&self, filename: &str) -> Option<&File> {
        self.files.get(filename)
    }

    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn sources(&self) -> SourceMap {
        self.files
            .iter()
            .map(|(filename, file)| (filename.clone(), file.source.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Utility macro to create [Documents]
///
/// Create from a single HCL document (stored as `main.hcl`)
/// ```
/// # use hclspec::documents;
/// documents!("attribute = 42");
/// ```
///
/// Create from multiple documents, the format follows the extension
/// ```
/// # use hclspec::documents;
/// documents! {
///   "one.hcl" => "attribute_one = 1",
///   "two.json" => r#"{"attribute_two": 2}"#
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use hclspec::documents;
/// documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! documents {
    // single document
    { $expr:expr } => {
        $crate::documents! { "main.hcl" => $expr }
    };
    // multi document with filenames
    { $($filename:expr => $expr:expr),+ } => {{
        let mut docs = $crate::documents::Documents::default();
        $(
            let format = $crate::syntax::Format::from_path(::std::path::Path::new($filename))
                .expect("filename must end in .hcl or .json");
            let diagnostics = docs.add_source($filename, $expr.as_bytes(), format);
            assert!(diagnostics.is_empty(), "document must parse: {diagnostics}");
        )+

        docs
    }};
}
