//! the two supported source syntaxes
//!
//! Both parsers produce the same [Body] representation, so nothing downstream cares which syntax a document
//! was written in.
use crate::body::Body;
use crate::diagnostic::{Diagnostic, Diagnostics};
use std::path::Path;

pub mod json;
pub mod native;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// native block syntax (`.hcl`)
    Hcl,
    /// JSON syntax (`.json`)
    Json,
}

impl Format {
    /// Detects the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "hcl" => Some(Format::Hcl),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Hcl => "HCL",
            Format::Json => "JSON",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses raw source bytes
///
/// On error the returned body holds whatever could be recovered, which may be nothing.
pub fn parse(src: &[u8], filename: &str, format: Format) -> (Body, Diagnostics) {
    let Ok(src) = std::str::from_utf8(src) else {
        return (
            Body::default(),
            Diagnostic::error(
                "Invalid UTF-8",
                format!("The {format} file {filename:?} is not valid UTF-8."),
            )
            .into(),
        );
    };

    match format {
        Format::Hcl => native::parse(src, filename),
        Format::Json => json::parse(src, filename),
    }
}
