//! Diagnostic entries and the ordered list they accumulate in
//!
//! Every data problem (unreadable file, syntax error, unknown variable, type mismatch, ...) is reported as a
//! [Diagnostic]. Nothing in here ever aborts: callers collect into [Diagnostics] and keep going.
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Location of a diagnostic within a named source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRange {
    pub filename: String,
    /// byte range into the source text
    pub span: Range<usize>,
    /// 1-based line of `span.start`
    pub line: usize,
    /// 1-based column of `span.start`
    pub column: usize,
}

impl std::fmt::Display for SourceRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{},{}", self.filename, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub range: Option<SourceRange>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            range: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, range: Option<SourceRange>) -> Self {
        self.range = range;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::error::Error for Diagnostic {}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(range) = &self.range {
            write!(f, "{range}: ")?;
        }

        f.write_str(&self.summary)?;

        if !self.detail.is_empty() {
            write!(f, "; {}", self.detail)?;
        }

        Ok(())
    }
}

/// Ordered list of [Diagnostic]s
///
/// Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(?diagnostic, "diagnostic logged");
        self.0.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(value: Diagnostic) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(value: Vec<Diagnostic>) -> Self {
        Self(value)
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One line for a single entry, otherwise the first entry plus a count of the rest
impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("no diagnostics"),
            [single] => single.fmt(f),
            [first, rest @ ..] => write!(f, "{first}, and {} other diagnostic(s)", rest.len()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn has_errors_only_counts_error_severity() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("careful", ""));
        assert!(!diagnostics.has_errors());

        diagnostics.push(Diagnostic::error("broken", ""));
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn display_includes_range_and_detail() {
        let diagnostic = Diagnostic::error("Unknown variable", "There is no variable named \"one\".")
            .with_range(Some(SourceRange {
                filename: "main.hcl".into(),
                span: 4..7,
                line: 1,
                column: 5,
            }));

        assert_eq!(
            diagnostic.to_string(),
            "main.hcl:1,5: Unknown variable; There is no variable named \"one\"."
        );
    }

    #[test]
    fn display_summarizes_many() {
        let diagnostics: Diagnostics = vec![
            Diagnostic::error("first", ""),
            Diagnostic::error("second", ""),
            Diagnostic::warning("third", ""),
        ]
        .into();

        assert_eq!(diagnostics.to_string(), "first, and 2 other diagnostic(s)");
    }
}
