//! user facing result of an operation
//!
//! A [Report] wraps the [Diagnostics] of one operation together with the sources they point into, so they can be
//! rendered with code snippets via [codespan_reporting].
use crate::diagnostic::{Diagnostic, Diagnostics, Severity};
use crate::documents::SourceMap;
use crate::util::wrap;
use codespan_reporting::diagnostic::Label;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Ansi, NoColor};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Report {
    diagnostics: Diagnostics,
    sources: SourceMap,
}

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to write diagnostics")]
    Io(#[from] std::io::Error),
    #[error("failed to render diagnostics")]
    Files(#[from] codespan_reporting::files::Error),
}

impl Report {
    pub fn new(diagnostics: Diagnostics, sources: SourceMap) -> Self {
        Self {
            diagnostics,
            sources,
        }
    }

    pub fn raw(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_raw(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// One error per diagnostic entry, warnings included
    pub fn errs(&self) -> Vec<&(dyn std::error::Error + 'static)> {
        self.diagnostics
            .iter()
            .map(|diagnostic| diagnostic as &(dyn std::error::Error + 'static))
            .collect()
    }

    /// Renders all diagnostics as text
    ///
    /// Detail text is wrapped at `width` columns, 0 disables wrapping. Diagnostics pointing into a known source
    /// get a code snippet, all others are rendered without one.
    pub fn write_text(
        &self,
        writer: &mut dyn std::io::Write,
        width: usize,
        color: bool,
    ) -> Result<(), RenderError> {
        let mut files = SimpleFiles::new();
        let file_ids: HashMap<&str, usize> = self
            .sources
            .iter()
            .map(|(filename, source)| (filename.as_str(), files.add(filename.as_str(), &**source)))
            .collect();

        let config = term::Config::default();
        let diagnostics = self
            .diagnostics
            .iter()
            .map(|diagnostic| self.to_codespan(diagnostic, &file_ids, width));

        if color {
            let mut writer = Ansi::new(&mut *writer);
            for diagnostic in diagnostics {
                term::emit_to_write_style(&mut writer, &config, &files, &diagnostic)?;
            }
        } else {
            let mut writer = NoColor::new(&mut *writer);
            for diagnostic in diagnostics {
                term::emit_to_write_style(&mut writer, &config, &files, &diagnostic)?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn to_codespan(
        &self,
        diagnostic: &Diagnostic,
        file_ids: &HashMap<&str, usize>,
        width: usize,
    ) -> codespan_reporting::diagnostic::Diagnostic<usize> {
        let severity = match diagnostic.severity {
            Severity::Error => codespan_reporting::diagnostic::Severity::Error,
            Severity::Warning => codespan_reporting::diagnostic::Severity::Warning,
        };

        let labels = diagnostic
            .range
            .as_ref()
            .and_then(|range| {
                let file_id = *file_ids.get(range.filename.as_str())?;
                let len = self.sources.get(&range.filename)?.len();
                let start = range.span.start.min(len);
                let end = range.span.end.clamp(start, len);
                Some(Label::primary(file_id, start..end))
            })
            .into_iter()
            .collect();

        let mut notes = vec![];
        if !diagnostic.detail.is_empty() {
            notes.push(wrap(&diagnostic.detail, width));
        }

        codespan_reporting::diagnostic::Diagnostic::new(severity)
            .with_message(&diagnostic.summary)
            .with_labels(labels)
            .with_notes(notes)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.diagnostics.fmt(f)
    }
}

impl std::error::Error for Report {}

impl From<Diagnostics> for Report {
    fn from(diagnostics: Diagnostics) -> Self {
        Self::new(diagnostics, SourceMap::new())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::documents::Documents;
    use crate::syntax::Format;
    use pretty_assertions::assert_eq;

    fn render(report: &Report, width: usize, color: bool) -> String {
        let mut out = vec![];
        report.write_text(&mut out, width, color).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let warning: Report = Diagnostics::from(Diagnostic::warning("Careful", "")).into();
        assert!(!warning.has_errors());
        assert_eq!(warning.errs().len(), 1);

        let error: Report = Diagnostics::from(vec![
            Diagnostic::warning("Careful", ""),
            Diagnostic::error("Broken", ""),
        ])
        .into();
        assert!(error.has_errors());
        assert_eq!(error.errs().len(), 2);
    }

    #[test]
    fn renders_snippet_for_known_sources() {
        let mut documents = Documents::new();
        let diagnostics = documents.add_source("main.hcl", b"a = = 1\n", Format::Hcl);
        let report = Report::new(diagnostics, documents.sources());

        let text = render(&report, 0, false);

        assert!(text.contains("error: Invalid HCL syntax"), "{text}");
        assert!(text.contains("main.hcl"), "{text}");
        assert!(text.contains("a = = 1"), "{text}");
    }

    #[test]
    fn renders_without_snippet_for_unknown_sources() {
        let mut documents = Documents::new();
        let diagnostics = documents.add_source("main.hcl", b"a = = 1\n", Format::Hcl);
        let report = Report::from(diagnostics);

        let text = render(&report, 0, false);

        assert!(text.contains("error: Invalid HCL syntax"), "{text}");
        assert!(!text.contains("main.hcl"), "{text}");
    }

    #[test]
    fn wraps_detail() {
        let report: Report = Diagnostics::from(Diagnostic::error(
            "Summary that stays on one line",
            "one two three four five six",
        ))
        .into();

        let unwrapped = render(&report, 0, false);
        assert!(unwrapped.contains("Summary that stays on one line"));
        assert!(unwrapped.contains("one two three four five six"));

        let wrapped = render(&report, 10, false);
        assert!(wrapped.contains("Summary that stays on one line"));
        assert!(!wrapped.contains("one two three four five six"));
    }

    #[test]
    fn color_adds_escape_codes() {
        let report: Report = Diagnostics::from(Diagnostic::error("Broken", "")).into();

        assert!(!render(&report, 0, false).contains('\u{1b}'));
        assert!(render(&report, 0, true).contains('\u{1b}'));
    }

    #[test]
    fn display_summarizes() {
        let report: Report = Diagnostics::from(Diagnostic::error("Broken", "It is broken.")).into();
        assert_eq!(report.to_string(), "Broken; It is broken.");
    }
}
