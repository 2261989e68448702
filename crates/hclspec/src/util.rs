use crate::diagnostic::SourceRange;
use codespan_reporting::files::{line_starts, Files, SimpleFile};
use std::ops::Range;

/// Byte offset <-> line/column lookup for one named source
pub(crate) struct SourceIndex<'a> {
    file: SimpleFile<&'a str, &'a str>,
    line_starts: Vec<usize>,
}

impl<'a> SourceIndex<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self {
            file: SimpleFile::new(filename, source),
            line_starts: line_starts(source).collect(),
        }
    }

    /// 1-based line and column of a byte offset
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.file.source().len());
        match self.file.location((), offset) {
            Ok(location) => (location.line_number, location.column_number),
            Err(_) => (self.line_starts.len(), 1),
        }
    }

    /// Byte offset of a 1-based line and (byte) column, clamped to the source
    pub fn offset(&self, line: usize, column: usize) -> usize {
        let len = self.file.source().len();
        let Some(line_start) = self.line_starts.get(line.saturating_sub(1)) else {
            return len;
        };

        (line_start + column.saturating_sub(1)).min(len)
    }

    pub fn range(&self, span: Range<usize>) -> SourceRange {
        let (line, column) = self.position(span.start);
        SourceRange {
            filename: self.file.name().to_string(),
            span,
            line,
            column,
        }
    }
}

/// Greedy word wrap. A `width` of 0 returns the text unchanged.
pub(crate) fn wrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_owned();
    }

    let mut wrapped = String::with_capacity(text.len());
    for (index, paragraph) in text.split('\n').enumerate() {
        if index > 0 {
            wrapped.push('\n');
        }

        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            if line_len > 0 && line_len + 1 + word.len() > width {
                wrapped.push('\n');
                line_len = 0;
            } else if line_len > 0 {
                wrapped.push(' ');
                line_len += 1;
            }

            wrapped.push_str(word);
            line_len += word.len();
        }
    }

    wrapped
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn positions() {
        let index = SourceIndex::new("main.hcl", "one = 1\ntwo = 2\n");

        assert_eq!(index.position(0), (1, 1));
        assert_eq!(index.position(8), (2, 1));
        assert_eq!(index.position(14), (2, 7));
        assert_eq!(index.offset(2, 7), 14);
        assert_eq!(index.offset(9, 1), 16);
        assert_eq!(index.range(8..11).filename, "main.hcl");
    }

    #[test]
    fn columns_count_characters() {
        let index = SourceIndex::new("main.hcl", "é = 1");

        assert_eq!(index.position(3), (1, 3));
    }

    #[test]
    fn wrap_words() {
        assert_eq!(wrap("aaa bbb ccc", 0), "aaa bbb ccc");
        assert_eq!(wrap("aaa bbb ccc", 7), "aaa bbb\nccc");
        assert_eq!(wrap("aaaaaaaaa b", 4), "aaaaaaaaa\nb");
    }
}
