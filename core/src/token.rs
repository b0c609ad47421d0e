//! Lexical tokens with exact source spans.
//!
//! A [`Token`] remembers both its unescaped content and the raw text it was
//! read from, plus a half-open `[col, end_col)` span. Columns are byte offsets
//! into a line; lines are zero-based. A [`LineIndex`] maps `(line, col)` pairs
//! back to absolute offsets in the original script so merged tokens always
//! slice to the exact source text, quoting included.

use serde::Serialize;

/// Maps `(line, col)` positions to absolute byte offsets in a script.
///
/// Lines are split on `\n`; a `\r` before the newline belongs to the line
/// terminator, not to the line.
///
/// # Examples
///
/// ```
/// use cli_validator_core::LineIndex;
///
/// let script = "az group list\naz vm list\n";
/// let index = LineIndex::new(script);
/// assert_eq!(index.offset(1, 3), Some(17));
/// assert_eq!(index.slice(1, 0, 1, 10), Some("az vm list"));
/// assert_eq!(index.offset(5, 0), None);
/// ```
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// `(start, end)` of each line's content, terminator excluded.
    lines: Vec<(usize, usize)>,
}

impl<'a> LineIndex<'a> {
    /// Indexes the line starts of `text`.
    pub fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for (pos, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                let end = if pos > start && text.as_bytes()[pos - 1] == b'\r' {
                    pos - 1
                } else {
                    pos
                };
                lines.push((start, end));
                start = pos + 1;
            }
        }
        if start < text.len() {
            lines.push((start, text.len()));
        }
        Self { text, lines }
    }

    /// The indexed text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Content of line `line`, without its terminator.
    pub fn line(&self, line: usize) -> Option<&'a str> {
        let (start, end) = *self.lines.get(line)?;
        self.text.get(start..end)
    }

    /// Absolute offset of `col` on `line`. A column one past the end of the
    /// line content is valid; anything further is not.
    pub fn offset(&self, line: usize, col: usize) -> Option<usize> {
        let (start, end) = *self.lines.get(line)?;
        (start + col <= end).then_some(start + col)
    }

    /// Source text between two positions.
    pub fn slice(&self, line: usize, col: usize, end_line: usize, end_col: usize) -> Option<&'a str> {
        let start = self.offset(line, col)?;
        let end = self.offset(end_line, end_col)?;
        self.text.get(start..end)
    }
}

/// An immutable lexical token.
///
/// # Examples
///
/// ```
/// use cli_validator_core::{LineIndex, Token};
///
/// let script = "x=$(az vm list)";
/// let index = LineIndex::new(script);
/// let token = Token::new("x=$(az", "x=$(az", 0, 0, 6);
///
/// // Drop the `x=$(` opener.
/// let inner = token.split_from(4);
/// assert_eq!(inner.raw, "az");
/// assert_eq!(inner.col, 4);
///
/// let tail = Token::new("list)", "list)", 0, 10, 15);
/// let merged = inner.merge(&tail, &index).unwrap();
/// assert_eq!(merged.raw, "az vm list)");
/// assert_eq!(merged.split_to(1).raw, "az vm list");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Unescaped content, quotes removed.
    pub content: String,
    /// Text exactly as it appears in the source.
    pub raw: String,
    /// Start line.
    pub line: usize,
    /// Start column.
    pub col: usize,
    /// End line.
    pub end_line: usize,
    /// End column (exclusive).
    pub end_col: usize,
}

impl Token {
    /// Creates a token that starts and ends on the same line.
    pub fn new(
        content: impl Into<String>,
        raw: impl Into<String>,
        line: usize,
        col: usize,
        end_col: usize,
    ) -> Self {
        Self {
            content: content.into(),
            raw: raw.into(),
            line,
            col,
            end_line: line,
            end_col,
        }
    }

    /// Drops the first `pos` bytes of the token.
    pub fn split_from(&self, pos: usize) -> Self {
        Self {
            content: self.content.get(pos..).unwrap_or_default().to_string(),
            raw: self.raw.get(pos..).unwrap_or_default().to_string(),
            line: self.line,
            col: self.col + pos,
            end_line: self.end_line,
            end_col: self.end_col,
        }
    }

    /// Drops the last `pos_from_right` bytes of the token.
    pub fn split_to(&self, pos_from_right: usize) -> Self {
        let content_end = self.content.len().saturating_sub(pos_from_right);
        let raw_end = self.raw.len().saturating_sub(pos_from_right);
        Self {
            content: self.content.get(..content_end).unwrap_or_default().to_string(),
            raw: self.raw.get(..raw_end).unwrap_or_default().to_string(),
            line: self.line,
            col: self.col,
            end_line: self.end_line,
            end_col: self.end_col.saturating_sub(pos_from_right),
        }
    }

    /// Joins this token with a later one into a single token spanning all the
    /// source text between them.
    ///
    /// Returns `None` when either position falls outside `index`.
    pub fn merge(&self, other: &Token, index: &LineIndex<'_>) -> Option<Self> {
        let raw = index.slice(self.line, self.col, other.end_line, other.end_col)?;
        Some(Self {
            content: raw.trim_matches(|c| c == '\'' || c == '"').to_string(),
            raw: raw.to_string(),
            line: self.line,
            col: self.col,
            end_line: other.end_line,
            end_col: other.end_col,
        })
    }

    /// `(line, col, end_line, end_col)` of the token.
    pub fn span(&self) -> (usize, usize, usize, usize) {
        (self.line, self.col, self.end_line, self.end_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_handles_crlf() {
        let script = "az a\r\naz b\r\n";
        let index = LineIndex::new(script);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.line(0), Some("az a"));
        assert_eq!(index.line(1), Some("az b"));
        assert_eq!(index.offset(1, 0), Some(6));
        assert_eq!(index.offset(0, 5), None);
    }

    #[test]
    fn test_line_index_without_trailing_newline() {
        let index = LineIndex::new("one\ntwo");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.slice(0, 0, 1, 3), Some("one\ntwo"));
    }

    #[test]
    fn test_merge_across_lines_keeps_raw_source() {
        let script = "az vm create \\\n  --name \"my vm\"";
        let index = LineIndex::new(script);
        let first = Token::new("az", "az", 0, 0, 2);
        let last = Token::new("my vm", "\"my vm\"", 1, 9, 16);
        let merged = first.merge(&last, &index).unwrap();
        assert_eq!(merged.raw, "az vm create \\\n  --name \"my vm\"");
        assert_eq!(merged.span(), (0, 0, 1, 16));
    }

    #[test]
    fn test_merge_strips_outer_quotes_from_content() {
        let script = "'abc'";
        let index = LineIndex::new(script);
        let token = Token::new("abc", "'abc'", 0, 0, 5);
        let merged = token.merge(&token, &index).unwrap();
        assert_eq!(merged.content, "abc");
        assert_eq!(merged.raw, "'abc'");
    }

    #[test]
    fn test_split_to_past_start_is_empty() {
        let token = Token::new(")", ")", 0, 4, 5);
        let trimmed = token.split_to(3);
        assert_eq!(trimmed.raw, "");
        assert_eq!(trimmed.end_col, 2);
    }
}
