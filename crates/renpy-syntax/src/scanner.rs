//! Layout scanner.
//!
//! Ren'Py is indentation sensitive, so the grammar relies on three external tokens:
//! `_newline`, `_indent` and `_dedent`. This module produces the information those
//! tokens describe. [`scan`] splits a document into logical lines (physical lines joined
//! while brackets or triple-quoted strings are open) and measures their indentation;
//! [`IndentStack`] decides where blocks open and close.

const BOM: &str = "\u{feff}";

/// Classification of a logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Only whitespace.
    Blank,
    /// Only a comment. Never opens or closes a block.
    Comment,
    /// Anything else.
    Code,
}

/// One logical line of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalLine {
    /// Indentation width in columns.
    pub indent: usize,
    /// Byte offset of the first non-whitespace character.
    pub start: usize,
    /// Byte offset just past the last non-whitespace character.
    pub end: usize,
    /// Byte offset just past the line terminator.
    pub line_end: usize,
    /// Row of the first physical line.
    pub row: usize,
    /// Line classification.
    pub kind: LineKind,
}

impl LogicalLine {
    /// Byte range of the line content.
    pub fn content(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single(u8),
    Triple(u8),
}

/// Split `text` into logical lines.
pub fn scan(text: &str) -> Vec<LogicalLine> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut lines = Vec::new();
    let mut pos = if text.starts_with(BOM) { BOM.len() } else { 0 };
    let mut row = 0;

    while pos < len {
        let mut indent = 0;
        let mut i = pos;
        while i < len {
            match bytes[i] {
                b' ' => indent += 1,
                b'\t' => indent = (indent / 8 + 1) * 8,
                0x0c => indent = 0,
                _ => break,
            }
            i += 1;
        }

        let start = i;
        let first_row = row;
        let mut depth = 0usize;
        let mut quote: Option<Quote> = None;
        let (content_end, line_end) = loop {
            if i >= len {
                break (len, len);
            }
            let b = bytes[i];

            if let Some(q) = quote {
                match q {
                    _ if b == b'\\' => {
                        if bytes.get(i + 1) == Some(&b'\n') {
                            row += 1;
                        }
                        i += 2;
                        continue;
                    }
                    Quote::Triple(c) if b == c && bytes[i..].starts_with(&[c, c, c]) => {
                        quote = None;
                        i += 3;
                        continue;
                    }
                    Quote::Single(c) if b == c => {
                        quote = None;
                        i += 1;
                        continue;
                    }
                    Quote::Triple(_) if b == b'\n' => {
                        row += 1;
                        i += 1;
                        continue;
                    }
                    // An unterminated single-line string ends with the line.
                    Quote::Single(_) if b == b'\n' => quote = None,
                    _ => {
                        i += 1;
                        continue;
                    }
                }
            }

            match b {
                b'#' => {
                    while i < len && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'"' | b'\'' => {
                    if bytes[i..].starts_with(&[b, b, b]) {
                        quote = Some(Quote::Triple(b));
                        i += 3;
                        continue;
                    }
                    quote = Some(Quote::Single(b));
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b'\n' if depth > 0 => row += 1,
                b'\n' => break (i, i + 1),
                _ => {}
            }
            i += 1;
        };

        let mut end = content_end;
        while end > start && matches!(bytes[end - 1], b' ' | b'\t' | b'\r' | 0x0c) {
            end -= 1;
        }

        let kind = if end == start {
            LineKind::Blank
        } else if bytes[start] == b'#' {
            LineKind::Comment
        } else {
            LineKind::Code
        };

        lines.push(LogicalLine {
            indent,
            start,
            end,
            line_end,
            row: first_row,
            kind,
        });

        row += 1;
        pos = line_end;
    }

    lines
}

/// Outcome of closing blocks down to a given indentation width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dedent {
    /// The width matches an enclosing block; carries the number of blocks closed.
    Exact(usize),
    /// The width lies between two enclosing levels; carries the number of blocks closed.
    InconsistentDedent(usize),
}

impl Dedent {
    /// Number of blocks closed.
    pub fn count(self) -> usize {
        match self {
            Dedent::Exact(n) | Dedent::InconsistentDedent(n) => n,
        }
    }
}

/// Stack of open indentation levels. The outermost level (width 0) is never popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStack {
    widths: Vec<usize>,
}

impl Default for IndentStack {
    fn default() -> Self {
        Self::new()
    }
}

impl IndentStack {
    /// A stack holding only the top-level width 0.
    pub fn new() -> Self {
        Self { widths: vec![0] }
    }

    /// Width of the innermost open level.
    pub fn current(&self) -> usize {
        self.widths.last().copied().unwrap_or(0)
    }

    /// Number of open blocks, not counting the top level.
    pub fn depth(&self) -> usize {
        self.widths.len() - 1
    }

    /// Open a block at `width`. Returns `false` (and does nothing) unless `width` is
    /// deeper than the current level.
    pub fn push(&mut self, width: usize) -> bool {
        if width <= self.current() {
            return false;
        }
        self.widths.push(width);
        true
    }

    /// Close the innermost block, if any.
    pub fn pop(&mut self) -> Option<usize> {
        if self.widths.len() > 1 {
            self.widths.pop()
        } else {
            None
        }
    }

    /// Close every block deeper than `width`.
    pub fn dedent_to(&mut self, width: usize) -> Dedent {
        let mut closed = 0;
        while self.current() > width && self.pop().is_some() {
            closed += 1;
        }
        if self.current() == width {
            Dedent::Exact(closed)
        } else {
            Dedent::InconsistentDedent(closed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(usize, LineKind)> {
        scan(text).iter().map(|l| (l.indent, l.kind)).collect()
    }

    #[test]
    fn test_indent_widths() {
        let lines = scan("a\n    b\n\tc\n  \td\n\x0c  e\n");
        let indents: Vec<usize> = lines.iter().map(|l| l.indent).collect();
        assert_eq!(indents, vec![0, 4, 8, 8, 2]);
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(
            kinds("label a:\n\n    # note\n   \n    x\n"),
            vec![
                (0, LineKind::Code),
                (0, LineKind::Blank),
                (4, LineKind::Comment),
                (3, LineKind::Blank),
                (4, LineKind::Code),
            ]
        );
    }

    #[test]
    fn test_crlf_and_trailing_whitespace_are_trimmed() {
        let text = "show a  \r\nhide b\r\n";
        let lines = scan(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(&text[lines[0].content()], "show a");
        assert_eq!(lines[0].line_end, 10);
        assert_eq!(&text[lines[1].content()], "hide b");
        assert_eq!(lines[1].row, 1);
    }

    #[test]
    fn test_bom_is_skipped() {
        let text = "\u{feff}label a:\n";
        let lines = scan(text);
        assert_eq!(lines[0].indent, 0);
        assert_eq!(&text[lines[0].content()], "label a:");
    }

    #[test]
    fn test_brackets_join_physical_lines() {
        let text = "show eileen at (\n    left,\n  right)\nhide eileen\n";
        let lines = scan(text);
        assert_eq!(lines.len(), 2);
        assert!(text[lines[0].content()].ends_with("right)"));
        assert_eq!(lines[1].row, 3);
        assert_eq!(&text[lines[1].content()], "hide eileen");
    }

    #[test]
    fn test_brackets_inside_strings_and_comments_are_ignored() {
        let text = "e \"(\" # (\nx\n";
        assert_eq!(scan(text).len(), 2);
    }

    #[test]
    fn test_unmatched_closer_is_ignored() {
        assert_eq!(scan(")\nx\n").len(), 2);
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let text = "e \"\"\"one\ntwo\n\"\"\"\nx\n";
        let lines = scan(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].row, 3);
    }

    #[test]
    fn test_unterminated_string_ends_at_line() {
        let text = "e \"open\nx\n";
        assert_eq!(scan(text).len(), 2);
    }

    #[test]
    fn test_last_line_without_newline() {
        let text = "a\nb";
        let lines = scan(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line_end, 3);
    }

    #[test]
    fn test_indent_stack() {
        let mut stack = IndentStack::new();
        assert!(stack.push(4));
        assert!(stack.push(8));
        assert!(!stack.push(8));
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.dedent_to(4), Dedent::Exact(1));
        assert_eq!(stack.current(), 4);

        assert!(stack.push(8));
        assert_eq!(stack.dedent_to(2), Dedent::InconsistentDedent(2));
        assert_eq!(stack.current(), 0);
        assert_eq!(stack.pop(), None);
    }
}
