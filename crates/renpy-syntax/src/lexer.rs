//! Token-level scanning within a single logical line.

use regex::Regex;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").expect("valid identifier regex"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?").expect("valid number regex"));

/// Characters the grammar treats as insignificant whitespace.
fn is_space(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t' | '\r' | '\n' | '\x0c' | '\u{feff}' | '\u{2060}' | '\u{200b}'
    )
}

/// A cursor over `text[pos..end]`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    end: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(text: &'a str, start: usize, end: usize) -> Self {
        Self {
            text,
            pos: start,
            end,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn end(&self) -> usize {
        self.end
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..self.end]
    }

    pub(crate) fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(is_space);
        self.pos += rest.len() - trimmed.len();
    }

    /// Next byte after skipping whitespace.
    pub(crate) fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.rest().as_bytes().first().copied()
    }

    /// Whether only whitespace and possibly a comment remain.
    pub(crate) fn at_line_end(&mut self) -> bool {
        matches!(self.peek(), None | Some(b'#'))
    }

    pub(crate) fn eat(&mut self, byte: u8) -> Option<usize> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Some(self.pos - 1)
        } else {
            None
        }
    }

    fn matched(&mut self, re: &Regex) -> Option<(usize, usize)> {
        self.skip_whitespace();
        let m = re.find(self.rest())?;
        let start = self.pos;
        self.pos += m.end();
        Some((start, self.pos))
    }

    pub(crate) fn identifier(&mut self) -> Option<(usize, usize)> {
        self.matched(&IDENTIFIER)
    }

    pub(crate) fn number(&mut self) -> Option<(usize, usize)> {
        self.matched(&NUMBER)
    }

    /// `name(.name)*`, as used for `define config.name = ...`.
    pub(crate) fn dotted_identifier(&mut self) -> Option<(usize, usize)> {
        let (start, mut end) = self.identifier()?;
        loop {
            let save = self.pos;
            if self.rest().starts_with('.') {
                self.pos += 1;
                if let Some(m) = IDENTIFIER.find(self.rest()) {
                    self.pos += m.end();
                    end = self.pos;
                    continue;
                }
            }
            self.pos = save;
            return Some((start, end));
        }
    }

    /// Consume `word` if it is the next identifier-shaped token.
    pub(crate) fn keyword(&mut self, word: &str) -> Option<(usize, usize)> {
        let save = self.pos;
        match self.identifier() {
            Some((s, e)) if &self.text[s..e] == word => Some((s, e)),
            _ => {
                self.pos = save;
                None
            }
        }
    }

    /// Peek at the next identifier-shaped word without consuming it.
    pub(crate) fn peek_word(&mut self) -> Option<&'a str> {
        let mut probe = *self;
        probe.identifier().map(|(s, e)| &self.text[s..e])
    }

    /// `#` to the end of the physical line.
    pub(crate) fn comment(&mut self) -> Option<(usize, usize)> {
        if self.peek() != Some(b'#') {
            return None;
        }
        let start = self.pos;
        let rest = self.rest();
        let len = rest.find('\n').unwrap_or(rest.len());
        let body = rest[..len].trim_end_matches('\r');
        self.pos += len;
        Some((start, start + body.len()))
    }

    /// The rest of the line up to a comment, skipping over quoted text.
    pub(crate) fn rest_of_line(&mut self) -> Option<(usize, usize)> {
        self.skip_whitespace();
        let bytes = self.rest().as_bytes();
        let mut quote: Option<u8> = None;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(_) if b == b'\\' => i += 1,
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'#' => break,
                None => {}
            }
            i += 1;
        }
        self.take_trimmed(i.min(bytes.len()))
    }

    /// A run of raw Python text inside a block line. Stops before a double quote, a
    /// backslash or a comment; single-quoted text is skipped over.
    pub(crate) fn python_run(&mut self) -> Option<(usize, usize)> {
        self.skip_whitespace();
        let bytes = self.rest().as_bytes();
        let mut in_single = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\'' => in_single = !in_single,
                b'"' | b'\\' => break,
                b'#' if !in_single => break,
                b'\n' => in_single = false,
                _ => {}
            }
            i += 1;
        }
        self.take_trimmed(i)
    }

    fn take_trimmed(&mut self, len: usize) -> Option<(usize, usize)> {
        let start = self.pos;
        let token = self.rest()[..len].trim_end_matches(is_space);
        self.pos += len;
        if token.is_empty() {
            None
        } else {
            Some((start, start + token.len()))
        }
    }

    pub(crate) fn text(&self, range: (usize, usize)) -> &'a str {
        &self.text[range.0..range.1]
    }

    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.end);
    }
}
