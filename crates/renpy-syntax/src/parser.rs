//! Indentation-aware recursive descent parser for Ren'Py.
//!
//! The parser walks the logical lines produced by [`crate::scanner::scan`]. Block
//! structure is driven by an [`IndentStack`]; everything inside a line is tokenized by
//! the crate's lexer. Each line is tried against the grammar's alternatives in order and
//! rolled back on failure, so parsing never fails: input that matches nothing becomes an
//! `ERROR` node.

use crate::error::LanguageError;
use crate::grammar::symbols::{
    ARGUMENTS, BLOCK, COLON, COMMA, COMMENT, CONTROL_STATEMENT, DEFINE_STATEMENT, DOLLAR,
    DOUBLE_QUOTE, EQUALS, ERROR, ESCAPE_INTERPOLATION, ESCAPE_SEQUENCE, FIELD_ARGS, FIELD_BODY,
    FIELD_IDENTIFIER, FIELD_KEYWORD, FIELD_PRIORITY, HEADER, IDENTIFIER, LPAREN, NUMBER, PYTHON,
    PYTHON_BLOCK, PYTHON_EXPRESSION, PYTHON_INLINE, RENPY_STATEMENT, RPAREN, SINGLE_QUOTE,
    SOURCE_FILE, STATEMENT, STRING, TRIPLE_DOUBLE_QUOTE, TRIPLE_SINGLE_QUOTE,
};
use crate::grammar::{Language, MIN_COMPATIBLE_LANGUAGE_VERSION, LANGUAGE_VERSION, Symbol};
use crate::lexer::Lexer;
use crate::scanner::{Dedent, IndentStack, LineKind, LogicalLine, scan};
use crate::tree::{Child, Tree, TreeBuilder};

/// Bytes that may follow a backslash inside a string to form an `escape_sequence`.
const ESCAPABLE: &[u8] = b"'\"%\\nt[{ ";

/// Parses Ren'Py source into a [`Tree`].
///
/// ```
/// use renpy_syntax::{Parser, language};
///
/// let mut parser = Parser::new();
/// parser.set_language(language()).unwrap();
/// let tree = parser.parse("label start:\n    show eileen happy\n").unwrap();
/// assert!(!tree.root_node().has_error());
/// ```
#[derive(Debug, Default)]
pub struct Parser {
    language: Option<&'static Language>,
}

impl Parser {
    /// Create a parser with no language assigned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the grammar used by subsequent [`Parser::parse`] calls.
    pub fn set_language(&mut self, language: &'static Language) -> Result<(), LanguageError> {
        let version = language.abi_version();
        if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&version) {
            return Err(LanguageError::Version {
                version,
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            });
        }
        self.language = Some(language);
        Ok(())
    }

    /// The assigned grammar, if any.
    pub fn language(&self) -> Option<&'static Language> {
        self.language
    }

    /// Parse a whole document.
    ///
    /// Returns `None` only when no language has been assigned. Malformed input is
    /// represented with `ERROR` and missing nodes inside the returned tree.
    pub fn parse(&mut self, text: &str) -> Option<Tree> {
        let language = self.language?;
        Some(parse_document(language, text))
    }
}

pub(crate) fn parse_document(language: &'static Language, text: &str) -> Tree {
    let lines = scan(text);
    tracing::debug!(bytes = text.len(), lines = lines.len(), "parsing document");

    let mut state = ParseState {
        language,
        text,
        lines,
        pos: 0,
        builder: TreeBuilder::new(text),
        indents: IndentStack::new(),
        pending_dedents: 0,
        misaligned: false,
    };
    let items = state.source_file();
    let tree = state.builder.finish(language, SOURCE_FILE, items);

    tracing::debug!(
        nodes = tree.node_count(),
        has_error = tree.root_node().has_error(),
        "parsed document"
    );
    tree
}

type LineParser<'a> = fn(&mut ParseState<'a>, LogicalLine, &mut Vec<Child>) -> bool;
type StatementParser<'a> = fn(&mut ParseState<'a>, LogicalLine, &mut Vec<Child>) -> Option<usize>;

struct ParseState<'a> {
    language: &'static Language,
    text: &'a str,
    lines: Vec<LogicalLine>,
    pos: usize,
    builder: TreeBuilder<'a>,
    indents: IndentStack,
    // Blocks still to be closed after the innermost one returned.
    pending_dedents: usize,
    // The next line dedented to a width no enclosing block uses.
    misaligned: bool,
}

impl<'a> ParseState<'a> {
    fn source_file(&mut self) -> Vec<Child> {
        let mut items = Vec::new();
        while let Some(line) = self.lines.get(self.pos).copied() {
            self.pending_dedents = 0;
            match line.kind {
                LineKind::Blank => self.pos += 1,
                LineKind::Comment => {
                    items.push(self.comment_line(line));
                    self.pos += 1;
                }
                LineKind::Code if line.indent > 0 && !self.misaligned => {
                    let block = self.block();
                    items.push(Child::plain(block));
                }
                LineKind::Code => self.line_item(true, &mut items),
            }
        }
        items
    }

    /// Parse an indented block starting at the current line.
    fn block(&mut self) -> usize {
        let first = self.lines[self.pos];
        let level = first.indent;
        self.indents.push(level);
        tracing::trace!(row = first.row, level, "open block");

        let mut children = Vec::new();
        loop {
            if self.pending_dedents > 0 {
                self.pending_dedents -= 1;
                break;
            }
            let Some(line) = self.lines.get(self.pos).copied() else {
                self.indents.pop();
                break;
            };
            match line.kind {
                LineKind::Blank => self.pos += 1,
                LineKind::Comment => {
                    let next = self
                        .next_code_line(self.pos + 1)
                        .map(|i| self.lines[i].indent);
                    if line.indent >= level || next.is_some_and(|w| w >= level) {
                        children.push(self.comment_line(line));
                        self.pos += 1;
                    } else {
                        self.dedent(next.unwrap_or(0));
                        break;
                    }
                }
                LineKind::Code if line.indent < level => {
                    self.dedent(line.indent);
                    break;
                }
                LineKind::Code if line.indent > level && !self.misaligned => {
                    let nested = self.block();
                    children.push(Child::plain(nested));
                }
                LineKind::Code => self.line_item(false, &mut children),
            }
        }
        self.builder.node(BLOCK, children, first.start)
    }

    fn dedent(&mut self, width: usize) {
        let outcome = self.indents.dedent_to(width);
        self.pending_dedents = outcome.count().saturating_sub(1);
        if let Dedent::InconsistentDedent(_) = outcome {
            tracing::debug!(width, "dedent does not match any enclosing block");
            self.misaligned = true;
        }
    }

    fn line_item(&mut self, top_level: bool, out: &mut Vec<Child>) {
        let line = self.lines[self.pos];
        self.pos += 1;
        let misaligned = std::mem::take(&mut self.misaligned);
        let first = out.len();

        let top: [LineParser<'a>; 5] = [
            Self::python_block,
            Self::header,
            Self::statement,
            Self::string_line,
            Self::error_line,
        ];
        let nested: [LineParser<'a>; 4] = [
            Self::python_block,
            Self::python_inline,
            Self::statement,
            Self::block_line,
        ];
        let parsers: &[LineParser<'a>] = if top_level { &top } else { &nested };
        for parse in parsers {
            if self.attempt(*parse, line, out) {
                break;
            }
        }

        if misaligned {
            let items: Vec<Child> = out.drain(first..).collect();
            if items.len() == 1 && self.builder.kind_of(items[0].index) == ERROR {
                out.extend(items);
            } else {
                let error = self.builder.node(ERROR, items, line.start);
                out.push(Child::plain(error));
            }
        }
    }

    fn attempt(&mut self, parse: LineParser<'a>, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let checkpoint = self.builder.checkpoint();
        let len = out.len();
        if parse(self, line, out) {
            return true;
        }
        self.builder.rollback(checkpoint);
        out.truncate(len);
        false
    }

    fn header(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let mut lex = self.lexer(line);
        if !lex
            .peek_word()
            .is_some_and(|w| self.language.is_header_keyword(w))
        {
            return false;
        }
        let Some(keyword) = self.keyword(&mut lex) else {
            return false;
        };
        let mut children = vec![Child::field(keyword, FIELD_KEYWORD)];

        if let Some(range) = lex.number() {
            children.push(Child::field(self.leaf(NUMBER, range), FIELD_PRIORITY));
        }
        if let Some(range) = lex.dotted_identifier() {
            children.push(Child::field(self.leaf(IDENTIFIER, range), FIELD_IDENTIFIER));
        }
        if lex.peek() == Some(b'(') {
            let Some(args) = self.arguments(&mut lex) else {
                return false;
            };
            children.push(Child::field(args, FIELD_ARGS));
        }

        let colon = match lex.eat(b':') {
            Some(at) => self.builder.leaf(COLON, at, at + 1),
            None if lex.at_line_end() && self.body_follows(line) => {
                let at = self.builder.end_of(children[children.len() - 1].index);
                self.builder.missing(COLON, at)
            }
            None => return false,
        };
        children.push(Child::plain(colon));
        if !self.finish_line(&mut lex, &mut children) {
            return false;
        }

        let at = self.builder.end_of(colon);
        let body = self.body(line, &mut children, at);
        children.push(Child::field(body, FIELD_BODY));

        let header = self.builder.node(HEADER, children, line.start);
        out.push(Child::plain(header));
        true
    }

    fn python_block(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let mut lex = self.lexer(line);
        let mut children = Vec::new();

        if lex
            .peek_word()
            .is_some_and(|w| self.language.is_python_block_prefix(w))
        {
            let Some(keyword) = self.keyword(&mut lex) else {
                return false;
            };
            children.push(Child::field(keyword, FIELD_KEYWORD));
            if let Some(range) = lex.number() {
                children.push(Child::field(self.leaf(NUMBER, range), FIELD_PRIORITY));
            }
        }

        let Some(python) = lex.keyword("python") else {
            return false;
        };
        children.push(Child::plain(self.leaf(PYTHON, python)));
        while let Some(range) = lex.identifier() {
            children.push(Child::plain(self.leaf(IDENTIFIER, range)));
        }
        let Some(at) = lex.eat(b':') else {
            return false;
        };
        children.push(Child::plain(self.builder.leaf(COLON, at, at + 1)));
        if !self.finish_line(&mut lex, &mut children) {
            return false;
        }

        let before = self.builder.checkpoint();
        self.python_body(line, &mut children);
        let has_code = (before..self.builder.checkpoint())
            .any(|i| self.builder.kind_of(i) == PYTHON_EXPRESSION);
        if !has_code {
            let at = self.builder.end_of(children[children.len() - 1].index);
            children.push(Child::plain(self.builder.missing(PYTHON_EXPRESSION, at)));
        }

        let block = self.builder.node(PYTHON_BLOCK, children, line.start);
        out.push(Child::plain(block));
        true
    }

    /// Raw Python lines indented deeper than `owner`.
    fn python_body(&mut self, owner: LogicalLine, children: &mut Vec<Child>) {
        while let Some(line) = self.lines.get(self.pos).copied() {
            let inside = match line.kind {
                LineKind::Blank => true,
                LineKind::Code => line.indent > owner.indent,
                LineKind::Comment => {
                    line.indent > owner.indent
                        || self
                            .next_code_line(self.pos + 1)
                            .is_some_and(|i| self.lines[i].indent > owner.indent)
                }
            };
            if !inside {
                break;
            }
            self.pos += 1;
            match line.kind {
                LineKind::Blank => {}
                LineKind::Comment => children.push(self.comment_line(line)),
                LineKind::Code => {
                    let mut lex = self.lexer(line);
                    loop {
                        if let Some(range) = lex.rest_of_line() {
                            children.push(Child::plain(self.leaf(PYTHON_EXPRESSION, range)));
                        }
                        match lex.comment() {
                            Some(range) => children.push(self.comment(range)),
                            None => break,
                        }
                    }
                }
            }
        }
    }

    fn python_inline(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let mut lex = self.lexer(line);
        let Some(at) = lex.eat(b'$') else {
            return false;
        };
        let dollar = self.builder.leaf(DOLLAR, at, at + 1);
        let expression = match lex.rest_of_line() {
            Some(range) => self.leaf(PYTHON_EXPRESSION, range),
            None => self.builder.missing(PYTHON_EXPRESSION, at + 1),
        };
        let inline = self.builder.node(
            PYTHON_INLINE,
            vec![Child::plain(dollar), Child::plain(expression)],
            at,
        );
        out.push(Child::plain(inline));
        self.finish_line(&mut lex, out)
    }

    fn statement(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let mut lex = self.lexer(line);
        let Some(word) = lex.peek_word() else {
            return false;
        };
        let language = self.language;
        let candidates: [(bool, StatementParser<'a>); 3] = [
            (language.is_control_keyword(word), Self::control_statement),
            (language.is_definition_keyword(word), Self::define_statement),
            (language.is_statement_keyword(word), Self::renpy_statement),
        ];

        for (applies, parse) in candidates {
            if !applies {
                continue;
            }
            let checkpoint = self.builder.checkpoint();
            let mut trailing = Vec::new();
            if let Some(node) = parse(self, line, &mut trailing) {
                let statement = self
                    .builder
                    .node(STATEMENT, vec![Child::plain(node)], line.start);
                out.push(Child::plain(statement));
                out.extend(trailing);
                return true;
            }
            self.builder.rollback(checkpoint);
        }
        false
    }

    fn control_statement(
        &mut self,
        line: LogicalLine,
        trailing: &mut Vec<Child>,
    ) -> Option<usize> {
        let mut lex = self.lexer(line);
        let keyword = self.keyword(&mut lex)?;
        let (start, end) = lex.rest_of_line()?;
        let source = self.text;
        let mut children = vec![Child::field(keyword, FIELD_KEYWORD)];

        match source[start..end].strip_suffix(':') {
            Some(condition) => {
                let condition = condition.trim_end();
                if condition.is_empty() {
                    return None;
                }
                let expression = self.leaf(PYTHON_EXPRESSION, (start, start + condition.len()));
                children.push(Child::plain(expression));
                children.push(Child::plain(self.builder.leaf(COLON, end - 1, end)));
                if !self.finish_line(&mut lex, &mut children) {
                    return None;
                }
                let body = self.body(line, &mut children, end);
                children.push(Child::field(body, FIELD_BODY));
            }
            None => {
                children.push(Child::plain(self.leaf(PYTHON_EXPRESSION, (start, end))));
                if !self.finish_line(&mut lex, trailing) {
                    return None;
                }
            }
        }

        Some(self.builder.node(CONTROL_STATEMENT, children, line.start))
    }

    fn define_statement(
        &mut self,
        line: LogicalLine,
        trailing: &mut Vec<Child>,
    ) -> Option<usize> {
        let mut lex = self.lexer(line);
        let keyword = self.keyword(&mut lex)?;
        let name = lex.dotted_identifier()?;
        let equals = lex.eat(b'=')?;

        let mut children = vec![
            Child::field(keyword, FIELD_KEYWORD),
            Child::plain(self.leaf(IDENTIFIER, name)),
            Child::plain(self.builder.leaf(EQUALS, equals, equals + 1)),
        ];
        let value = match lex.rest_of_line() {
            Some(range) => self.leaf(PYTHON_EXPRESSION, range),
            None => self.builder.missing(PYTHON_EXPRESSION, equals + 1),
        };
        children.push(Child::plain(value));
        if !self.finish_line(&mut lex, trailing) {
            return None;
        }

        Some(self.builder.node(DEFINE_STATEMENT, children, line.start))
    }

    fn renpy_statement(
        &mut self,
        line: LogicalLine,
        trailing: &mut Vec<Child>,
    ) -> Option<usize> {
        let mut lex = self.lexer(line);
        let keyword = self.keyword(&mut lex)?;
        let mut children = vec![Child::field(keyword, FIELD_KEYWORD)];
        let mut args = 0usize;

        let colon = loop {
            match lex.peek() {
                None | Some(b'#') => break None,
                Some(b':') => break lex.eat(b':'),
                Some(b'"' | b'\'') => {
                    let string = self.string(&mut lex);
                    children.push(Child::plain(string));
                }
                Some(b'(') => {
                    let arguments = self.arguments(&mut lex)?;
                    children.push(Child::plain(arguments));
                }
                Some(b) if b.is_ascii_digit() || b == b'+' || b == b'-' => {
                    let range = lex.number()?;
                    children.push(Child::plain(self.leaf(NUMBER, range)));
                }
                Some(_) => {
                    let range = lex.identifier()?;
                    children.push(Child::plain(self.leaf(IDENTIFIER, range)));
                }
            }
            args += 1;
        };

        match colon {
            Some(at) => {
                children.push(Child::plain(self.builder.leaf(COLON, at, at + 1)));
                if !self.finish_line(&mut lex, &mut children) {
                    return None;
                }
                let body = self.body(line, &mut children, at + 1);
                children.push(Child::field(body, FIELD_BODY));
            }
            None if args == 0 => return None,
            None => {
                if !self.finish_line(&mut lex, trailing) {
                    return None;
                }
            }
        }

        Some(self.builder.node(RENPY_STATEMENT, children, line.start))
    }

    /// A line of dialogue or raw Python inside a block: an alternating run of
    /// `python_expression` and `string` nodes.
    fn block_line(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let mut lex = self.lexer(line);
        if lex.peek() == Some(b'\'') {
            out.push(Child::plain(self.string(&mut lex)));
        }
        loop {
            match lex.peek() {
                None => break,
                Some(b'#') => {
                    if let Some(range) = lex.comment() {
                        out.push(self.comment(range));
                    }
                }
                Some(b'"') => out.push(Child::plain(self.string(&mut lex))),
                Some(b'\\') => {
                    let at = lex.pos();
                    lex.set_pos(at + 1);
                    out.push(Child::plain(self.builder.leaf(ERROR, at, at + 1)));
                }
                Some(_) => {
                    if let Some(range) = lex.python_run() {
                        out.push(Child::plain(self.leaf(PYTHON_EXPRESSION, range)));
                    }
                }
            }
        }
        true
    }

    /// Top-level dialogue: one or more strings.
    fn string_line(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        let mut lex = self.lexer(line);
        let mut any = false;
        while matches!(lex.peek(), Some(b'"' | b'\'')) {
            out.push(Child::plain(self.string(&mut lex)));
            any = true;
        }
        any && self.finish_line(&mut lex, out)
    }

    fn error_line(&mut self, line: LogicalLine, out: &mut Vec<Child>) -> bool {
        tracing::debug!(row = line.row, "unrecognized top-level line");
        let mut lex = self.lexer(line);
        loop {
            if let Some((start, end)) = lex.rest_of_line() {
                out.push(Child::plain(self.builder.leaf(ERROR, start, end)));
            }
            match lex.comment() {
                Some(range) => out.push(self.comment(range)),
                None => break,
            }
        }
        true
    }

    fn string(&mut self, lex: &mut Lexer<'a>) -> usize {
        lex.skip_whitespace();
        let source = self.text;
        let bytes = source.as_bytes();
        let start = lex.pos();
        let end = lex.end();
        let quote = bytes[start];
        let triple = bytes[start..end].starts_with(&[quote; 3]);
        let (delimiter, width): (Symbol, usize) = match (quote, triple) {
            (b'"', true) => (TRIPLE_DOUBLE_QUOTE, 3),
            (b'"', false) => (DOUBLE_QUOTE, 1),
            (_, true) => (TRIPLE_SINGLE_QUOTE, 3),
            (_, false) => (SINGLE_QUOTE, 1),
        };

        let mut children = vec![Child::plain(
            self.builder.leaf(delimiter, start, start + width),
        )];
        let mut i = start + width;
        let closed = loop {
            if i >= end {
                break None;
            }
            match bytes[i] {
                b'\\' if i + 1 < end && ESCAPABLE.contains(&bytes[i + 1]) => {
                    children.push(Child::plain(self.builder.leaf(ESCAPE_SEQUENCE, i, i + 2)));
                    i += 2;
                }
                b'\\' => i = (i + 2).min(end),
                b @ (b'[' | b'{') if i + 1 < end && bytes[i + 1] == b => {
                    children.push(Child::plain(
                        self.builder.leaf(ESCAPE_INTERPOLATION, i, i + 2),
                    ));
                    i += 2;
                }
                b if b == quote && (!triple || bytes[i..end].starts_with(&[quote; 3])) => {
                    break Some(i);
                }
                b'\n' if !triple => break None,
                _ => i += 1,
            }
        };

        match closed {
            Some(at) => {
                children.push(Child::plain(self.builder.leaf(delimiter, at, at + width)));
                lex.set_pos(at + width);
            }
            None => {
                tracing::trace!(start, "unterminated string");
                children.push(Child::plain(self.builder.missing(delimiter, i)));
                lex.set_pos(i);
            }
        }
        self.builder.node(STRING, children, start)
    }

    fn arguments(&mut self, lex: &mut Lexer<'a>) -> Option<usize> {
        let open = lex.eat(b'(')?;
        let mut children = vec![Child::plain(self.builder.leaf(LPAREN, open, open + 1))];
        if let Some(close) = lex.eat(b')') {
            children.push(Child::plain(self.builder.leaf(RPAREN, close, close + 1)));
        } else {
            loop {
                let range = lex.identifier()?;
                children.push(Child::plain(self.leaf(IDENTIFIER, range)));
                if let Some(comma) = lex.eat(b',') {
                    children.push(Child::plain(self.builder.leaf(COMMA, comma, comma + 1)));
                    continue;
                }
                let close = lex.eat(b')')?;
                children.push(Child::plain(self.builder.leaf(RPAREN, close, close + 1)));
                break;
            }
        }
        Some(self.builder.node(ARGUMENTS, children, open))
    }

    /// The indented block owned by `owner`, or a missing block at `at`.
    fn body(&mut self, owner: LogicalLine, children: &mut Vec<Child>, at: usize) -> usize {
        match self.next_code_line(self.pos) {
            Some(next) if self.lines[next].indent > owner.indent => {
                while self.pos < next {
                    let line = self.lines[self.pos];
                    if line.kind == LineKind::Comment {
                        children.push(self.comment_line(line));
                    }
                    self.pos += 1;
                }
                self.block()
            }
            _ => {
                tracing::trace!(row = owner.row, "expected an indented block");
                // Trailing comments already pushed must stay before the block.
                let at = children
                    .last()
                    .map_or(at, |last| at.max(self.builder.end_of(last.index)));
                self.builder.missing(BLOCK, at)
            }
        }
    }

    fn body_follows(&self, owner: LogicalLine) -> bool {
        self.next_code_line(self.pos)
            .is_some_and(|i| self.lines[i].indent > owner.indent)
    }

    /// Consume trailing comments; succeeds only if nothing else remains on the line.
    fn finish_line(&mut self, lex: &mut Lexer<'a>, out: &mut Vec<Child>) -> bool {
        while let Some(range) = lex.comment() {
            out.push(self.comment(range));
        }
        lex.peek().is_none()
    }

    fn next_code_line(&self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&i| self.lines[i].kind == LineKind::Code)
    }

    fn lexer(&self, line: LogicalLine) -> Lexer<'a> {
        Lexer::new(self.text, line.start, line.end)
    }

    fn keyword(&mut self, lex: &mut Lexer<'a>) -> Option<usize> {
        let range = lex.identifier()?;
        let symbol = self.language.keyword_symbol(lex.text(range))?;
        Some(self.leaf(symbol, range))
    }

    fn leaf(&mut self, symbol: Symbol, (start, end): (usize, usize)) -> usize {
        self.builder.leaf(symbol, start, end)
    }

    fn comment(&mut self, (start, end): (usize, usize)) -> Child {
        Child::plain(self.builder.extra(COMMENT, start, end))
    }

    fn comment_line(&mut self, line: LogicalLine) -> Child {
        self.comment((line.start, line.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::language;

    fn sexp(text: &str) -> String {
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();
        parser.parse(text).unwrap().root_node().to_sexp()
    }

    #[test]
    fn test_parse_without_language_returns_none() {
        let mut parser = Parser::new();
        assert!(parser.language().is_none());
        assert!(parser.parse("label start:\n").is_none());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(sexp(""), "(source_file)");
        assert_eq!(sexp("\n\n   \n"), "(source_file)");
    }

    #[test]
    fn test_header_with_priority_and_arguments() {
        assert_eq!(
            sexp("label greet(name, mood):\n    pass it\n"),
            "(source_file (header identifier: (identifier) args: (arguments (identifier) (identifier)) \
             body: (block (statement (renpy_statement (identifier))))))"
        );
        assert_eq!(
            sexp("init -1:\n    define x = 1\n"),
            "(source_file (header priority: (number) \
             body: (block (statement (define_statement (identifier) (python_expression))))))"
        );
    }

    #[test]
    fn test_header_missing_colon() {
        assert_eq!(
            sexp("label broken\n    \"Missing colon.\"\n"),
            "(source_file (header identifier: (identifier) (MISSING \":\") body: (block (string))))"
        );
    }

    #[test]
    fn test_header_missing_body() {
        assert_eq!(
            sexp("label nothing:\n"),
            "(source_file (header identifier: (identifier) body: (MISSING block)))"
        );
    }

    #[test]
    fn test_header_without_colon_or_body_is_an_error() {
        let text = "label start\n";
        assert_eq!(sexp(text), "(source_file (ERROR))");
    }

    #[test]
    fn test_transform_is_a_header_at_top_level_and_a_statement_in_blocks() {
        assert_eq!(
            sexp("transform left_pos:\n    transform inner\n"),
            "(source_file (header identifier: (identifier) \
             body: (block (statement (renpy_statement (identifier))))))"
        );
    }

    #[test]
    fn test_python_block() {
        assert_eq!(
            sexp("init -5 python hide:\n    x = 1\n\n    # note\n    if x:\n        y = \"#\"\nlabel a:\n    pass b\n"),
            "(source_file (python_block priority: (number) (identifier) (python_expression) (comment) \
             (python_expression) (python_expression)) \
             (header identifier: (identifier) body: (block (statement (renpy_statement (identifier))))))"
        );
    }

    #[test]
    fn test_empty_python_block_has_missing_expression() {
        assert_eq!(
            sexp("python:\n"),
            "(source_file (python_block (MISSING python_expression)))"
        );
    }

    #[test]
    fn test_python_inline() {
        assert_eq!(
            sexp("label a:\n    $ renpy.pause(1.0) # wait\n"),
            "(source_file (header identifier: (identifier) body: (block \
             (python_inline (python_expression)) (comment))))"
        );
    }

    #[test]
    fn test_python_inline_is_an_error_at_top_level() {
        assert_eq!(sexp("$ x = 1 # set\n"), "(source_file (ERROR) (comment))");
    }

    #[test]
    fn test_define_with_dotted_name() {
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();
        let tree = parser.parse("define config.name = \"Game\"\n").unwrap();
        let root = tree.root_node();
        assert_eq!(
            root.to_sexp(),
            "(source_file (statement (define_statement (identifier) (python_expression))))"
        );
        let define = root.child(0).unwrap().child(0).unwrap();
        assert_eq!(define.child_by_field_name("keyword").unwrap().kind(), "define");
        assert_eq!(define.named_child(0).unwrap().text(), "config.name");
        assert_eq!(define.named_child(1).unwrap().text(), "\"Game\"");
    }

    #[test]
    fn test_control_statements() {
        assert_eq!(
            sexp("label a:\n    if score > 0: # check\n        \"Yes\"\n    elif x\n"),
            "(source_file (header identifier: (identifier) body: (block \
             (statement (control_statement (python_expression) (comment) body: (block (string)))) \
             (statement (control_statement (python_expression))))))"
        );
    }

    #[test]
    fn test_else_is_a_renpy_statement() {
        assert_eq!(
            sexp("label a:\n    else:\n        pass b\n"),
            "(source_file (header identifier: (identifier) body: (block \
             (statement (renpy_statement body: (block (statement (renpy_statement (identifier)))))))))"
        );
    }

    #[test]
    fn test_bare_keyword_falls_back_to_python_expression() {
        assert_eq!(
            sexp("label a:\n    return\n"),
            "(source_file (header identifier: (identifier) body: (block (python_expression))))"
        );
    }

    #[test]
    fn test_dialogue_line_with_escapes() {
        assert_eq!(
            sexp("label a:\n    e \"Say \\\"hi\\\" [[not] {{b}\"\n"),
            "(source_file (header identifier: (identifier) body: (block (python_expression) \
             (string (escape_sequence) (escape_sequence) (escape_interpolation) (escape_interpolation)))))"
        );
    }

    #[test]
    fn test_single_quoted_and_triple_quoted_strings() {
        assert_eq!(sexp("'It''s'\n"), "(source_file (string) (string))");
        assert_eq!(
            sexp("\"\"\"one\n\"two\"\n\"\"\"\n"),
            "(source_file (string))"
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(sexp("\"abc\n"), "(source_file (string (MISSING \"\\\"\")))");
    }

    #[test]
    fn test_top_level_garbage_is_an_error() {
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();
        let tree = parser.parse("e \"hi\" # said\n").unwrap();
        let root = tree.root_node();
        assert_eq!(root.to_sexp(), "(source_file (ERROR) (comment))");
        assert!(root.has_error());
        let error = root.child(0).unwrap();
        assert!(error.is_error());
        assert_eq!(error.text(), "e \"hi\"");
    }

    #[test]
    fn test_stray_indented_block_at_top_level() {
        assert_eq!(
            sexp("    show x\n"),
            "(source_file (block (statement (renpy_statement (identifier)))))"
        );
    }

    #[test]
    fn test_inconsistent_dedent_is_wrapped_in_error() {
        let text = "label a:\n    if x:\n        jump b\n      jump c\n";
        assert_eq!(
            sexp(text),
            "(source_file (header identifier: (identifier) body: (block \
             (statement (control_statement (python_expression) body: (block (statement (renpy_statement (identifier)))))) \
             (ERROR (statement (renpy_statement (identifier)))))))"
        );
    }

    #[test]
    fn test_comments_attach_to_enclosing_lines() {
        assert_eq!(
            sexp("label a: # trailing\n    # inside\n    show x # after\n# top\n"),
            "(source_file (header identifier: (identifier) (comment) (comment) \
             body: (block (statement (renpy_statement (identifier))) (comment))) (comment))"
        );
    }

    #[test]
    fn test_multiple_dedents_close_every_block() {
        let text = "label a:\n    menu:\n        \"Left\":\n            jump l\nlabel b:\n    jump c\n";
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();
        let tree = parser.parse(text).unwrap();
        let root = tree.root_node();
        assert_eq!(root.named_child_count(), 2);
        assert!(!root.has_error());
        assert_eq!(root.named_child(1).unwrap().start_position().row, 4);
    }
}
