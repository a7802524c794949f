//! Compiler from query source text to pattern trees.

use super::error::{QueryError, QueryErrorKind};
use crate::grammar::{FieldId, Language};
use regex::Regex;

/// How many times a child pattern may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantifier {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

/// What kind of node a pattern accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeMatcher {
    /// `(kind)`
    Named(u16),
    /// `(_)`
    AnyNamed,
    /// `_`
    Any,
    /// `"literal"`
    Anonymous(u16),
}

#[derive(Debug, Clone)]
pub(crate) enum PatternKind {
    Node {
        matcher: NodeMatcher,
        children: Vec<PatternNode>,
    },
    Alternation(Vec<PatternNode>),
}

#[derive(Debug, Clone)]
pub(crate) struct PatternNode {
    pub(crate) kind: PatternKind,
    pub(crate) field: Option<FieldId>,
    pub(crate) captures: Vec<u32>,
    pub(crate) quantifier: Quantifier,
}

#[derive(Debug, Clone)]
pub(crate) enum PredicateArg {
    Capture(u32),
    String(String),
}

#[derive(Debug, Clone)]
pub(crate) enum Predicate {
    Eq {
        capture: u32,
        other: PredicateArg,
        negate: bool,
    },
    Match {
        capture: u32,
        regex: Regex,
        negate: bool,
    },
    AnyOf {
        capture: u32,
        values: Vec<String>,
        negate: bool,
    },
}

/// A compiled top-level pattern.
#[derive(Debug, Clone)]
pub(crate) struct QueryPattern {
    pub(crate) root: PatternNode,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) start_byte: usize,
}

/// Output of [`compile`].
pub(crate) struct Compiled {
    pub(crate) patterns: Vec<QueryPattern>,
    pub(crate) capture_names: Vec<String>,
}

pub(crate) fn compile(language: &'static Language, source: &str) -> Result<Compiled, QueryError> {
    let mut compiler = Compiler {
        language,
        source,
        pos: 0,
        capture_names: Vec::new(),
    };
    let mut patterns = Vec::new();

    loop {
        compiler.skip_trivia();
        if compiler.pos >= source.len() {
            break;
        }
        let start_byte = compiler.pos;
        let mut predicates = Vec::new();
        let mut used = Vec::new();
        let root = compiler.top_level_pattern(&mut predicates)?;
        collect_captures(&root, &mut used);
        for (offset, predicate) in &predicates {
            for capture in predicate_captures(predicate) {
                if !used.contains(&capture) {
                    return Err(compiler.error_at(
                        *offset,
                        QueryErrorKind::Capture,
                        format!("capture @{} is not defined in this pattern", compiler.capture_names[capture as usize]),
                    ));
                }
            }
        }
        patterns.push(QueryPattern {
            root,
            predicates: predicates.into_iter().map(|(_, p)| p).collect(),
            start_byte,
        });
    }

    tracing::debug!(
        patterns = patterns.len(),
        captures = compiler.capture_names.len(),
        "compiled query"
    );
    Ok(Compiled {
        patterns,
        capture_names: compiler.capture_names,
    })
}

fn collect_captures(pattern: &PatternNode, out: &mut Vec<u32>) {
    out.extend(&pattern.captures);
    let children = match &pattern.kind {
        PatternKind::Node { children, .. } => children,
        PatternKind::Alternation(alternatives) => alternatives,
    };
    for child in children {
        collect_captures(child, out);
    }
}

fn predicate_captures(predicate: &Predicate) -> Vec<u32> {
    match predicate {
        Predicate::Eq {
            capture,
            other: PredicateArg::Capture(other),
            ..
        } => vec![*capture, *other],
        Predicate::Eq { capture, .. }
        | Predicate::Match { capture, .. }
        | Predicate::AnyOf { capture, .. } => vec![*capture],
    }
}

type Predicates = Vec<(usize, Predicate)>;

struct Compiler<'s> {
    language: &'static Language,
    source: &'s str,
    pos: usize,
    capture_names: Vec<String>,
}

impl<'s> Compiler<'s> {
    fn error_at(&self, offset: usize, kind: QueryErrorKind, message: impl Into<String>) -> QueryError {
        QueryError::at(self.source, offset, kind, message)
    }

    fn syntax(&self, message: impl Into<String>) -> QueryError {
        self.error_at(self.pos, QueryErrorKind::Syntax, message)
    }

    fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with(';') {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else {
                return;
            }
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), QueryError> {
        self.skip_trivia();
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.syntax(format!("expected '{ch}'")))
        }
    }

    fn name(&mut self) -> &'s str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '?' | '!')))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// A pattern at the top level, where `((pattern) (#predicate ...))` groups are allowed.
    fn top_level_pattern(&mut self, predicates: &mut Predicates) -> Result<PatternNode, QueryError> {
        if self.rest().starts_with('(') {
            let save = self.pos;
            self.pos += 1;
            self.skip_trivia();
            if matches!(self.peek(), Some('(' | '[' | '"')) {
                let mut inner: Vec<PatternNode> = Vec::new();
                loop {
                    self.skip_trivia();
                    match self.peek() {
                        Some(')') => {
                            self.pos += 1;
                            break;
                        }
                        Some('(') if self.rest()[1..].trim_start().starts_with('#') => {
                            self.predicate(predicates)?;
                        }
                        Some(_) => {
                            if !inner.is_empty() {
                                return Err(self.syntax("sibling sequences are not supported"));
                            }
                            inner.push(self.pattern(predicates)?);
                        }
                        None => return Err(self.syntax("unclosed group")),
                    }
                }
                let Some(mut root) = inner.pop() else {
                    return Err(self.error_at(save, QueryErrorKind::Syntax, "empty group"));
                };
                self.suffix(&mut root)?;
                return Ok(root);
            }
            self.pos = save;
        }
        self.pattern(predicates)
    }

    fn pattern(&mut self, predicates: &mut Predicates) -> Result<PatternNode, QueryError> {
        self.skip_trivia();
        let kind = match self.peek() {
            Some('(') => {
                self.pos += 1;
                self.node(predicates)?
            }
            Some('[') => {
                self.pos += 1;
                let mut alternatives = Vec::new();
                loop {
                    self.skip_trivia();
                    match self.peek() {
                        Some(']') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => alternatives.push(self.pattern(predicates)?),
                        None => return Err(self.syntax("unclosed alternation")),
                    }
                }
                if alternatives.is_empty() {
                    return Err(self.syntax("empty alternation"));
                }
                PatternKind::Alternation(alternatives)
            }
            Some('"') => {
                let start = self.pos;
                let literal = self.string()?;
                let id = self.language.id_for_node_kind(&literal, false).ok_or_else(|| {
                    self.error_at(start, QueryErrorKind::NodeType, format!("\"{literal}\""))
                })?;
                PatternKind::Node {
                    matcher: NodeMatcher::Anonymous(id),
                    children: Vec::new(),
                }
            }
            Some('_') => {
                self.pos += 1;
                PatternKind::Node {
                    matcher: NodeMatcher::Any,
                    children: Vec::new(),
                }
            }
            Some('.') => return Err(self.syntax("anchors are not supported")),
            Some(_) => return Err(self.syntax("expected a pattern")),
            None => return Err(self.syntax("unexpected end of query")),
        };

        let mut pattern = PatternNode {
            kind,
            field: None,
            captures: Vec::new(),
            quantifier: Quantifier::One,
        };
        self.suffix(&mut pattern)?;
        Ok(pattern)
    }

    /// Quantifier and captures following a pattern.
    fn suffix(&mut self, pattern: &mut PatternNode) -> Result<(), QueryError> {
        self.skip_trivia();
        let quantifier = match self.peek() {
            Some('?') => Some(Quantifier::ZeroOrOne),
            Some('*') => Some(Quantifier::ZeroOrMore),
            Some('+') => Some(Quantifier::OneOrMore),
            _ => None,
        };
        if let Some(quantifier) = quantifier {
            self.pos += 1;
            pattern.quantifier = quantifier;
        }

        loop {
            self.skip_trivia();
            if self.peek() != Some('@') {
                return Ok(());
            }
            self.pos += 1;
            let name = self.name();
            if name.is_empty() {
                return Err(self.syntax("expected a capture name"));
            }
            let index = self.capture_index(name);
            pattern.captures.push(index);
        }
    }

    fn capture_index(&mut self, name: &str) -> u32 {
        match self.capture_names.iter().position(|n| n == name) {
            Some(i) => i as u32,
            None => {
                self.capture_names.push(name.to_string());
                (self.capture_names.len() - 1) as u32
            }
        }
    }

    /// The inside of `( ... )` after the opening parenthesis.
    fn node(&mut self, predicates: &mut Predicates) -> Result<PatternKind, QueryError> {
        self.skip_trivia();
        let start = self.pos;
        let kind = self.name();
        let matcher = match kind {
            "" => return Err(self.syntax("expected a node kind")),
            "_" => NodeMatcher::AnyNamed,
            _ => NodeMatcher::Named(
                self.language
                    .id_for_node_kind(kind, true)
                    .ok_or_else(|| self.error_at(start, QueryErrorKind::NodeType, kind))?,
            ),
        };

        let mut children = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('(') if self.rest()[1..].trim_start().starts_with('#') => {
                    self.predicate(predicates)?;
                }
                Some('!') => return Err(self.syntax("negated fields are not supported")),
                Some(c) if c.is_ascii_alphabetic() => {
                    let field_start = self.pos;
                    let name = self.name();
                    self.skip_trivia();
                    if self.peek() != Some(':') {
                        return Err(self.error_at(field_start, QueryErrorKind::Syntax, "expected ':' after field name"));
                    }
                    self.pos += 1;
                    let field = self
                        .language
                        .field_id_for_name(name)
                        .ok_or_else(|| self.error_at(field_start, QueryErrorKind::Field, name))?;
                    let mut child = self.pattern(predicates)?;
                    child.field = Some(field);
                    children.push(child);
                }
                Some(_) => children.push(self.pattern(predicates)?),
                None => return Err(self.syntax("unclosed node pattern")),
            }
        }

        Ok(PatternKind::Node { matcher, children })
    }

    fn string(&mut self) -> Result<String, QueryError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, ch)) = chars.next() {
            match ch {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, '0')) => out.push('\0'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                _ => out.push(ch),
            }
        }
        Err(self.error_at(start, QueryErrorKind::Syntax, "unterminated string"))
    }

    /// `(#name? args...)`
    fn predicate(&mut self, predicates: &mut Predicates) -> Result<(), QueryError> {
        let start = self.pos;
        self.expect('(')?;
        self.expect('#')?;
        let name = self.name().to_string();

        let mut args = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(')') => {
                    self.pos += 1;
                    break;
                }
                Some('@') => {
                    self.pos += 1;
                    let capture_start = self.pos;
                    let capture = self.name();
                    let Some(index) = self.capture_names.iter().position(|n| n == capture) else {
                        return Err(self.error_at(capture_start, QueryErrorKind::Capture, capture));
                    };
                    args.push(PredicateArg::Capture(index as u32));
                }
                Some('"') => args.push(PredicateArg::String(self.string()?)),
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    args.push(PredicateArg::String(self.name().to_string()));
                }
                Some(_) => return Err(self.syntax("unexpected predicate argument")),
                None => return Err(self.syntax("unclosed predicate")),
            }
        }

        if name.ends_with('!') {
            tracing::trace!(directive = %name, "ignoring query directive");
            return Ok(());
        }

        let invalid = |message: &str| self.error_at(start, QueryErrorKind::Predicate, format!("#{name}: {message}"));
        let (base, negate) = match name.strip_prefix("not-") {
            Some(base) => (base, true),
            None => (name.as_str(), false),
        };
        let mut args = args.into_iter();
        let Some(PredicateArg::Capture(capture)) = args.next() else {
            return Err(invalid("first argument must be a capture"));
        };

        let predicate = match base {
            "eq?" => {
                let (Some(other), None) = (args.next(), args.next()) else {
                    return Err(invalid("expected exactly two arguments"));
                };
                Predicate::Eq {
                    capture,
                    other,
                    negate,
                }
            }
            "match?" => {
                let (Some(PredicateArg::String(pattern)), None) = (args.next(), args.next()) else {
                    return Err(invalid("expected a capture and a regex string"));
                };
                let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
                Predicate::Match {
                    capture,
                    regex,
                    negate,
                }
            }
            "any-of?" => {
                let mut values = Vec::new();
                for arg in args {
                    match arg {
                        PredicateArg::String(value) => values.push(value),
                        PredicateArg::Capture(_) => return Err(invalid("arguments must be strings")),
                    }
                }
                if values.is_empty() {
                    return Err(invalid("expected at least one string"));
                }
                Predicate::AnyOf {
                    capture,
                    values,
                    negate,
                }
            }
            _ => return Err(invalid("unknown predicate")),
        };

        predicates.push((start, predicate));
        Ok(())
    }
}
