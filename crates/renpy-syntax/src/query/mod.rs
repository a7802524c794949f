//! Tree queries.
//!
//! A subset of tree-sitter's S-expression query language: node and literal patterns,
//! wildcards, fields, alternations, quantifiers, captures and the `#eq?`, `#match?` and
//! `#any-of?` predicates (plus their `not-` forms). Directives ending in `!` are parsed
//! and ignored.

mod cursor;
mod error;
mod parse;

pub use cursor::{QueryCapture, QueryCaptures, QueryCursor, QueryMatch, QueryMatches};
pub use error::{QueryError, QueryErrorKind};

use crate::grammar::Language;
use parse::QueryPattern;

/// A compiled query.
#[derive(Debug, Clone)]
pub struct Query {
    language: &'static Language,
    patterns: Vec<QueryPattern>,
    capture_names: Vec<String>,
}

impl Query {
    /// Compile `source` against `language`.
    pub fn new(language: &'static Language, source: &str) -> Result<Self, QueryError> {
        let compiled = parse::compile(language, source)?;
        Ok(Self {
            language,
            patterns: compiled.patterns,
            capture_names: compiled.capture_names,
        })
    }

    /// The grammar this query was compiled against.
    pub fn language(&self) -> &'static Language {
        self.language
    }

    /// Capture names, indexed by capture id.
    pub fn capture_names(&self) -> &[String] {
        &self.capture_names
    }

    /// Capture id for a name.
    pub fn capture_index_for_name(&self, name: &str) -> Option<u32> {
        self.capture_names
            .iter()
            .position(|n| n == name)
            .map(|i| i as u32)
    }

    /// Number of top-level patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Byte offset in the query source where pattern `index` begins.
    pub fn start_byte_for_pattern(&self, index: usize) -> Option<usize> {
        self.patterns.get(index).map(|p| p.start_byte)
    }

    pub(crate) fn patterns(&self) -> &[QueryPattern] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FOLDS_QUERY, HIGHLIGHTS_QUERY, language};

    #[test]
    fn test_bundled_queries_compile() {
        let highlights = Query::new(language(), HIGHLIGHTS_QUERY).unwrap();
        assert!(highlights.pattern_count() > 10);
        assert!(highlights.capture_index_for_name("keyword").is_some());
        assert!(highlights.capture_index_for_name("string.escape").is_some());

        let folds = Query::new(language(), FOLDS_QUERY).unwrap();
        assert_eq!(folds.capture_names(), ["fold"]);
        assert_eq!(folds.pattern_count(), 4);
    }

    #[test]
    fn test_pattern_offsets() {
        let source = "(comment) @c\n\n(number) @n";
        let query = Query::new(language(), source).unwrap();
        assert_eq!(query.start_byte_for_pattern(0), Some(0));
        assert_eq!(query.start_byte_for_pattern(1), Some(14));
        assert_eq!(query.start_byte_for_pattern(2), None);
    }

    #[test]
    fn test_unknown_node_type() {
        let err = Query::new(language(), "\n  (label_statement) @x").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::NodeType);
        assert_eq!((err.row, err.column, err.offset), (1, 3, 4));
        assert_eq!(err.message, "label_statement");
    }

    #[test]
    fn test_unknown_literal() {
        let err = Query::new(language(), "\"while\" @k").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::NodeType);
    }

    #[test]
    fn test_unknown_field() {
        let err = Query::new(language(), "(header name: (identifier))").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::Field);
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["(header", "[(comment)", "(comment) @", "\"open", "(header . (identifier))"] {
            let err = Query::new(language(), source).unwrap_err();
            assert_eq!(err.kind, QueryErrorKind::Syntax, "{source}");
        }
    }

    #[test]
    fn test_predicate_errors() {
        let err = Query::new(language(), "((identifier) @x (#eq? @y \"a\"))").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::Capture);

        let err = Query::new(language(), "((identifier) @x (#frobnicate? @x))").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::Predicate);

        let err = Query::new(language(), "((identifier) @x (#match? @x \"(\"))").unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::Predicate);
    }

    #[test]
    fn test_directives_are_ignored() {
        let query = Query::new(language(), "((comment) @c (#set! priority 105))").unwrap();
        assert_eq!(query.pattern_count(), 1);
    }
}
