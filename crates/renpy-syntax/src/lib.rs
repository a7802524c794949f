#![warn(missing_docs)]
//! `renpy-syntax` - the Ren'Py grammar and a native parsing engine for it.
//!
//! The crate is organized the way a tree-sitter grammar binding is consumed:
//!
//! - [`language`] returns the process-wide, immutable grammar descriptor
//! - [`Parser`] turns source text into a [`Tree`] of [`Node`]s, recovering from errors
//! - [`Query`] and [`QueryCursor`] run S-expression queries (highlights, folds) over trees
//!
//! ```
//! use renpy_syntax::{Parser, Query, QueryCursor, language, HIGHLIGHTS_QUERY};
//!
//! let source = "label start:\n    e \"Hello!\"\n";
//! let mut parser = Parser::new();
//! parser.set_language(language()).unwrap();
//! let tree = parser.parse(source).unwrap();
//!
//! let query = Query::new(language(), HIGHLIGHTS_QUERY).unwrap();
//! let mut cursor = QueryCursor::new();
//! let count = cursor.matches(&query, tree.root_node(), source.as_bytes()).count();
//! assert!(count > 0);
//! ```

mod error;
mod grammar;
mod lexer;
mod parser;
mod query;
pub mod scanner;
mod tree;

pub use error::LanguageError;
pub use grammar::{
    FOLDS_QUERY, FieldId, HIGHLIGHTS_QUERY, LANGUAGE, LANGUAGE_VERSION, Language,
    MIN_COMPATIBLE_LANGUAGE_VERSION, Symbol, SymbolMetadata, language,
};
pub use parser::Parser;
pub use query::{
    Query, QueryCapture, QueryCaptures, QueryCursor, QueryError, QueryErrorKind, QueryMatch,
    QueryMatches,
};
pub use tree::{Node, Point, Range, Tree, TreeCursor};

/// Parse `text` with the Ren'Py grammar.
pub fn parse(text: &str) -> Tree {
    parser::parse_document(language(), text)
}
