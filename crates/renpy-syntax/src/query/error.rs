use std::fmt;
use thiserror::Error;

/// Category of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// Malformed query text or an unsupported construct.
    Syntax,
    /// A node kind that the grammar does not define.
    NodeType,
    /// A field name that the grammar does not define.
    Field,
    /// A predicate refers to a capture the pattern never defines.
    Capture,
    /// An unknown predicate, wrong predicate arguments, or an invalid regex.
    Predicate,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax error",
            Self::NodeType => "invalid node type",
            Self::Field => "invalid field",
            Self::Capture => "invalid capture",
            Self::Predicate => "invalid predicate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at row {row}, column {column}: {message}")]
/// Error produced while compiling a [`crate::Query`].
pub struct QueryError {
    /// Zero-based row of the offending text.
    pub row: usize,
    /// Zero-based byte column of the offending text.
    pub column: usize,
    /// Byte offset of the offending text.
    pub offset: usize,
    /// Human-readable detail.
    pub message: String,
    /// Error category.
    pub kind: QueryErrorKind,
}

impl QueryError {
    pub(crate) fn at(source: &str, offset: usize, kind: QueryErrorKind, message: impl Into<String>) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let row = before.iter().filter(|&&b| b == b'\n').count();
        let column = offset - before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        Self {
            row,
            column,
            offset,
            message: message.into(),
            kind,
        }
    }
}
