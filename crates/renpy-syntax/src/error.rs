use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced when assigning a grammar to a [`crate::Parser`].
pub enum LanguageError {
    #[error("incompatible language version {version}; expected {min}..={max}")]
    /// The grammar's ABI version is outside the range this parser understands.
    Version {
        /// Version reported by the grammar.
        version: usize,
        /// Oldest supported version.
        min: usize,
        /// Newest supported version.
        max: usize,
    },
}
