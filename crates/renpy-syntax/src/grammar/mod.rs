//! The Ren'Py grammar descriptor.
//!
//! [`LANGUAGE`] is a single immutable descriptor living in static storage. It carries the
//! symbol table (node kinds), field names, keyword classes and the bundled queries. Every
//! other part of the crate (parser, tree, query compiler) refers to grammar data through a
//! `&'static Language`, so handles obtained from [`language`] stay valid for the whole
//! process and can be shared freely across threads.

mod node_types;
pub(crate) mod symbols;

use std::ffi::CStr;
use std::fmt;
use std::num::NonZeroU16;

/// The ABI version of the grammar tables.
///
/// Parsers refuse languages whose version lies outside
/// [`MIN_COMPATIBLE_LANGUAGE_VERSION`]..=[`LANGUAGE_VERSION`].
pub const LANGUAGE_VERSION: usize = 15;

/// Oldest grammar ABI version accepted by [`crate::Parser::set_language`].
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: usize = 13;

/// Syntax highlighting query bundled with the grammar.
pub const HIGHLIGHTS_QUERY: &str = include_str!("../../queries/highlights.scm");

/// Folding query bundled with the grammar. Each capture becomes a fold candidate.
pub const FOLDS_QUERY: &str = include_str!("../../queries/folds.scm");

/// Id of a node kind within a [`Language`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub(crate) u16);

impl Symbol {
    /// The raw numeric id.
    pub const fn id(self) -> u16 {
        self.0
    }
}

/// Id of a field name within a [`Language`]. Field ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub(crate) NonZeroU16);

impl FieldId {
    /// The raw numeric id.
    pub const fn get(self) -> u16 {
        self.0.get()
    }
}

/// Static metadata describing one node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMetadata {
    /// Kind name as it appears in trees and queries.
    pub name: &'static str,
    /// Named kinds come from grammar rules; anonymous kinds are literal tokens.
    pub named: bool,
    /// Hidden kinds (externals such as `_indent`) never appear in trees.
    pub visible: bool,
}

/// The Ren'Py grammar descriptor.
///
/// Instances cannot be created outside this crate; use [`language`] to obtain the
/// process-wide descriptor.
pub struct Language {
    name: &'static str,
    c_name: &'static CStr,
    abi_version: usize,
    symbols: &'static [SymbolMetadata],
    field_names: &'static [&'static str],
    header_keywords: &'static [&'static str],
    statement_keywords: &'static [&'static str],
    control_keywords: &'static [&'static str],
    definition_keywords: &'static [&'static str],
    python_block_prefixes: &'static [&'static str],
    file_types: &'static [&'static str],
    highlights_query: &'static str,
    folds_query: &'static str,
}

/// The Ren'Py grammar, initialized at compile time.
pub static LANGUAGE: Language = Language {
    name: "renpy",
    c_name: c"renpy",
    abi_version: LANGUAGE_VERSION,
    symbols: symbols::SYMBOLS,
    field_names: symbols::FIELD_NAMES,
    header_keywords: symbols::HEADER_KEYWORDS,
    statement_keywords: symbols::STATEMENT_KEYWORDS,
    control_keywords: symbols::CONTROL_KEYWORDS,
    definition_keywords: symbols::DEFINITION_KEYWORDS,
    python_block_prefixes: symbols::PYTHON_BLOCK_PREFIXES,
    file_types: &["rpy", "rpym"],
    highlights_query: HIGHLIGHTS_QUERY,
    folds_query: FOLDS_QUERY,
};

/// Returns the Ren'Py grammar descriptor.
///
/// Every call returns the same reference; the descriptor is never mutated or freed.
pub fn language() -> &'static Language {
    &LANGUAGE
}

impl Language {
    /// The grammar name (`"renpy"`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The grammar name as a NUL-terminated C string.
    pub fn c_name(&self) -> &'static CStr {
        self.c_name
    }

    /// The ABI version of the grammar tables.
    pub fn abi_version(&self) -> usize {
        self.abi_version
    }

    /// Number of node kinds, including hidden ones.
    pub fn node_kind_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of distinct field names.
    pub fn field_count(&self) -> usize {
        self.field_names.len().saturating_sub(1)
    }

    /// File extensions (without the dot) handled by this grammar.
    pub fn file_types(&self) -> &'static [&'static str] {
        self.file_types
    }

    /// The bundled highlights query source.
    pub fn highlights_query(&self) -> &'static str {
        self.highlights_query
    }

    /// The bundled folds query source.
    pub fn folds_query(&self) -> &'static str {
        self.folds_query
    }

    /// Static metadata for every node kind, indexed by symbol id.
    pub fn symbols(&self) -> &'static [SymbolMetadata] {
        self.symbols
    }

    /// Kind name for a symbol id.
    pub fn node_kind_for_id(&self, id: u16) -> Option<&'static str> {
        self.symbols.get(usize::from(id)).map(|m| m.name)
    }

    /// Look up a symbol id by kind name.
    ///
    /// `named` distinguishes rules from literal tokens that share a spelling (the `block`
    /// rule versus the `block` keyword).
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<u16> {
        self.symbols
            .iter()
            .position(|m| m.visible && m.named == named && m.name == kind)
            .and_then(|idx| u16::try_from(idx).ok())
    }

    /// Whether the symbol is a named rule.
    pub fn node_kind_is_named(&self, id: u16) -> bool {
        self.symbols
            .get(usize::from(id))
            .is_some_and(|m| m.named)
    }

    /// Whether the symbol can appear in a tree.
    pub fn node_kind_is_visible(&self, id: u16) -> bool {
        self.symbols
            .get(usize::from(id))
            .is_some_and(|m| m.visible)
    }

    /// Field name for a field id.
    pub fn field_name_for_id(&self, id: u16) -> Option<&'static str> {
        if id == 0 {
            return None;
        }
        self.field_names.get(usize::from(id)).copied()
    }

    /// Look up a field id by name.
    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.field_names
            .iter()
            .position(|f| !f.is_empty() && *f == name)
            .and_then(|idx| u16::try_from(idx).ok())
            .and_then(NonZeroU16::new)
            .map(FieldId)
    }

    /// Keywords that open a `header` (`label start:`).
    pub fn header_keywords(&self) -> &'static [&'static str] {
        self.header_keywords
    }

    /// Keywords that start a `renpy_statement`.
    pub fn statement_keywords(&self) -> &'static [&'static str] {
        self.statement_keywords
    }

    /// Returns `true` if `word` opens a header.
    pub fn is_header_keyword(&self, word: &str) -> bool {
        self.header_keywords.contains(&word)
    }

    /// Returns `true` if `word` starts a `renpy_statement`.
    pub fn is_statement_keyword(&self, word: &str) -> bool {
        self.statement_keywords.contains(&word)
    }

    /// Returns `true` if `word` starts a `control_statement`.
    pub fn is_control_keyword(&self, word: &str) -> bool {
        self.control_keywords.contains(&word)
    }

    /// Returns `true` if `word` starts a `define_statement`.
    pub fn is_definition_keyword(&self, word: &str) -> bool {
        self.definition_keywords.contains(&word)
    }

    /// Returns `true` if `word` may precede `python` in a python block header.
    pub fn is_python_block_prefix(&self, word: &str) -> bool {
        self.python_block_prefixes.contains(&word)
    }

    /// Symbol of the anonymous keyword token spelled `word`.
    pub(crate) fn keyword_symbol(&self, word: &str) -> Option<Symbol> {
        let start = usize::from(symbols::KEYWORDS_START);
        let end = usize::from(symbols::KEYWORDS_END);
        self.symbols[start..end]
            .iter()
            .position(|m| m.name == word)
            .map(|offset| Symbol(symbols::KEYWORDS_START + offset as u16))
    }

    pub(crate) fn metadata(&self, symbol: Symbol) -> SymbolMetadata {
        self.symbols[usize::from(symbol.0)]
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field("abi_version", &self.abi_version)
            .field("node_kind_count", &self.symbols.len())
            .field("field_count", &self.field_count())
            .finish()
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for Language {}
