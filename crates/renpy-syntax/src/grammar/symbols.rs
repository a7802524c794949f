//! Static symbol and field tables for the Ren'Py grammar.
//!
//! Symbol ids are indices into [`SYMBOLS`]; field ids are indices into [`FIELD_NAMES`].

use super::{FieldId, Symbol, SymbolMetadata};
use std::num::NonZeroU16;

pub(crate) const IDENTIFIER: Symbol = Symbol(1);
pub(crate) const COMMENT: Symbol = Symbol(2);
pub(crate) const NUMBER: Symbol = Symbol(3);
pub(crate) const ESCAPE_SEQUENCE: Symbol = Symbol(4);
pub(crate) const ESCAPE_INTERPOLATION: Symbol = Symbol(5);
pub(crate) const PYTHON_EXPRESSION: Symbol = Symbol(6);
pub(crate) const COLON: Symbol = Symbol(10);
pub(crate) const LPAREN: Symbol = Symbol(11);
pub(crate) const RPAREN: Symbol = Symbol(12);
pub(crate) const COMMA: Symbol = Symbol(13);
pub(crate) const EQUALS: Symbol = Symbol(14);
pub(crate) const DOLLAR: Symbol = Symbol(15);
pub(crate) const DOUBLE_QUOTE: Symbol = Symbol(16);
pub(crate) const SINGLE_QUOTE: Symbol = Symbol(17);
pub(crate) const TRIPLE_DOUBLE_QUOTE: Symbol = Symbol(18);
pub(crate) const TRIPLE_SINGLE_QUOTE: Symbol = Symbol(19);
pub(crate) const PYTHON: Symbol = Symbol(20);
pub(crate) const SOURCE_FILE: Symbol = Symbol(86);
pub(crate) const BLOCK: Symbol = Symbol(87);
pub(crate) const STRING: Symbol = Symbol(88);
pub(crate) const HEADER: Symbol = Symbol(89);
pub(crate) const PYTHON_INLINE: Symbol = Symbol(90);
pub(crate) const PYTHON_BLOCK: Symbol = Symbol(91);
pub(crate) const ARGUMENTS: Symbol = Symbol(92);
pub(crate) const STATEMENT: Symbol = Symbol(93);
pub(crate) const RENPY_STATEMENT: Symbol = Symbol(94);
pub(crate) const CONTROL_STATEMENT: Symbol = Symbol(95);
pub(crate) const DEFINE_STATEMENT: Symbol = Symbol(96);
pub(crate) const ERROR: Symbol = Symbol(97);

/// First keyword symbol (inclusive).
pub(crate) const KEYWORDS_START: u16 = 20;
/// Last keyword symbol (exclusive).
pub(crate) const KEYWORDS_END: u16 = 86;

pub(crate) static SYMBOLS: &[SymbolMetadata] = &[
    SymbolMetadata {
        name: "end",
        named: false,
        visible: false,
    },
    SymbolMetadata {
        name: "identifier",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "comment",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "number",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "escape_sequence",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "escape_interpolation",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "python_expression",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "_newline",
        named: true,
        visible: false,
    },
    SymbolMetadata {
        name: "_indent",
        named: true,
        visible: false,
    },
    SymbolMetadata {
        name: "_dedent",
        named: true,
        visible: false,
    },
    SymbolMetadata {
        name: ":",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "(",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: ")",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: ",",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "=",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "$",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "\"",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "'",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "\"\"\"",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "'''",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "python",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "label",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "init",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "early",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "animate",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "define",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "default",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "transform",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "screen",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "image",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "hide",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "show",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "scene",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "jump",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "menu",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "return",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "call",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "if",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "elif",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "else",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "play",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "stop",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "queue",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "voice",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "sustain",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "event",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "on",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "pause",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "linear",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "ease",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "easein",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "easeout",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "choice",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "function",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "parallel",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "block",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "contains",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "time",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "pass",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "repeat",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "add",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "bar",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "vbar",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "button",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "textbutton",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "imagebutton",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "mousearea",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "imagemap",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "fixed",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "frame",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "grid",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "hbox",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "vbox",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "side",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "window",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "null",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "input",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "key",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "timer",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "viewport",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "hotspot",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "hotbar",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "text",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "has",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "for",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "use",
        named: false,
        visible: true,
    },
    SymbolMetadata {
        name: "source_file",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "block",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "string",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "header",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "python_inline",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "python_block",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "arguments",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "statement",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "renpy_statement",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "control_statement",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "define_statement",
        named: true,
        visible: true,
    },
    SymbolMetadata {
        name: "ERROR",
        named: true,
        visible: true,
    },
];

pub(crate) const FIELD_ARGS: FieldId = FieldId(NonZeroU16::new(1).unwrap());
pub(crate) const FIELD_BODY: FieldId = FieldId(NonZeroU16::new(2).unwrap());
pub(crate) const FIELD_IDENTIFIER: FieldId = FieldId(NonZeroU16::new(3).unwrap());
pub(crate) const FIELD_KEYWORD: FieldId = FieldId(NonZeroU16::new(4).unwrap());
pub(crate) const FIELD_PRIORITY: FieldId = FieldId(NonZeroU16::new(5).unwrap());

pub(crate) static FIELD_NAMES: &[&str] = &["", "args", "body", "identifier", "keyword", "priority"];

pub(crate) static HEADER_KEYWORDS: &[&str] = &["label", "init", "early", "transform", "animate"];

pub(crate) static STATEMENT_KEYWORDS: &[&str] = &[
    "transform", "screen", "image", "hide", "show", "scene", "jump", "menu", "return", "call",
    "if", "elif", "else", "play", "stop", "queue", "voice", "sustain", "event", "on", "pause",
    "linear", "ease", "easein", "easeout", "choice", "function", "parallel", "block",
    "contains", "time", "pass", "repeat", "add", "bar", "vbar", "button", "textbutton",
    "imagebutton", "mousearea", "imagemap", "fixed", "frame", "grid", "hbox", "vbox", "side",
    "window", "null", "input", "key", "timer", "viewport", "hotspot", "hotbar", "text", "has",
    "for", "use",
];

pub(crate) static CONTROL_KEYWORDS: &[&str] = &["for", "if", "elif"];

pub(crate) static DEFINITION_KEYWORDS: &[&str] = &["define", "default"];

pub(crate) static PYTHON_BLOCK_PREFIXES: &[&str] = &["init", "early"];
