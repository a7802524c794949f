//! C ABI for the Ren'Py grammar.
//!
//! [`tree_sitter_renpy`] is the grammar entry point declared in
//! `include/tree_sitter/tree-sitter-renpy.h`. The remaining functions expose the parser
//! so C hosts can get a tree, inspect it and render it as an S-expression or JSON.
//!
//! Strings returned by this library must be released with [`renpy_string_free`], trees
//! with [`renpy_tree_delete`]. No function unwinds across the boundary; invalid input
//! yields null (or `false` / `0`).

use renpy_syntax::{Language, Tree, language};
use std::ffi::{CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

/// Opaque grammar handle as seen from C.
pub type TSLanguage = Language;

/// A parsed document owned by the caller.
pub struct RenpyTree {
    tree: Tree,
}

/// The C header declaring every exported function.
pub const HEADER: &str = include_str!("../include/tree_sitter/tree-sitter-renpy.h");

/// Return the Ren'Py grammar. Never null; every call returns the same pointer.
#[unsafe(no_mangle)]
pub extern "C" fn tree_sitter_renpy() -> *const TSLanguage {
    language()
}

fn checked_language(language: *const TSLanguage) -> Option<&'static Language> {
    let ours = renpy_syntax::language();
    ptr::eq(language, ours).then_some(ours)
}

fn into_c_string(text: String) -> *mut c_char {
    match CString::new(text) {
        Ok(s) => s.into_raw(),
        Err(err) => {
            tracing::warn!(%err, "string contains an interior NUL");
            ptr::null_mut()
        }
    }
}

/// NUL-terminated grammar name, or null if `language` is not the Ren'Py grammar.
#[unsafe(no_mangle)]
pub extern "C" fn renpy_language_name(language: *const TSLanguage) -> *const c_char {
    checked_language(language).map_or(ptr::null(), |l| l.c_name().as_ptr())
}

/// Number of node kinds in the grammar, or 0 if `language` is not the Ren'Py grammar.
#[unsafe(no_mangle)]
pub extern "C" fn renpy_language_node_kind_count(language: *const TSLanguage) -> usize {
    checked_language(language).map_or(0, |l| l.node_kind_count())
}

/// Parse `length` bytes of UTF-8 at `text`.
///
/// Returns null when `language` is not the Ren'Py grammar, `text` is null (with a
/// non-zero length) or not valid UTF-8.
///
/// # Safety
///
/// `text` must point to `length` readable bytes, or be null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn renpy_parse(
    language: *const TSLanguage,
    text: *const c_char,
    length: usize,
) -> *mut RenpyTree {
    let Some(language) = checked_language(language) else {
        return ptr::null_mut();
    };
    let bytes: &[u8] = if length == 0 {
        &[]
    } else if text.is_null() {
        return ptr::null_mut();
    } else {
        // SAFETY: the caller guarantees `length` readable bytes at `text`.
        unsafe { std::slice::from_raw_parts(text.cast::<u8>(), length) }
    };
    let Ok(source) = std::str::from_utf8(bytes) else {
        tracing::debug!(length, "rejecting non UTF-8 input");
        return ptr::null_mut();
    };

    let parsed = catch_unwind(AssertUnwindSafe(|| {
        let mut parser = renpy_syntax::Parser::new();
        parser.set_language(language).ok()?;
        parser.parse(source)
    }));
    match parsed {
        Ok(Some(tree)) => Box::into_raw(Box::new(RenpyTree { tree })),
        Ok(None) => ptr::null_mut(),
        Err(_) => {
            tracing::error!("parser panicked");
            ptr::null_mut()
        }
    }
}

/// # Safety
///
/// `tree` must be null or a live pointer returned by [`renpy_parse`].
unsafe fn tree_ref<'a>(tree: *const RenpyTree) -> Option<&'a Tree> {
    // SAFETY: upheld by the caller.
    unsafe { tree.as_ref() }.map(|t| &t.tree)
}

/// Whether the tree contains `ERROR` or `MISSING` nodes. `false` for null.
///
/// # Safety
///
/// `tree` must be null or a live pointer returned by [`renpy_parse`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn renpy_tree_has_error(tree: *const RenpyTree) -> bool {
    unsafe { tree_ref(tree) }.is_some_and(|t| t.root_node().has_error())
}

/// S-expression of the root node. Free with [`renpy_string_free`].
///
/// # Safety
///
/// `tree` must be null or a live pointer returned by [`renpy_parse`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn renpy_tree_sexp(tree: *const RenpyTree) -> *mut c_char {
    match unsafe { tree_ref(tree) } {
        Some(tree) => into_c_string(tree.root_node().to_sexp()),
        None => ptr::null_mut(),
    }
}

/// JSON rendering of the whole tree. Free with [`renpy_string_free`].
///
/// # Safety
///
/// `tree` must be null or a live pointer returned by [`renpy_parse`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn renpy_tree_json(tree: *const RenpyTree) -> *mut c_char {
    let Some(tree) = (unsafe { tree_ref(tree) }) else {
        return ptr::null_mut();
    };
    match serde_json::to_string(&tree.root_node().to_json()) {
        Ok(json) => into_c_string(json),
        Err(err) => {
            tracing::error!(%err, "failed to serialize tree");
            ptr::null_mut()
        }
    }
}

/// Release a string returned by this library. Null is ignored.
///
/// # Safety
///
/// `string` must be null or come from [`renpy_tree_sexp`] / [`renpy_tree_json`], and must
/// not be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn renpy_string_free(string: *mut c_char) {
    if !string.is_null() {
        // SAFETY: produced by `CString::into_raw`.
        drop(unsafe { CString::from_raw(string) });
    }
}

/// Release a tree. Null is ignored.
///
/// # Safety
///
/// `tree` must be null or a pointer returned by [`renpy_parse`] that has not been deleted.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn renpy_tree_delete(tree: *mut RenpyTree) {
    if !tree.is_null() {
        // SAFETY: produced by `Box::into_raw`.
        drop(unsafe { Box::from_raw(tree) });
    }
}
