use std::ffi::CStr;
use std::thread;
use tree_sitter_renpy::{
    HEADER, renpy_language_node_kind_count, renpy_parse, renpy_string_free, renpy_tree_delete,
    renpy_tree_has_error, renpy_tree_json, renpy_tree_sexp, tree_sitter_renpy,
};

#[test]
fn test_accessor_is_non_null_and_stable() {
    let first = tree_sitter_renpy();
    assert!(!first.is_null());
    for _ in 0..100 {
        assert_eq!(tree_sitter_renpy(), first);
    }
    assert!(std::ptr::eq(first, renpy_syntax::language()));
}

#[test]
fn test_accessor_matches_across_threads() {
    let here = tree_sitter_renpy() as usize;
    let there = thread::spawn(|| tree_sitter_renpy() as usize)
        .join()
        .expect("thread");
    assert_ne!(here, 0);
    assert_eq!(here, there);
}

#[test]
fn test_header_declares_accessor_inside_extern_c_guard() {
    let open = HEADER.find("extern \"C\" {").expect("extern C block");
    let close = HEADER[open..].find("#ifdef __cplusplus\n}").expect("guard close") + open;
    let decl = HEADER
        .find("const TSLanguage *tree_sitter_renpy(void);")
        .expect("accessor declaration");
    assert!(open < decl && decl < close);
    assert!(HEADER.contains("typedef struct TSLanguage TSLanguage;"));
    assert!(HEADER.starts_with("#ifndef TREE_SITTER_RENPY_H_"));

    for name in ["renpy_parse", "renpy_tree_sexp", "renpy_tree_delete", "renpy_string_free"] {
        let at = HEADER.find(&format!("{name}(")).expect(name);
        assert!(open < at && at < close, "{name} outside the guard");
    }
}

#[test]
fn test_parse_through_c_abi() {
    let source = "label start:\n    jump end\n";
    let language = tree_sitter_renpy();
    assert!(renpy_language_node_kind_count(language) > 0);

    unsafe {
        let tree = renpy_parse(language, source.as_ptr().cast(), source.len());
        assert!(!tree.is_null());
        assert!(!renpy_tree_has_error(tree));

        let sexp = renpy_tree_sexp(tree);
        assert_eq!(
            CStr::from_ptr(sexp).to_str().unwrap(),
            "(source_file (header identifier: (identifier) body: (block \
             (statement (renpy_statement (identifier))))))"
        );
        renpy_string_free(sexp);

        let json = renpy_tree_json(tree);
        let value: serde_json::Value =
            serde_json::from_str(CStr::from_ptr(json).to_str().unwrap()).unwrap();
        assert_eq!(value["type"], "source_file");
        renpy_string_free(json);

        renpy_tree_delete(tree);
    }
}

#[test]
fn test_parse_reports_errors_and_rejects_bad_utf8() {
    let broken = "label\n    \"Unterminated\n";
    let invalid = [b'l', 0xff, b'\n'];
    unsafe {
        let tree = renpy_parse(tree_sitter_renpy(), broken.as_ptr().cast(), broken.len());
        assert!(!tree.is_null());
        assert!(renpy_tree_has_error(tree));
        renpy_tree_delete(tree);

        assert!(renpy_parse(tree_sitter_renpy(), invalid.as_ptr().cast(), invalid.len()).is_null());

        let empty = renpy_parse(tree_sitter_renpy(), std::ptr::null(), 0);
        assert!(!empty.is_null());
        assert!(!renpy_tree_has_error(empty));
        renpy_tree_delete(empty);
    }
}
