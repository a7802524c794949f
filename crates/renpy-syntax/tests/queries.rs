use renpy_syntax::{FOLDS_QUERY, HIGHLIGHTS_QUERY, Query, QueryCursor, language};
use std::collections::BTreeSet;

fn capture_names_for(query_source: &str, text: &str) -> BTreeSet<String> {
    let tree = renpy_syntax::parse(text);
    let query = Query::new(language(), query_source).expect("query compiles");
    let mut cursor = QueryCursor::new();
    cursor
        .captures(&query, tree.root_node(), text.as_bytes())
        .map(|(m, i)| query.capture_names()[m.captures[i].index as usize].clone())
        .collect()
}

#[test]
fn test_highlights_query_on_fixture() {
    let text = include_str!("fixtures/script.rpy");
    let names = capture_names_for(HIGHLIGHTS_QUERY, text);
    for expected in ["comment", "keyword", "function", "variable", "string", "embedded", "operator"] {
        assert!(names.contains(expected), "missing @{expected} in {names:?}");
    }
    assert!(!names.contains("error"));
}

#[test]
fn test_highlights_mark_errors() {
    let text = include_str!("fixtures/broken.rpy");
    let names = capture_names_for(HIGHLIGHTS_QUERY, text);
    assert!(names.contains("error"));
}

#[test]
fn test_folds_query_on_fixture() {
    let text = include_str!("fixtures/choices.rpy");
    let tree = renpy_syntax::parse(text);
    let query = Query::new(language(), FOLDS_QUERY).expect("folds compile");
    let mut cursor = QueryCursor::new();
    let mut rows: Vec<(usize, usize)> = cursor
        .matches(&query, tree.root_node(), text.as_bytes())
        .flat_map(|m| m.captures)
        .map(|c| (c.node.start_position().row, c.node.end_position().row))
        .collect();
    rows.sort();
    rows.dedup();
    // python block, header, menu, if, else
    assert_eq!(rows, vec![(0, 3), (5, 16), (7, 12), (13, 14), (15, 16)]);
}
