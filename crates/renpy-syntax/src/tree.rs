//! Concrete syntax trees.
//!
//! A [`Tree`] owns its source text and an arena of nodes. [`Node`] is a cheap `Copy`
//! handle into that arena, mirroring the shape of tree-sitter's node API so hosts can
//! switch between the two with little friction.

use crate::grammar::{FieldId, Language, Symbol, symbols};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A position in a document: zero-based row and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Point {
    /// Zero-based line number.
    pub row: usize,
    /// Zero-based byte offset within the line.
    pub column: usize,
}

impl Point {
    /// Create a point.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// A span of a document in both byte and point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    /// Start byte (inclusive).
    pub start_byte: usize,
    /// End byte (exclusive).
    pub end_byte: usize,
    /// Start position.
    pub start_point: Point,
    /// End position.
    pub end_point: Point,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    symbol: Symbol,
    field: Option<FieldId>,
    start_byte: usize,
    end_byte: usize,
    start_point: Point,
    end_point: Point,
    parent: Option<usize>,
    children: Vec<usize>,
    extra: bool,
    missing: bool,
    has_error: bool,
}

#[derive(Debug)]
struct TreeInner {
    language: &'static Language,
    text: String,
    nodes: Vec<NodeData>,
    root: usize,
}

/// A parsed Ren'Py document.
///
/// Cloning a tree is cheap: the node arena is shared.
#[derive(Clone)]
pub struct Tree {
    inner: Arc<TreeInner>,
}

impl Tree {
    /// The root `source_file` node.
    pub fn root_node(&self) -> Node<'_> {
        Node {
            tree: &self.inner,
            index: self.inner.root,
        }
    }

    /// The grammar this tree was parsed with.
    pub fn language(&self) -> &'static Language {
        self.inner.language
    }

    /// The source text the tree was parsed from.
    pub fn text(&self) -> &str {
        &self.inner.text
    }

    /// Total number of nodes in the tree, including anonymous tokens and extras.
    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    /// Create a cursor positioned at the root node.
    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {:?}}}", self.root_node())
    }
}

/// A handle to a single node in a [`Tree`].
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree TreeInner,
    index: usize,
}

impl<'tree> Node<'tree> {
    fn data(&self) -> &'tree NodeData {
        &self.tree.nodes[self.index]
    }

    fn at(&self, index: usize) -> Node<'tree> {
        Node {
            tree: self.tree,
            index,
        }
    }

    /// A number unique to this node within its tree.
    pub fn id(&self) -> usize {
        self.index
    }

    /// The node kind (`"header"`, `":"`, `"ERROR"`, ...).
    pub fn kind(&self) -> &'static str {
        self.tree.language.metadata(self.data().symbol).name
    }

    /// The numeric id of the node kind.
    pub fn kind_id(&self) -> u16 {
        self.data().symbol.id()
    }

    /// The kind name as written in the grammar. Same as [`Node::kind`] for this grammar.
    pub fn grammar_name(&self) -> &'static str {
        self.kind()
    }

    /// The grammar this node belongs to.
    pub fn language(&self) -> &'static Language {
        self.tree.language
    }

    /// Named nodes correspond to grammar rules; anonymous nodes are literal tokens.
    pub fn is_named(&self) -> bool {
        self.tree.language.metadata(self.data().symbol).named
    }

    /// Extras (comments) may appear anywhere and are not part of any rule.
    pub fn is_extra(&self) -> bool {
        self.data().extra
    }

    /// Whether this node is an `ERROR` node.
    pub fn is_error(&self) -> bool {
        self.data().symbol == symbols::ERROR
    }

    /// Whether the parser inserted this zero-width node to recover from an error.
    pub fn is_missing(&self) -> bool {
        self.data().missing
    }

    /// Whether this node or any descendant is an error or missing node.
    pub fn has_error(&self) -> bool {
        self.data().has_error
    }

    /// Start byte offset.
    pub fn start_byte(&self) -> usize {
        self.data().start_byte
    }

    /// End byte offset (exclusive).
    pub fn end_byte(&self) -> usize {
        self.data().end_byte
    }

    /// Byte range covered by this node.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    /// Start position.
    pub fn start_position(&self) -> Point {
        self.data().start_point
    }

    /// End position.
    pub fn end_position(&self) -> Point {
        self.data().end_point
    }

    /// Byte and point range of this node.
    pub fn range(&self) -> Range {
        let data = self.data();
        Range {
            start_byte: data.start_byte,
            end_byte: data.end_byte,
            start_point: data.start_point,
            end_point: data.end_point,
        }
    }

    /// The enclosing node, or `None` for the root.
    pub fn parent(&self) -> Option<Node<'tree>> {
        self.data().parent.map(|p| self.at(p))
    }

    /// Number of children, named and anonymous.
    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    /// The `i`th child.
    pub fn child(&self, i: usize) -> Option<Node<'tree>> {
        self.data().children.get(i).map(|&c| self.at(c))
    }

    /// All children in order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = Node<'tree>> + use<'tree> {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&index| Node { tree, index })
    }

    /// Named children in order.
    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + use<'tree> {
        self.children().filter(|c| c.is_named())
    }

    /// Number of named children.
    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    /// The `i`th named child.
    pub fn named_child(&self, i: usize) -> Option<Node<'tree>> {
        self.named_children().nth(i)
    }

    /// The first child stored under `field_name`.
    pub fn child_by_field_name(&self, field_name: &str) -> Option<Node<'tree>> {
        let field = self.tree.language.field_id_for_name(field_name)?;
        self.child_by_field_id(field)
    }

    /// The first child stored under `field`.
    pub fn child_by_field_id(&self, field: FieldId) -> Option<Node<'tree>> {
        self.children().find(|c| c.data().field == Some(field))
    }

    /// Every child stored under `field_name`.
    pub fn children_by_field_name(&self, field_name: &str) -> Vec<Node<'tree>> {
        let Some(field) = self.tree.language.field_id_for_name(field_name) else {
            return Vec::new();
        };
        self.children()
            .filter(|c| c.data().field == Some(field))
            .collect()
    }

    /// Field name under which this node is stored in its parent.
    pub fn field_name(&self) -> Option<&'static str> {
        let field = self.data().field?;
        self.tree.language.field_name_for_id(field.get())
    }

    /// Field id under which this node is stored in its parent.
    pub fn field_id(&self) -> Option<FieldId> {
        self.data().field
    }

    /// Field name of the `i`th child.
    pub fn field_name_for_child(&self, i: usize) -> Option<&'static str> {
        self.child(i)?.field_name()
    }

    fn sibling_index(&self) -> Option<(Node<'tree>, usize)> {
        let parent = self.parent()?;
        let idx = parent
            .data()
            .children
            .iter()
            .position(|&c| c == self.index)?;
        Some((parent, idx))
    }

    /// The next sibling, named or anonymous.
    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let (parent, idx) = self.sibling_index()?;
        parent.child(idx + 1)
    }

    /// The previous sibling, named or anonymous.
    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let (parent, idx) = self.sibling_index()?;
        idx.checked_sub(1).and_then(|i| parent.child(i))
    }

    /// The next named sibling.
    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        let (parent, idx) = self.sibling_index()?;
        parent.children().skip(idx + 1).find(|c| c.is_named())
    }

    /// The previous named sibling.
    pub fn prev_named_sibling(&self) -> Option<Node<'tree>> {
        let (parent, idx) = self.sibling_index()?;
        parent.children().take(idx).filter(|c| c.is_named()).last()
    }

    /// The smallest node that spans `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                if child.start_byte() <= start
                    && end <= child.end_byte()
                    && child.end_byte() > child.start_byte()
                {
                    node = child;
                    continue 'descend;
                }
            }
            return Some(node);
        }
    }

    /// The smallest named node that spans `start..end`.
    pub fn named_descendant_for_byte_range(
        &self,
        start: usize,
        end: usize,
    ) -> Option<Node<'tree>> {
        let mut node = self.descendant_for_byte_range(start, end)?;
        while !node.is_named() {
            node = node.parent()?;
        }
        Some(node)
    }

    /// Source text covered by this node.
    pub fn text(&self) -> &'tree str {
        self.tree
            .text
            .get(self.start_byte()..self.end_byte())
            .unwrap_or_default()
    }

    /// Source text covered by this node, read from `source`.
    pub fn utf8_text<'a>(&self, source: &'a [u8]) -> Result<&'a str, std::str::Utf8Error> {
        let end = self.end_byte().min(source.len());
        let start = self.start_byte().min(end);
        std::str::from_utf8(&source[start..end])
    }

    /// Create a cursor positioned at this node.
    pub fn walk(&self) -> TreeCursor<'tree> {
        TreeCursor {
            tree: self.tree,
            stack: vec![(self.index, 0)],
        }
    }

    /// Render the node as an S-expression of named nodes with field labels.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_sexp(*self, None, &mut out);
        out
    }

    /// Serialize the node and all descendants to JSON.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::from(self.kind()));
        obj.insert("named".into(), Value::from(self.is_named()));
        if let Some(field) = self.field_name() {
            obj.insert("field".into(), Value::from(field));
        }
        obj.insert("start_byte".into(), Value::from(self.start_byte()));
        obj.insert("end_byte".into(), Value::from(self.end_byte()));
        obj.insert(
            "start_point".into(),
            serde_json::to_value(self.start_position()).unwrap_or(Value::Null),
        );
        obj.insert(
            "end_point".into(),
            serde_json::to_value(self.end_position()).unwrap_or(Value::Null),
        );
        if self.is_missing() {
            obj.insert("missing".into(), Value::Bool(true));
        }
        if self.is_extra() {
            obj.insert("extra".into(), Value::Bool(true));
        }
        if self.child_count() > 0 {
            obj.insert(
                "children".into(),
                Value::Array(self.children().map(|c| c.to_json()).collect()),
            );
        }
        Value::Object(obj)
    }
}

fn write_sexp(node: Node<'_>, field: Option<&str>, out: &mut String) {
    if !out.is_empty() {
        out.push(' ');
    }
    if let Some(field) = field {
        out.push_str(field);
        out.push_str(": ");
    }

    if node.is_missing() {
        out.push_str("(MISSING ");
        if node.is_named() {
            out.push_str(node.kind());
        } else {
            out.push('"');
            for ch in node.kind().chars() {
                if ch == '"' {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push('"');
        }
        out.push(')');
        return;
    }

    out.push('(');
    out.push_str(node.kind());
    for child in node.children() {
        if child.is_named() || child.is_missing() {
            write_sexp(child, child.field_name(), out);
        }
    }
    out.push(')');
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for Node<'_> {}

impl std::hash::Hash for Node<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.tree as *const TreeInner).hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

/// A stateful cursor for walking a tree.
#[derive(Clone)]
pub struct TreeCursor<'tree> {
    tree: &'tree TreeInner,
    // (node index, index of that node within its parent's children)
    stack: Vec<(usize, usize)>,
}

impl<'tree> TreeCursor<'tree> {
    /// The node the cursor is currently on.
    pub fn node(&self) -> Node<'tree> {
        let (index, _) = self.stack[self.stack.len() - 1];
        Node {
            tree: self.tree,
            index,
        }
    }

    /// Field name of the current node within its parent.
    pub fn field_name(&self) -> Option<&'static str> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.node().field_name()
    }

    /// Depth relative to the node the cursor was created on.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Move to the first child. Returns `false` if the node has no children.
    pub fn goto_first_child(&mut self) -> bool {
        let node = self.node();
        match node.data().children.first() {
            Some(&first) => {
                self.stack.push((first, 0));
                true
            }
            None => false,
        }
    }

    /// Move to the next sibling. Returns `false` at the last child or at the starting node.
    pub fn goto_next_sibling(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        let (parent, _) = self.stack[self.stack.len() - 2];
        let (_, position) = self.stack[self.stack.len() - 1];
        let siblings = &self.tree.nodes[parent].children;
        match siblings.get(position + 1) {
            Some(&next) => {
                let last = self.stack.len() - 1;
                self.stack[last] = (next, position + 1);
                true
            }
            None => false,
        }
    }

    /// Move to the parent. Returns `false` at the starting node.
    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }
}

/// A child reference handed to [`TreeBuilder::node`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Child {
    pub(crate) index: usize,
    pub(crate) field: Option<FieldId>,
}

impl Child {
    pub(crate) fn plain(index: usize) -> Self {
        Self { index, field: None }
    }

    pub(crate) fn field(index: usize, field: FieldId) -> Self {
        Self {
            index,
            field: Some(field),
        }
    }
}

/// Append-only node arena used by the parser.
///
/// Nodes are created bottom-up. [`TreeBuilder::rollback`] discards nodes created after a
/// checkpoint, which lets the parser try alternatives without leaving orphans behind.
pub(crate) struct TreeBuilder<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
    nodes: Vec<NodeData>,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            text,
            line_starts,
            nodes: Vec::new(),
        }
    }

    pub(crate) fn point(&self, byte: usize) -> Point {
        let row = match self.line_starts.binary_search(&byte) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        Point::new(row, byte - self.line_starts[row])
    }

    pub(crate) fn checkpoint(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn rollback(&mut self, checkpoint: usize) {
        self.nodes.truncate(checkpoint);
    }

    pub(crate) fn kind_of(&self, index: usize) -> Symbol {
        self.nodes[index].symbol
    }

    pub(crate) fn end_of(&self, index: usize) -> usize {
        self.nodes[index].end_byte
    }

    fn push(&mut self, data: NodeData) -> usize {
        self.nodes.push(data);
        self.nodes.len() - 1
    }

    fn leaf_data(&self, symbol: Symbol, start: usize, end: usize) -> NodeData {
        NodeData {
            symbol,
            field: None,
            start_byte: start,
            end_byte: end,
            start_point: self.point(start),
            end_point: self.point(end),
            parent: None,
            children: Vec::new(),
            extra: false,
            missing: false,
            has_error: symbol == symbols::ERROR,
        }
    }

    /// A token spanning `start..end`.
    pub(crate) fn leaf(&mut self, symbol: Symbol, start: usize, end: usize) -> usize {
        let data = self.leaf_data(symbol, start, end);
        self.push(data)
    }

    /// An extra token (comment).
    pub(crate) fn extra(&mut self, symbol: Symbol, start: usize, end: usize) -> usize {
        let mut data = self.leaf_data(symbol, start, end);
        data.extra = true;
        self.push(data)
    }

    /// A zero-width node standing in for an expected but absent token or rule.
    pub(crate) fn missing(&mut self, symbol: Symbol, at: usize) -> usize {
        let mut data = self.leaf_data(symbol, at, at);
        data.missing = true;
        data.has_error = true;
        self.push(data)
    }

    /// An interior node over `children`. Empty nodes are placed at `fallback`.
    pub(crate) fn node(&mut self, symbol: Symbol, children: Vec<Child>, fallback: usize) -> usize {
        let (start, end) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => (
                self.nodes[first.index].start_byte,
                self.nodes[last.index].end_byte,
            ),
            _ => (fallback, fallback),
        };

        let mut data = self.leaf_data(symbol, start, end);
        let index = self.nodes.len();
        for child in &children {
            let node = &mut self.nodes[child.index];
            node.parent = Some(index);
            node.field = child.field;
            data.has_error |= node.has_error;
        }
        data.children = children.into_iter().map(|c| c.index).collect();
        self.push(data)
    }

    /// Finish the tree with a root spanning the whole document.
    pub(crate) fn finish(
        mut self,
        language: &'static Language,
        symbol: Symbol,
        children: Vec<Child>,
    ) -> Tree {
        let root = self.node(symbol, children, 0);
        let end = self.text.len();
        let end_point = self.point(end);
        let data = &mut self.nodes[root];
        data.start_byte = 0;
        data.start_point = Point::default();
        data.end_byte = end;
        data.end_point = end_point;

        Tree {
            inner: Arc::new(TreeInner {
                language,
                text: self.text.to_string(),
                nodes: self.nodes,
                root,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{language, symbols};

    fn sample_tree() -> Tree {
        // label start:\n    show eileen\n
        let text = "label start:\n    show eileen\n";
        let lang = language();
        let mut b = TreeBuilder::new(text);
        let kw = b.leaf(lang.keyword_symbol("label").unwrap(), 0, 5);
        let name = b.leaf(symbols::IDENTIFIER, 6, 11);
        let colon = b.leaf(symbols::COLON, 11, 12);
        let show = b.leaf(lang.keyword_symbol("show").unwrap(), 17, 21);
        let arg = b.leaf(symbols::IDENTIFIER, 22, 28);
        let stmt = b.node(
            symbols::RENPY_STATEMENT,
            vec![Child::field(show, symbols::FIELD_KEYWORD), Child::plain(arg)],
            17,
        );
        let wrapper = b.node(symbols::STATEMENT, vec![Child::plain(stmt)], 17);
        let block = b.node(symbols::BLOCK, vec![Child::plain(wrapper)], 17);
        let header = b.node(
            symbols::HEADER,
            vec![
                Child::field(kw, symbols::FIELD_KEYWORD),
                Child::field(name, symbols::FIELD_IDENTIFIER),
                Child::plain(colon),
                Child::field(block, symbols::FIELD_BODY),
            ],
            0,
        );
        b.finish(lang, symbols::SOURCE_FILE, vec![Child::plain(header)])
    }

    #[test]
    fn test_points_are_computed_from_line_starts() {
        let b = TreeBuilder::new("ab\ncd\n\nx");
        assert_eq!(b.point(0), Point::new(0, 0));
        assert_eq!(b.point(2), Point::new(0, 2));
        assert_eq!(b.point(3), Point::new(1, 0));
        assert_eq!(b.point(7), Point::new(3, 0));
        assert_eq!(b.point(8), Point::new(3, 1));
    }

    #[test]
    fn test_sexp_prints_named_nodes_and_fields() {
        let tree = sample_tree();
        assert_eq!(
            tree.root_node().to_sexp(),
            "(source_file (header identifier: (identifier) body: (block (statement (renpy_statement (identifier))))))"
        );
    }

    #[test]
    fn test_navigation() {
        let tree = sample_tree();
        let root = tree.root_node();
        assert_eq!(root.kind(), "source_file");
        assert_eq!(root.end_position(), Point::new(2, 0));

        let header = root.child(0).unwrap();
        assert_eq!(header.child_count(), 4);
        assert_eq!(header.named_child_count(), 2);
        assert_eq!(header.child_by_field_name("keyword").unwrap().kind(), "label");
        assert_eq!(header.child_by_field_name("identifier").unwrap().text(), "start");
        assert_eq!(header.field_name_for_child(2), None);

        let body = header.child_by_field_name("body").unwrap();
        assert_eq!(body.parent(), Some(header));
        assert_eq!(body.start_position(), Point::new(1, 4));
        assert_eq!(body.prev_sibling().unwrap().kind(), ":");
        assert_eq!(body.prev_named_sibling().unwrap().kind(), "identifier");
        assert!(body.next_sibling().is_none());

        let leaf = root.descendant_for_byte_range(23, 25).unwrap();
        assert_eq!(leaf.kind(), "identifier");
        assert_eq!(leaf.text(), "eileen");
        assert_eq!(leaf.utf8_text(tree.text().as_bytes()).unwrap(), "eileen");
        assert!(!root.has_error());
    }

    #[test]
    fn test_cursor_walk_visits_every_node() {
        let tree = sample_tree();
        let mut cursor = tree.walk();
        let mut seen = Vec::new();
        'walk: loop {
            seen.push((cursor.node().kind(), cursor.depth(), cursor.field_name()));
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    break 'walk;
                }
            }
        }
        assert_eq!(seen.len(), tree.node_count());
        assert_eq!(seen[0], ("source_file", 0, None));
        assert!(seen.contains(&("label", 2, Some("keyword"))));
        assert!(seen.contains(&("block", 2, Some("body"))));
    }

    #[test]
    fn test_missing_nodes_mark_ancestors() {
        let text = "label start";
        let lang = language();
        let mut b = TreeBuilder::new(text);
        let kw = b.leaf(lang.keyword_symbol("label").unwrap(), 0, 5);
        let colon = b.missing(symbols::COLON, 11);
        let header = b.node(
            symbols::HEADER,
            vec![Child::field(kw, symbols::FIELD_KEYWORD), Child::plain(colon)],
            0,
        );
        let tree = b.finish(lang, symbols::SOURCE_FILE, vec![Child::plain(header)]);
        let root = tree.root_node();
        assert!(root.has_error());
        assert_eq!(root.to_sexp(), "(source_file (header (MISSING \":\")))");
        let json = root.to_json();
        assert_eq!(json["children"][0]["children"][1]["missing"], true);
    }
}
