use super::Query;
use super::parse::{NodeMatcher, PatternKind, PatternNode, Predicate, PredicateArg, Quantifier};
use crate::tree::Node;
use std::ops::Range;

/// A node captured by a query pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryCapture<'tree> {
    /// The captured node.
    pub node: Node<'tree>,
    /// Index into [`Query::capture_names`].
    pub index: u32,
}

/// One successful match of a query pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch<'tree> {
    /// Index of the pattern that matched.
    pub pattern_index: usize,
    /// Captured nodes, in pattern order.
    pub captures: Vec<QueryCapture<'tree>>,
}

impl<'tree> QueryMatch<'tree> {
    /// Nodes captured under `index`.
    pub fn nodes_for_capture_index(&self, index: u32) -> impl Iterator<Item = Node<'tree>> + '_ {
        self.captures
            .iter()
            .filter(move |c| c.index == index)
            .map(|c| c.node)
    }
}

/// Iterator over the matches produced by [`QueryCursor::matches`].
pub struct QueryMatches<'tree> {
    inner: std::vec::IntoIter<QueryMatch<'tree>>,
}

impl<'tree> Iterator for QueryMatches<'tree> {
    type Item = QueryMatch<'tree>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over `(match, capture position)` pairs produced by [`QueryCursor::captures`],
/// ordered by the start byte of the captured node.
pub struct QueryCaptures<'tree> {
    inner: std::vec::IntoIter<(QueryMatch<'tree>, usize)>,
}

impl<'tree> Iterator for QueryCaptures<'tree> {
    type Item = (QueryMatch<'tree>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Executes a [`Query`] against a syntax tree.
#[derive(Debug, Clone, Default)]
pub struct QueryCursor {
    byte_range: Option<Range<usize>>,
}

impl QueryCursor {
    /// Create a cursor with no range restriction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report matches rooted at nodes intersecting `range`.
    pub fn set_byte_range(&mut self, range: Range<usize>) -> &mut Self {
        self.byte_range = Some(range);
        self
    }

    /// Every match of every pattern, rooted at `node` or its descendants.
    ///
    /// Matches are ordered by the document position of the node they are rooted at, then
    /// by pattern index.
    pub fn matches<'tree>(
        &mut self,
        query: &Query,
        node: Node<'tree>,
        text: &[u8],
    ) -> QueryMatches<'tree> {
        QueryMatches {
            inner: self.collect(query, node, text).into_iter(),
        }
    }

    /// Every capture of every match, ordered by the start byte of the captured node.
    pub fn captures<'tree>(
        &mut self,
        query: &Query,
        node: Node<'tree>,
        text: &[u8],
    ) -> QueryCaptures<'tree> {
        let mut out = Vec::new();
        for m in self.collect(query, node, text) {
            for i in 0..m.captures.len() {
                out.push((m.clone(), i));
            }
        }
        out.sort_by_key(|(m, i)| m.captures[*i].node.start_byte());
        QueryCaptures {
            inner: out.into_iter(),
        }
    }

    fn intersects(&self, node: Node<'_>) -> bool {
        match &self.byte_range {
            None => true,
            Some(range) => {
                node.start_byte() < range.end
                    && (node.end_byte() > range.start
                        || (node.start_byte() == node.end_byte() && node.start_byte() >= range.start))
            }
        }
    }

    fn collect<'tree>(&self, query: &Query, node: Node<'tree>, text: &[u8]) -> Vec<QueryMatch<'tree>> {
        let mut out = Vec::new();
        if !self.intersects(node) {
            return out;
        }

        let mut cursor = node.walk();
        'walk: loop {
            let current = cursor.node();
            for (pattern_index, pattern) in query.patterns().iter().enumerate() {
                if !fits(&pattern.root, current) {
                    continue;
                }
                for captures in node_solutions(&pattern.root, current) {
                    if pattern
                        .predicates
                        .iter()
                        .all(|p| predicate_holds(p, &captures, text))
                    {
                        out.push(QueryMatch {
                            pattern_index,
                            captures,
                        });
                    }
                }
            }

            if cursor.goto_first_child() {
                if self.intersects(cursor.node()) {
                    continue;
                }
                if advance(&mut cursor, self) {
                    continue;
                }
                break 'walk;
            }
            if !advance(&mut cursor, self) {
                break 'walk;
            }
        }

        tracing::trace!(matches = out.len(), "query matched");
        out
    }
}

/// Move to the next intersecting node in pre-order without descending. Returns `false`
/// once the walk is back at its starting node.
fn advance(cursor: &mut crate::TreeCursor<'_>, query_cursor: &QueryCursor) -> bool {
    loop {
        while cursor.goto_next_sibling() {
            if query_cursor.intersects(cursor.node()) {
                return true;
            }
        }
        if !cursor.goto_parent() {
            return false;
        }
    }
}

impl NodeMatcher {
    fn accepts(self, node: Node<'_>) -> bool {
        match self {
            NodeMatcher::Named(id) => node.is_named() && node.kind_id() == id,
            NodeMatcher::AnyNamed => node.is_named(),
            NodeMatcher::Any => true,
            NodeMatcher::Anonymous(id) => !node.is_named() && node.kind_id() == id,
        }
    }
}

fn fits(pattern: &PatternNode, node: Node<'_>) -> bool {
    pattern.field.is_none_or(|field| node.field_id() == Some(field))
}

fn prefixed<'tree>(
    head: &[QueryCapture<'tree>],
    tail: Vec<QueryCapture<'tree>>,
) -> Vec<QueryCapture<'tree>> {
    let mut captures = Vec::with_capacity(head.len() + tail.len());
    captures.extend_from_slice(head);
    captures.extend(tail);
    captures
}

/// Capture lists produced by matching `pattern` at `node`: one per child that can start
/// the child sequence, the rest of the sequence taking the earliest matching children.
fn node_solutions<'tree>(pattern: &PatternNode, node: Node<'tree>) -> Vec<Vec<QueryCapture<'tree>>> {
    let own = own_captures(pattern, node);

    match &pattern.kind {
        PatternKind::Node { matcher, children } => {
            if !matcher.accepts(node) {
                return Vec::new();
            }
            let kids: Vec<Node<'tree>> = node.children().collect();
            sequence_solutions(children, &kids)
                .into_iter()
                .map(|tail| prefixed(&own, tail))
                .collect()
        }
        PatternKind::Alternation(alternatives) => alternatives
            .iter()
            .filter(|alt| fits(alt, node))
            .flat_map(|alt| node_solutions(alt, node))
            .map(|tail| prefixed(&own, tail))
            .collect(),
    }
}

/// Enumerate the child that starts the sequence; everything after it is matched greedily.
fn sequence_solutions<'tree>(
    patterns: &[PatternNode],
    children: &[Node<'tree>],
) -> Vec<Vec<QueryCapture<'tree>>> {
    let Some((first, rest)) = patterns.split_first() else {
        return vec![Vec::new()];
    };
    if first.quantifier != Quantifier::One {
        return first_sequence(patterns, children).into_iter().collect();
    }

    children
        .iter()
        .enumerate()
        .filter(|(_, child)| fits(first, **child))
        .filter_map(|(i, &child)| {
            let head = first_solution(first, child)?;
            let tail = first_sequence(rest, &children[i + 1..])?;
            Some(prefixed(&head, tail))
        })
        .collect()
}

fn own_captures<'tree>(pattern: &PatternNode, node: Node<'tree>) -> Vec<QueryCapture<'tree>> {
    pattern
        .captures
        .iter()
        .map(|&index| QueryCapture { node, index })
        .collect()
}

/// The first capture list for `pattern` at `node`, if it matches at all.
fn first_solution<'tree>(pattern: &PatternNode, node: Node<'tree>) -> Option<Vec<QueryCapture<'tree>>> {
    let own = own_captures(pattern, node);
    let tail = match &pattern.kind {
        PatternKind::Node { matcher, children } => {
            if !matcher.accepts(node) {
                return None;
            }
            let kids: Vec<Node<'tree>> = node.children().collect();
            first_sequence(children, &kids)?
        }
        PatternKind::Alternation(alternatives) => alternatives
            .iter()
            .filter(|alt| fits(alt, node))
            .find_map(|alt| first_solution(alt, node))?,
    };
    Some(prefixed(&own, tail))
}

fn earliest<'tree>(
    pattern: &PatternNode,
    children: &[Node<'tree>],
) -> Option<(usize, Vec<QueryCapture<'tree>>)> {
    children
        .iter()
        .enumerate()
        .filter(|(_, child)| fits(pattern, **child))
        .find_map(|(i, &child)| first_solution(pattern, child).map(|head| (i, head)))
}

/// Match `patterns` against an ordered subsequence of `children`, each pattern taking the
/// earliest child it accepts. Child patterns are independent of each other, so a greedy
/// choice finds a subsequence whenever one exists.
fn first_sequence<'tree>(
    patterns: &[PatternNode],
    children: &[Node<'tree>],
) -> Option<Vec<QueryCapture<'tree>>> {
    let Some((first, rest)) = patterns.split_first() else {
        return Some(Vec::new());
    };

    match first.quantifier {
        Quantifier::One => {
            let (i, head) = earliest(first, children)?;
            let tail = first_sequence(rest, &children[i + 1..])?;
            Some(prefixed(&head, tail))
        }
        Quantifier::ZeroOrOne => {
            if let Some((i, head)) = earliest(first, children)
                && let Some(tail) = first_sequence(rest, &children[i + 1..])
            {
                return Some(prefixed(&head, tail));
            }
            first_sequence(rest, children)
        }
        Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
            // Repetitions are greedy: every matching child is taken.
            let mut head = Vec::new();
            let mut count = 0;
            let mut after = 0;
            for (i, &child) in children.iter().enumerate() {
                if !fits(first, child) {
                    continue;
                }
                if let Some(solution) = first_solution(first, child) {
                    head.extend(solution);
                    count += 1;
                    after = i + 1;
                }
            }
            if count == 0 && first.quantifier == Quantifier::OneOrMore {
                return None;
            }
            let tail = first_sequence(rest, &children[after..])?;
            Some(prefixed(&head, tail))
        }
    }
}

fn capture_texts<'a>(captures: &[QueryCapture<'_>], index: u32, text: &'a [u8]) -> Vec<&'a str> {
    captures
        .iter()
        .filter(|c| c.index == index)
        .map(|c| c.node.utf8_text(text).unwrap_or_default())
        .collect()
}

fn predicate_holds(predicate: &Predicate, captures: &[QueryCapture<'_>], text: &[u8]) -> bool {
    match predicate {
        Predicate::Eq {
            capture,
            other,
            negate,
        } => {
            let left = capture_texts(captures, *capture, text);
            let right: Vec<&str> = match other {
                PredicateArg::Capture(other) => capture_texts(captures, *other, text),
                PredicateArg::String(value) => vec![value.as_str()],
            };
            left.iter()
                .all(|l| right.iter().all(|r| (l == r) != *negate))
        }
        Predicate::Match {
            capture,
            regex,
            negate,
        } => capture_texts(captures, *capture, text)
            .iter()
            .all(|t| regex.is_match(t) != *negate),
        Predicate::AnyOf {
            capture,
            values,
            negate,
        } => capture_texts(captures, *capture, text)
            .iter()
            .all(|t| values.iter().any(|v| v == t) != *negate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parser, Tree, language};

    fn parse(text: &str) -> Tree {
        let mut parser = Parser::new();
        parser.set_language(language()).unwrap();
        parser.parse(text).unwrap()
    }

    fn captured(query: &str, text: &str) -> Vec<(String, String)> {
        let tree = parse(text);
        let query = Query::new(language(), query).unwrap();
        let mut cursor = QueryCursor::new();
        cursor
            .captures(&query, tree.root_node(), text.as_bytes())
            .map(|(m, i)| {
                let capture = m.captures[i];
                (
                    query.capture_names()[capture.index as usize].clone(),
                    capture.node.text().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_each_matching_child_is_reported() {
        let caps = captured(
            "(arguments (identifier) @param)",
            "label greet(name, mood):\n    pass\n",
        );
        assert_eq!(
            caps,
            vec![
                ("param".to_string(), "name".to_string()),
                ("param".to_string(), "mood".to_string()),
            ]
        );
    }

    #[test]
    fn test_fields_and_literals() {
        let caps = captured(
            "(header keyword: _ @kw identifier: (identifier) @name \":\" @colon)",
            "label start:\n    pass x\n",
        );
        assert_eq!(
            caps,
            vec![
                ("kw".to_string(), "label".to_string()),
                ("name".to_string(), "start".to_string()),
                ("colon".to_string(), ":".to_string()),
            ]
        );
    }

    #[test]
    fn test_alternation_and_predicates() {
        let text = "label a:\n    show True eileen None\n";
        let caps = captured(
            "((identifier) @const (#any-of? @const \"True\" \"None\"))",
            text,
        );
        assert_eq!(caps.len(), 2);

        let caps = captured("((identifier) @x (#match? @x \"^e\"))", text);
        assert_eq!(caps, vec![("x".to_string(), "eileen".to_string())]);

        let caps = captured("((identifier) @x (#not-eq? @x \"a\"))", text);
        assert_eq!(caps.len(), 3);

        let caps = captured("[(comment) (number)] @lit", "# c\ninit 5:\n    pass x\n");
        assert_eq!(caps.len(), 2);
    }

    #[test]
    fn test_quantifiers() {
        let text = "label a:\n    show x\n    hide y\n";
        let tree = parse(text);
        let query = Query::new(language(), "(block (statement)+ @stmts)").unwrap();
        let matches: Vec<_> = QueryCursor::new()
            .matches(&query, tree.root_node(), text.as_bytes())
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].nodes_for_capture_index(0).count(), 2);

        let query = Query::new(language(), "(header (arguments)? @args body: (block) @body)").unwrap();
        let matches: Vec<_> = QueryCursor::new()
            .matches(&query, tree.root_node(), text.as_bytes())
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].captures.len(), 1);
    }

    #[test]
    fn test_sequences_take_the_earliest_following_children() {
        let mut text = String::from("label a:\n");
        for i in 0..300 {
            text.push_str(&format!("    jump l{i}\n"));
        }
        let tree = parse(&text);
        let query = Query::new(
            language(),
            "(block (statement) @a (statement) @b (statement) @c)",
        )
        .unwrap();
        let matches: Vec<_> = QueryCursor::new()
            .matches(&query, tree.root_node(), text.as_bytes())
            .collect();
        assert_eq!(matches.len(), 298);
        let first: Vec<_> = matches[0].captures.iter().map(|c| c.node.text()).collect();
        assert_eq!(first, vec!["jump l0", "jump l1", "jump l2"]);
        let last: Vec<_> = matches[297].captures.iter().map(|c| c.node.text()).collect();
        assert_eq!(last, vec!["jump l297", "jump l298", "jump l299"]);

        let query = Query::new(language(), "(block (statement) @a (comment) @b)").unwrap();
        assert_eq!(
            QueryCursor::new()
                .matches(&query, tree.root_node(), text.as_bytes())
                .count(),
            0
        );
    }

    #[test]
    fn test_byte_range_limits_matches() {
        let text = "# one\n# two\n# three\n";
        let tree = parse(text);
        let query = Query::new(language(), "(comment) @c").unwrap();
        let mut cursor = QueryCursor::new();
        cursor.set_byte_range(6..12);
        let texts: Vec<_> = cursor
            .matches(&query, tree.root_node(), text.as_bytes())
            .map(|m| m.captures[0].node.text())
            .collect();
        assert_eq!(texts, vec!["# two"]);
    }

    #[test]
    fn test_matches_follow_document_order() {
        let text = "define a = 1\ndefine b = 2\n";
        let tree = parse(text);
        let query = Query::new(language(), "(define_statement (identifier) @name)").unwrap();
        let names: Vec<_> = QueryCursor::new()
            .matches(&query, tree.root_node(), text.as_bytes())
            .map(|m| m.captures[0].node.text())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
