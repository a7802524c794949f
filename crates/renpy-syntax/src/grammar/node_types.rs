use super::Language;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
struct TypeRef {
    #[serde(rename = "type")]
    kind: &'static str,
    named: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ChildInfo {
    multiple: bool,
    required: bool,
    types: Vec<TypeRef>,
}

#[derive(Debug, Clone, Serialize)]
struct NodeTypeEntry {
    #[serde(rename = "type")]
    kind: &'static str,
    named: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<&'static str, ChildInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<ChildInfo>,
}

fn named(kinds: &[&'static str]) -> Vec<TypeRef> {
    kinds
        .iter()
        .copied()
        .map(|kind| TypeRef { kind, named: true })
        .collect()
}

fn anonymous(kinds: &[&'static str]) -> Vec<TypeRef> {
    kinds
        .iter()
        .copied()
        .map(|kind| TypeRef { kind, named: false })
        .collect()
}

fn child(multiple: bool, required: bool, types: Vec<TypeRef>) -> ChildInfo {
    ChildInfo {
        multiple,
        required,
        types,
    }
}

fn rule(
    kind: &'static str,
    fields: Vec<(&'static str, ChildInfo)>,
    children: Option<ChildInfo>,
) -> NodeTypeEntry {
    NodeTypeEntry {
        kind,
        named: true,
        fields: Some(fields.into_iter().collect()),
        children,
    }
}

fn leaf(kind: &'static str, named: bool) -> NodeTypeEntry {
    NodeTypeEntry {
        kind,
        named,
        fields: None,
        children: None,
    }
}

impl Language {
    /// Describes every visible node kind in the format of tree-sitter's `node-types.json`.
    pub fn node_types_json(&self) -> serde_json::Value {
        let items = [
            "block",
            "comment",
            "header",
            "python_block",
            "python_inline",
            "statement",
            "string",
        ];

        let mut entries = vec![
            rule(
                "arguments",
                Vec::new(),
                Some(child(true, false, named(&["identifier"]))),
            ),
            rule(
                "block",
                Vec::new(),
                Some(child(
                    true,
                    true,
                    named(&[
                        "block",
                        "python_block",
                        "python_expression",
                        "python_inline",
                        "statement",
                        "string",
                    ]),
                )),
            ),
            rule(
                "control_statement",
                vec![
                    ("body", child(false, false, named(&["block"]))),
                    ("keyword", child(false, true, anonymous(self.control_keywords))),
                ],
                Some(child(false, true, named(&["python_expression"]))),
            ),
            rule(
                "define_statement",
                vec![(
                    "keyword",
                    child(false, true, anonymous(self.definition_keywords)),
                )],
                Some(child(
                    true,
                    true,
                    named(&["identifier", "python_expression"]),
                )),
            ),
            rule(
                "header",
                vec![
                    ("args", child(false, false, named(&["arguments"]))),
                    ("body", child(false, true, named(&["block"]))),
                    ("identifier", child(false, false, named(&["identifier"]))),
                    ("keyword", child(false, true, anonymous(self.header_keywords))),
                    ("priority", child(false, false, named(&["number"]))),
                ],
                None,
            ),
            rule(
                "python_block",
                vec![
                    (
                        "keyword",
                        child(false, false, anonymous(self.python_block_prefixes)),
                    ),
                    ("priority", child(false, false, named(&["number"]))),
                ],
                Some(child(
                    true,
                    true,
                    named(&["identifier", "python_expression"]),
                )),
            ),
            rule(
                "python_inline",
                Vec::new(),
                Some(child(false, true, named(&["python_expression"]))),
            ),
            rule(
                "renpy_statement",
                vec![
                    ("body", child(false, false, named(&["block"]))),
                    (
                        "keyword",
                        child(false, true, anonymous(self.statement_keywords)),
                    ),
                ],
                Some(child(
                    true,
                    false,
                    named(&["arguments", "identifier", "number", "string"]),
                )),
            ),
            rule(
                "source_file",
                Vec::new(),
                Some(child(true, false, named(&items))),
            ),
            rule(
                "statement",
                Vec::new(),
                Some(child(
                    false,
                    true,
                    named(&["control_statement", "define_statement", "renpy_statement"]),
                )),
            ),
            rule(
                "string",
                Vec::new(),
                Some(child(
                    true,
                    false,
                    named(&["escape_interpolation", "escape_sequence"]),
                )),
            ),
        ];

        for kind in [
            "comment",
            "escape_interpolation",
            "escape_sequence",
            "identifier",
            "number",
            "python_expression",
        ] {
            entries.push(leaf(kind, true));
        }

        for meta in self.symbols.iter().filter(|m| m.visible && !m.named) {
            entries.push(leaf(meta.name, false));
        }

        entries.sort_by(|a, b| a.kind.cmp(b.kind).then(b.named.cmp(&a.named)));
        serde_json::to_value(entries).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use crate::language;

    #[test]
    fn test_node_types_cover_every_named_rule() {
        let value = language().node_types_json();
        let entries = value.as_array().expect("node types are an array");

        for meta in language().symbols().iter().filter(|m| m.visible && m.named) {
            if meta.name == "ERROR" {
                continue;
            }
            assert!(
                entries
                    .iter()
                    .any(|e| e["type"] == meta.name && e["named"] == true),
                "missing node type entry for {}",
                meta.name
            );
        }
    }

    #[test]
    fn test_header_fields_are_described() {
        let value = language().node_types_json();
        let header = value
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["type"] == "header")
            .unwrap();
        assert_eq!(header["fields"]["body"]["required"], true);
        assert_eq!(header["fields"]["priority"]["types"][0]["type"], "number");
        let keywords = header["fields"]["keyword"]["types"].as_array().unwrap();
        assert_eq!(keywords.len(), 5);
    }
}
