use crate::intervals::{FoldRegion, Interval, StyleId, StyleLayerId};
use crate::line_index::LineIndex;
use crate::processing::{DocumentProcessor, ProcessingEdit};
use crate::style::CaptureStyleMapper;
use renpy_syntax::{
    FOLDS_QUERY, HIGHLIGHTS_QUERY, Language, LanguageError, Node, Parser, Query, QueryCursor,
    QueryError, Tree,
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced by [`HighlightProcessor`].
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("language error: {0}")]
    /// Setting the parser language failed.
    Language(#[from] LanguageError),

    #[error("highlights query error: {0}")]
    /// Compiling the highlights query failed.
    HighlightsQuery(#[source] QueryError),

    #[error("folds query error: {0}")]
    /// Compiling the folds query failed.
    FoldsQuery(#[source] QueryError),
}

/// How the processor produced its parse tree for the last `process()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// First parse for this processor instance.
    Initial,
    /// The document changed and was parsed again from scratch.
    FullReparse,
    /// No work was performed (the processor already handled this version).
    Skipped,
}

/// Configuration for [`HighlightProcessor`].
#[derive(Debug, Clone)]
pub struct HighlightProcessorConfig {
    /// Grammar the queries are compiled against.
    pub language: &'static Language,
    /// Syntax highlighting query (`.scm`).
    pub highlights_query: String,
    /// Optional folding query (`.scm`). Each capture becomes a fold candidate.
    pub folds_query: Option<String>,
    /// Mapping from capture name (e.g. `"comment"`) to a `StyleId`.
    pub capture_styles: BTreeMap<String, StyleId>,
    /// Allocate ids through [`CaptureStyleMapper`] for captures without an explicit style.
    pub dynamic_capture_styles: bool,
    /// Target style layer id to replace.
    pub style_layer: StyleLayerId,
    /// Style for `ERROR` nodes, emitted on [`StyleLayerId::DIAGNOSTICS`] when set.
    pub error_style: Option<StyleId>,
    /// Whether to preserve the collapsed state for existing fold regions on replacement.
    pub preserve_collapsed_folds: bool,
}

impl HighlightProcessorConfig {
    /// Create a config with a highlights query.
    ///
    /// By default:
    /// - `style_layer` is [`StyleLayerId::TREE_SITTER`]
    /// - `preserve_collapsed_folds` is `true`
    /// - only captures listed in `capture_styles` produce intervals
    pub fn new(highlights_query: impl Into<String>) -> Self {
        Self {
            language: renpy_syntax::language(),
            highlights_query: highlights_query.into(),
            folds_query: None,
            capture_styles: BTreeMap::new(),
            dynamic_capture_styles: false,
            style_layer: StyleLayerId::TREE_SITTER,
            error_style: None,
            preserve_collapsed_folds: true,
        }
    }

    /// The bundled highlights and folds queries with dynamic capture styles.
    pub fn renpy() -> Self {
        Self::new(HIGHLIGHTS_QUERY)
            .with_default_folds()
            .with_dynamic_capture_styles()
    }

    /// Set a folding query.
    pub fn with_folds_query(mut self, folds_query: impl Into<String>) -> Self {
        self.folds_query = Some(folds_query.into());
        self
    }

    /// Use the bundled folds query (labels, python blocks, statements with bodies).
    pub fn with_default_folds(self) -> Self {
        self.with_folds_query(FOLDS_QUERY)
    }

    /// Add a set of capture name → style id mappings.
    pub fn with_simple_capture_styles<const N: usize>(
        mut self,
        styles: [(&'static str, StyleId); N],
    ) -> Self {
        for (name, style_id) in styles {
            self.capture_styles.insert(name.to_string(), style_id);
        }
        self
    }

    /// Allocate style ids for every capture that has no explicit mapping.
    pub fn with_dynamic_capture_styles(mut self) -> Self {
        self.dynamic_capture_styles = true;
        self
    }

    /// Emit `ERROR` nodes as intervals with `style_id` on the diagnostics layer.
    pub fn with_error_style(mut self, style_id: StyleId) -> Self {
        self.error_style = Some(style_id);
        self
    }

    /// Control whether fold replacement preserves collapsed state.
    pub fn set_preserve_collapsed_folds(&mut self, preserve: bool) {
        self.preserve_collapsed_folds = preserve;
    }
}

/// A query-driven Ren'Py document processor.
///
/// Each new document version is parsed in full; highlight and fold queries then run over
/// the tree and the results are returned as [`ProcessingEdit`]s.
pub struct HighlightProcessor {
    config: HighlightProcessorConfig,
    parser: Parser,
    highlight_query: Query,
    highlight_capture_styles: Vec<Option<StyleId>>,
    fold_query: Option<Query>,
    tree: Option<Tree>,
    line_index: LineIndex,
    last_processed_version: Option<u64>,
    last_update_mode: UpdateMode,
    /// Ids allocated for captures without an explicit style.
    pub style_mapper: CaptureStyleMapper,
}

impl HighlightProcessor {
    /// Create a new processor from the given config.
    pub fn new(config: HighlightProcessorConfig) -> Result<Self, HighlightError> {
        let mut parser = Parser::new();
        parser.set_language(config.language)?;

        let highlight_query = Query::new(config.language, &config.highlights_query)
            .map_err(HighlightError::HighlightsQuery)?;

        let mut style_mapper = CaptureStyleMapper::new();
        let highlight_capture_styles = highlight_query
            .capture_names()
            .iter()
            .map(|name| match config.capture_styles.get(name) {
                Some(&id) => Some(id),
                None if config.dynamic_capture_styles => {
                    Some(style_mapper.style_id_for_capture(name))
                }
                None => None,
            })
            .collect::<Vec<_>>();

        let fold_query = match config.folds_query.as_deref() {
            Some(q) if !q.trim().is_empty() => {
                Some(Query::new(config.language, q).map_err(HighlightError::FoldsQuery)?)
            }
            _ => None,
        };

        tracing::debug!(
            captures = highlight_query.capture_names().len(),
            folds = fold_query.is_some(),
            "highlight processor ready"
        );

        Ok(Self {
            config,
            parser,
            highlight_query,
            highlight_capture_styles,
            fold_query,
            tree: None,
            line_index: LineIndex::new(),
            last_processed_version: None,
            last_update_mode: UpdateMode::FullReparse,
            style_mapper,
        })
    }

    /// Get the last update mode (useful for tests and instrumentation).
    pub fn last_update_mode(&self) -> UpdateMode {
        self.last_update_mode
    }

    /// The tree produced by the last processed version.
    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Capture name for a style id this processor emits.
    pub fn capture_name_for_style(&self, style_id: StyleId) -> Option<&str> {
        self.config
            .capture_styles
            .iter()
            .find(|(_, id)| **id == style_id)
            .map(|(name, _)| name.as_str())
            .or_else(|| self.style_mapper.capture_for_style_id(style_id))
    }

    /// Offset conversions for the last processed text.
    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    fn interval_for(&self, node: Node<'_>, style_id: StyleId) -> Option<Interval> {
        let (start_byte, end_byte) = (node.start_byte(), node.end_byte());
        if end_byte <= start_byte {
            return None;
        }
        let start = self.line_index.byte_offset_to_char_offset(start_byte);
        let end = self.line_index.byte_offset_to_char_offset(end_byte);
        (end > start).then(|| Interval::new(start, end, style_id))
    }

    fn collect_highlight_intervals(&self, tree: &Tree) -> Vec<Interval> {
        let mut cursor = QueryCursor::new();
        let root = tree.root_node();
        let mut out = Vec::<Interval>::new();

        for m in cursor.matches(&self.highlight_query, root, tree.text().as_bytes()) {
            for capture in m.captures {
                let idx = capture.index as usize;
                let Some(style_id) = self.highlight_capture_styles.get(idx).and_then(|x| *x) else {
                    continue;
                };
                out.extend(self.interval_for(capture.node, style_id));
            }
        }

        out.sort_by_key(|i| (i.start, i.end, i.style_id));
        out.dedup_by(|a, b| a.start == b.start && a.end == b.end && a.style_id == b.style_id);
        out
    }

    fn collect_error_intervals(&self, tree: &Tree, style_id: StyleId) -> Vec<Interval> {
        let mut out = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            if !node.has_error() {
                continue;
            }
            if node.is_error() {
                out.extend(self.interval_for(node, style_id));
                continue;
            }
            stack.extend(node.children());
        }
        out.sort_by_key(|i| (i.start, i.end));
        out
    }

    fn collect_fold_regions(&self, tree: &Tree) -> Vec<FoldRegion> {
        let Some(query) = self.fold_query.as_ref() else {
            return Vec::new();
        };

        let mut cursor = QueryCursor::new();
        let root = tree.root_node();
        let mut regions = Vec::<FoldRegion>::new();

        for m in cursor.matches(query, root, tree.text().as_bytes()) {
            for capture in m.captures {
                let node = capture.node;
                let start_line = node.start_position().row;
                let end_line = node.end_position().row;
                if end_line > start_line {
                    regions.push(FoldRegion::new(start_line, end_line));
                }
            }
        }

        regions.sort_by_key(|r| (r.start_line, r.end_line));
        regions.dedup_by(|a, b| a.start_line == b.start_line && a.end_line == b.end_line);
        regions
    }
}

impl DocumentProcessor for HighlightProcessor {
    type Error = HighlightError;

    fn process(&mut self, text: &str, version: u64) -> Result<Vec<ProcessingEdit>, Self::Error> {
        if self.last_processed_version == Some(version) {
            self.last_update_mode = UpdateMode::Skipped;
            return Ok(Vec::new());
        }

        let update_mode = if self.tree.is_none() {
            UpdateMode::Initial
        } else {
            UpdateMode::FullReparse
        };
        self.line_index = LineIndex::from_text(text);
        self.tree = self.parser.parse(text);
        tracing::debug!(version, ?update_mode, "processed document");

        let Some(tree) = self.tree.as_ref() else {
            self.last_processed_version = Some(version);
            self.last_update_mode = update_mode;
            return Ok(Vec::new());
        };

        let intervals = self.collect_highlight_intervals(tree);
        let fold_regions = self.collect_fold_regions(tree);

        let mut edits = vec![ProcessingEdit::ReplaceStyleLayer {
            layer: self.config.style_layer,
            intervals,
        }];

        if let Some(style_id) = self.config.error_style {
            edits.push(ProcessingEdit::ReplaceStyleLayer {
                layer: StyleLayerId::DIAGNOSTICS,
                intervals: self.collect_error_intervals(tree, style_id),
            });
        }

        if self.fold_query.is_some() {
            edits.push(ProcessingEdit::ReplaceFoldingRegions {
                regions: fold_regions,
                preserve_collapsed: self.config.preserve_collapsed_folds,
            });
        }

        self.last_processed_version = Some(version);
        self.last_update_mode = update_mode;
        Ok(edits)
    }
}
