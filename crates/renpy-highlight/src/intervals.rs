//! Style intervals and fold regions.

/// Style identifier attached to an [`Interval`].
pub type StyleId = u32;

/// Style layer identifier.
///
/// Separates style sources so one layer can be replaced without touching the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleLayerId(pub u32);

impl StyleLayerId {
    /// Create a style layer id from a raw numeric identifier.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Query-driven syntax highlighting.
    pub const TREE_SITTER: Self = Self(1);

    /// Parse errors (`ERROR` nodes).
    pub const DIAGNOSTICS: Self = Self(2);
}

/// A styled half-open range `[start, end)` in char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Start offset
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Style ID
    pub style_id: StyleId,
}

impl Interval {
    /// Create a new interval with `[start, end)` offsets and a style id.
    pub fn new(start: usize, end: usize, style_id: StyleId) -> Self {
        Self {
            start,
            end,
            style_id,
        }
    }
}

/// A foldable line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    /// Start line number
    pub start_line: usize,
    /// End line number (inclusive)
    pub end_line: usize,
    /// Whether folded
    pub is_collapsed: bool,
}

impl FoldRegion {
    /// Create an expanded folding region for an inclusive line range.
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
            is_collapsed: false,
        }
    }

    /// Number of lines hidden when the region is collapsed.
    pub fn hidden_line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_region() {
        let region = FoldRegion::new(3, 7);
        assert!(!region.is_collapsed);
        assert_eq!(region.hidden_line_count(), 4);
    }
}
