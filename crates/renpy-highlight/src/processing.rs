//! Generic document processing interfaces.
//!
//! Processors produce [`ProcessingEdit`] values describing derived state (style layers and
//! folding regions) for a document; hosts apply them to whatever view they maintain.

use crate::intervals::{FoldRegion, Interval, StyleLayerId};

/// A change to derived document state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingEdit {
    /// Replace an entire style layer with the given intervals (char offsets).
    ReplaceStyleLayer {
        /// The style layer being replaced.
        layer: StyleLayerId,
        /// The full set of style intervals for the layer (char offsets, half-open).
        intervals: Vec<Interval>,
    },
    /// Replace folding regions.
    ///
    /// If `preserve_collapsed` is true, regions that match an existing collapsed region
    /// (`start_line`, `end_line`) should remain collapsed after replacement.
    ReplaceFoldingRegions {
        /// The complete set of folding regions.
        regions: Vec<FoldRegion>,
        /// Whether to preserve the collapsed/expanded state for regions that still exist.
        preserve_collapsed: bool,
    },
}

/// A processor that produces [`ProcessingEdit`]s for a versioned document.
pub trait DocumentProcessor {
    /// The error type returned by [`DocumentProcessor::process`].
    type Error;

    /// Compute derived state updates for `text` at `version`.
    ///
    /// Calling again with an unchanged `version` may return no edits.
    fn process(&mut self, text: &str, version: u64) -> Result<Vec<ProcessingEdit>, Self::Error>;
}
