#![warn(missing_docs)]
//! `renpy-highlight` - query-driven highlighting and folding for Ren'Py documents.
//!
//! This crate runs a document pipeline that produces:
//!
//! - highlight intervals (a style layer, char offsets)
//! - fold regions (derived from a folds query)
//! - optionally, an error layer for unparseable regions
//!
//! Output is expressed as [`ProcessingEdit`] values so hosts can apply it to their own view
//! state.

mod intervals;
mod line_index;
mod processing;
mod processor;
mod style;

pub use intervals::{FoldRegion, Interval, StyleId, StyleLayerId};
pub use line_index::LineIndex;
pub use processing::{DocumentProcessor, ProcessingEdit};
pub use processor::{HighlightError, HighlightProcessor, HighlightProcessorConfig, UpdateMode};
pub use style::CaptureStyleMapper;
