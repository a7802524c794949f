//! Capture-name to style-id allocation.

use crate::intervals::StyleId;
use std::collections::HashMap;

/// Allocates stable [`StyleId`]s for query capture names (`keyword`, `string.escape`, ...).
///
/// Ids are dense within [`CaptureStyleMapper::BASE`] so they can be mapped back to the
/// capture name, e.g. to look up a theme entry.
#[derive(Debug, Clone, Default)]
pub struct CaptureStyleMapper {
    capture_to_id: HashMap<String, StyleId>,
    id_to_capture: Vec<String>,
}

impl CaptureStyleMapper {
    /// Base prefix for capture `StyleId`s.
    ///
    /// Values outside this range belong to explicitly configured styles.
    pub const BASE: StyleId = 0x0500_0000;

    /// Create a new mapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or allocate) a stable `StyleId` for a capture name.
    pub fn style_id_for_capture(&mut self, capture: &str) -> StyleId {
        if let Some(&id) = self.capture_to_id.get(capture) {
            return id;
        }

        // 0 is unused within the range.
        let idx = self.id_to_capture.len() as u32 + 1;
        let id = Self::BASE | idx;

        self.id_to_capture.push(capture.to_string());
        self.capture_to_id.insert(capture.to_string(), id);
        id
    }

    /// Return the capture name for a previously allocated `StyleId`.
    pub fn capture_for_style_id(&self, style_id: StyleId) -> Option<&str> {
        if style_id & 0xFF00_0000 != Self::BASE {
            return None;
        }
        let idx = (style_id & 0x00FF_FFFF).checked_sub(1)? as usize;
        self.id_to_capture.get(idx).map(|s| s.as_str())
    }

    /// Number of allocated ids.
    pub fn len(&self) -> usize {
        self.id_to_capture.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.id_to_capture.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_and_reversible() {
        let mut mapper = CaptureStyleMapper::new();
        let keyword = mapper.style_id_for_capture("keyword");
        let string = mapper.style_id_for_capture("string");
        assert_ne!(keyword, string);
        assert_eq!(mapper.style_id_for_capture("keyword"), keyword);
        assert_eq!(mapper.len(), 2);

        assert_eq!(mapper.capture_for_style_id(keyword), Some("keyword"));
        assert_eq!(mapper.capture_for_style_id(string), Some("string"));
        assert_eq!(mapper.capture_for_style_id(CaptureStyleMapper::BASE), None);
        assert_eq!(mapper.capture_for_style_id(7), None);
    }
}
