//! Offset conversions over a rope.

use ropey::Rope;

/// Line index backed by a [`Rope`], converting between byte offsets, char offsets and
/// line positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build an index for `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Char offset for a byte offset. Offsets inside a UTF-8 sequence round down.
    pub fn byte_offset_to_char_offset(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_char(byte_offset.min(self.rope.len_bytes()))
    }

    /// Byte offset for a char offset.
    pub fn char_offset_to_byte_offset(&self, char_offset: usize) -> usize {
        self.rope.char_to_byte(char_offset.min(self.rope.len_chars()))
    }

    /// Get line number and offset within line from character offset
    pub fn char_offset_to_position(&self, char_offset: usize) -> (usize, usize) {
        let char_offset = char_offset.min(self.rope.len_chars());

        let line_idx = self.rope.char_to_line(char_offset);
        let line_start_char = self.rope.line_to_char(line_idx);
        (line_idx, char_offset - line_start_char)
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}
