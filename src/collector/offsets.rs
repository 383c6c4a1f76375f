//! LSP positions are `(line, UTF-16 code unit)`; `FileLine` wants byte
//! offsets and a 1-based line number. This is the one place that
//! conversion happens.

use lsp_types::Position;

pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Byte offset of an LSP `Position` within `text`.
    pub fn offset(&self, text: &str, pos: Position) -> usize {
        let line_start = *self.line_starts.get(pos.line as usize).unwrap_or(&text.len());
        let line_end = self.line_starts.get(pos.line as usize + 1).copied().unwrap_or(text.len());
        let line = text.get(line_start..line_end).unwrap_or("");

        let mut utf16_count = 0u32;
        let mut byte_offset = 0usize;
        for c in line.chars() {
            if utf16_count >= pos.character {
                break;
            }
            utf16_count += c.len_utf16() as u32;
            byte_offset += c.len_utf8();
        }
        line_start + byte_offset
    }

    /// 1-based line number containing `offset`.
    pub fn line_number(&self, offset: usize) -> u32 {
        self.line_starts.partition_point(|&s| s <= offset) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_on_first_line() {
        let text = "hello\nworld";
        let idx = LineIndex::new(text);
        let off = idx.offset(text, Position { line: 0, character: 3 });
        assert_eq!(off, 3);
    }

    #[test]
    fn offset_on_second_line() {
        let text = "hello\nworld";
        let idx = LineIndex::new(text);
        let off = idx.offset(text, Position { line: 1, character: 2 });
        assert_eq!(off, 8);
        assert_eq!(idx.line_number(off), 2);
    }
}
