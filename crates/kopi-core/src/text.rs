//! Text ranges and line/column conversion.

pub use text_size::{TextRange, TextSize};

/// Zero-based line and byte column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Pre-computed line start offsets for a particular text snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(64);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    line_starts.push(TextSize::from((i + 2) as u32));
                    i += 2;
                }
                b'\r' => {
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                _ => i += 1,
            }
        }

        Self {
            line_starts,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    pub fn line_col(&self, offset: TextSize) -> LineCol {
        // Offsets past the end clamp to EOF.
        let offset = offset.min(self.text_len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(insert) => insert.saturating_sub(1),
        };
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_handles_mixed_line_endings() {
        let index = LineIndex::new("a\r\nbc\nd\re");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_col(TextSize::from(0)), LineCol { line: 0, col: 0 });
        assert_eq!(index.line_col(TextSize::from(4)), LineCol { line: 1, col: 1 });
        assert_eq!(index.line_col(TextSize::from(6)), LineCol { line: 2, col: 0 });
        assert_eq!(index.line_col(TextSize::from(8)), LineCol { line: 3, col: 0 });
        assert_eq!(index.line_col(TextSize::from(99)), LineCol { line: 3, col: 1 });
    }
}
