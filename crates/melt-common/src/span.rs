use std::ops::Range;

use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// Every position in the Melt compiler is a byte offset into the original
/// source string. Line/column pairs are computed on demand through
/// [`LineIndex`] when a diagnostic is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The span as a `usize` range, clamped to `len` and never empty unless
    /// the source itself is empty. Used by the diagnostic renderers.
    pub fn to_range(self, len: usize) -> Range<usize> {
        let start = (self.start as usize).min(len);
        let end = (self.end as usize).min(len).max(start);
        if start == end {
            start..(end + 1).min(len)
        } else {
            start..end
        }
    }
}

/// Line start offsets for turning a byte offset into a (line, column) pair.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    ///
    /// Column is measured in bytes from the start of the line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        // partition_point yields the first line starting after `offset`.
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line = line_idx as u32 + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_len_and_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.len(), 5);
        assert!(!a.is_empty());
        assert_eq!(a.merge(b), Span::new(5, 15));
    }

    #[test]
    fn to_range_widens_empty_spans() {
        assert_eq!(Span::new(3, 3).to_range(10), 3..4);
        assert_eq!(Span::new(2, 6).to_range(10), 2..6);
        // Clamped to the source length.
        assert_eq!(Span::new(8, 40).to_range(10), 8..10);
        assert_eq!(Span::new(10, 10).to_range(10), 10..10);
    }

    #[test]
    fn line_index_lookup() {
        let idx = LineIndex::new("func f():\n    return 1\n");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(9), (1, 10));
        assert_eq!(idx.line_col(10), (2, 1));
        assert_eq!(idx.line_col(14), (2, 5));
        assert_eq!(idx.line_count(), 3);
    }
}
