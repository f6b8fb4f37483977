//! Byte ranges into the script being parsed.

/// A half-open byte range `start..end` of the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Creates a span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns true if the span covers no byte.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Span from the start of `self` to the end of `other`.
    #[must_use]
    pub const fn to(self, other: Self) -> Self {
        let end = if other.end > self.start {
            other.end
        } else {
            self.start
        };
        Self::new(self.start, end)
    }

    /// The covered text, empty when the span is out of range.
    #[must_use]
    pub fn text(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or_default()
    }

    /// One-based line and column of `start`.
    #[must_use]
    pub fn line_col(self, source: &str) -> (usize, usize) {
        let before = source.get(..self.start).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let col = before
            .rfind('\n')
            .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
            + 1;
        (line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text() {
        let sql = "USE db; DROP TABLE t";
        assert_eq!(Span::new(8, 20).text(sql), "DROP TABLE t");
        assert_eq!(Span::new(8, 99).text(sql), "");
        assert!(Span::new(4, 4).is_empty());
    }

    #[test]
    fn test_to_never_runs_backwards() {
        assert_eq!(Span::new(3, 5).to(Span::new(7, 9)), Span::new(3, 9));
        assert_eq!(Span::new(3, 5).to(Span::new(0, 1)), Span::new(3, 3));
    }

    #[test]
    fn test_line_col() {
        let sql = "USE db;\nALTER TABLE t\n  DROP COLUMN c";
        assert_eq!(Span::new(0, 3).line_col(sql), (1, 1));
        assert_eq!(Span::new(8, 13).line_col(sql), (2, 1));
        assert_eq!(Span::new(24, 28).line_col(sql), (3, 3));
    }
}
