//! Source locations for tokens, nodes and diagnostics.
//!
//! Lines are 1-indexed and columns are 0-indexed, both measured after tab
//! expansion. Every location also carries the byte range it covers so that
//! a rewriting pass can splice the original text without recomputing
//! offsets.

use std::fmt;
use std::sync::Arc;

use text_size::{TextRange, TextSize};

/// A position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Where a token or node sits in its file.
///
/// `col_start` and `col_end` are inclusive; a location may span several
/// lines (block comments, continuations), in which case `end_line`
/// differs from `line`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
    pub end_line: u32,
    pub col_start: u32,
    pub col_end: u32,
    pub range: TextRange,
}

impl Location {
    pub fn new(
        file: Arc<str>,
        line: u32,
        col_start: u32,
        col_end: u32,
        range: TextRange,
    ) -> Self {
        Self {
            file,
            line,
            end_line: line,
            col_start,
            col_end,
            range,
        }
    }

    /// A zero-width location at the very end of a file
    pub fn end_of_file(file: Arc<str>, line: u32, offset: TextSize) -> Self {
        Self::new(file, line, 0, 0, TextRange::empty(offset))
    }

    pub fn start(&self) -> Position {
        Position::new(self.line, self.col_start)
    }

    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.col_end)
    }

    /// Smallest location covering both `self` and `other`.
    pub fn cover(&self, other: &Location) -> Location {
        let (first, last) = if self.start() <= other.start() {
            (self, other)
        } else {
            (other, self)
        };
        let (end_line, col_end) = if self.end() >= other.end() {
            (self.end_line, self.col_end)
        } else {
            (other.end_line, other.col_end)
        };
        Location {
            file: first.file.clone(),
            line: first.line,
            end_line,
            col_start: first.col_start,
            col_end,
            range: first.range.cover(last.range),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col_start + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32, start: u32, end: u32, offset: u32) -> Location {
        let range = TextRange::at(TextSize::new(offset), TextSize::new(end - start + 1));
        Location::new(Arc::from("t.m"), line, start, end, range)
    }

    #[test]
    fn test_cover_orders_operands() {
        let a = loc(1, 4, 6, 4);
        let b = loc(2, 0, 2, 10);
        let c = b.cover(&a);
        assert_eq!(c.line, 1);
        assert_eq!(c.end_line, 2);
        assert_eq!(c.col_start, 4);
        assert_eq!(c.col_end, 2);
        assert_eq!(c.range, TextRange::new(TextSize::new(4), TextSize::new(13)));
    }

    #[test]
    fn test_display_is_one_based_column() {
        assert_eq!(loc(3, 0, 1, 0).to_string(), "t.m:3:1");
    }
}
