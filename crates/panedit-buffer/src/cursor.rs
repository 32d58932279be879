//! Cursor positions and grapheme column helpers.
//!
//! ## Learning: Newtype Pattern
//!
//! `Position` is a struct that wraps line/column coordinates.
//! This is better than using `(usize, usize)` because:
//! - Type safety: Can't accidentally swap line and column
//! - Named fields: Self-documenting code
//! - Methods: Can add behavior specific to positions
//!
//! Columns count grapheme clusters, so `é` typed as `e` + combining
//! accent is one column, the same as the precomposed form.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::BufferItem;

/// A position in a directory buffer (line and column).
///
/// Both line and column are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in graphemes not bytes)
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Position at the start of the buffer.
    pub const ZERO: Position = Position { line: 0, column: 0 };

    /// Returns true if this position is before another.
    pub fn is_before(&self, other: &Position) -> bool {
        self.line < other.line || (self.line == other.line && self.column < other.column)
    }

    /// Clamps the position to the given lines.
    ///
    /// Line is clamped to `[0, len - 1]`, column to `[0, text width]`.
    /// An empty buffer only has `Position::ZERO`.
    pub fn clamp_to(self, items: &[BufferItem]) -> Position {
        let Some(last) = items.len().checked_sub(1) else {
            return Position::ZERO;
        };
        let line = self.line.min(last);
        let column = self.column.min(items[line].width());
        Position { line, column }
    }

    /// Same line, different column.
    pub fn with_column(self, column: usize) -> Position {
        Position { column, ..self }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.line.cmp(&other.line) {
            std::cmp::Ordering::Equal => self.column.cmp(&other.column),
            other => other,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display as 1-indexed for user-facing output
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Number of grapheme columns in `text`.
pub fn column_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Byte offset of a grapheme column (clamped to the end of `text`).
pub fn column_to_byte(text: &str, column: usize) -> usize {
    text.grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

/// Grapheme column containing a byte offset.
pub fn byte_to_column(text: &str, byte: usize) -> usize {
    text.grapheme_indices(true)
        .take_while(|(idx, _)| *idx < byte)
        .count()
}

/// Returns the text between two grapheme columns (end exclusive).
pub fn column_slice(text: &str, start: usize, end: usize) -> &str {
    let start = column_to_byte(text, start);
    let end = column_to_byte(text, end).max(start);
    &text[start..end]
}

/// Replaces the columns `start..end` of `text` with `replacement`.
pub fn splice_columns(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let start = column_to_byte(text, start);
    let end = column_to_byte(text, end).max(start);
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Origin;
    use proptest::prelude::*;

    #[test]
    fn test_position_ordering() {
        let p1 = Position::new(1, 5);
        let p2 = Position::new(2, 3);
        let p3 = Position::new(1, 10);

        assert!(p1.is_before(&p2));
        assert!(p1.is_before(&p3));
        assert!(p1 < p2);
        assert_eq!(p1.max(p3), p3);
    }

    #[test]
    fn test_clamp_to_items() {
        let items = vec![
            BufferItem::real(Origin::file("ab")),
            BufferItem::new_entry("abcd"),
        ];
        assert_eq!(Position::new(9, 9).clamp_to(&items), Position::new(1, 4));
        assert_eq!(Position::new(0, 9).clamp_to(&items), Position::new(0, 2));
        assert_eq!(Position::new(3, 1).clamp_to(&[]), Position::ZERO);
    }

    #[test]
    fn test_grapheme_columns() {
        let text = "e\u{301}x.txt";
        assert_eq!(column_count(text), 6);
        assert_eq!(column_slice(text, 0, 1), "e\u{301}");
        assert_eq!(byte_to_column(text, column_to_byte(text, 2)), 2);
        assert_eq!(splice_columns(text, 1, 2, "y"), "e\u{301}y.txt");
        assert_eq!(splice_columns("abc", 5, 9, "!"), "abc!");
    }

    proptest! {
        #[test]
        fn prop_splice_then_slice(text in "[a-z.éß]{0,12}", start in 0usize..14, len in 0usize..6, insert in "[a-z]{0,4}") {
            let width = column_count(&text);
            let start = start.min(width);
            let end = (start + len).min(width);
            let spliced = splice_columns(&text, start, end, &insert);

            prop_assert_eq!(column_slice(&spliced, 0, start), column_slice(&text, 0, start));
            prop_assert_eq!(column_slice(&spliced, start, start + insert.len()), insert.as_str());
            prop_assert_eq!(column_count(&spliced), width - (end - start) + insert.len());
        }

        #[test]
        fn prop_clamped_position_is_valid(names in prop::collection::vec("[a-z]{0,8}", 0..6), line in 0usize..10, column in 0usize..12) {
            let items: Vec<BufferItem> = names.iter().map(|n| BufferItem::new_entry(n.as_str())).collect();
            let clamped = Position::new(line, column).clamp_to(&items);
            if items.is_empty() {
                prop_assert_eq!(clamped, Position::ZERO);
            } else {
                prop_assert!(clamped.line < items.len());
                prop_assert!(clamped.column <= items[clamped.line].width());
                prop_assert_eq!(clamped.clamp_to(&items), clamped);
            }
        }
    }
}
