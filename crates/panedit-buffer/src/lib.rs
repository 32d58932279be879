//! # Panedit Buffer
//!
//! Directory listings as editable line buffers.
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Ownership & Borrowing
//! - `DirBuffer` owns its lines, history and search state
//! - Accessors like `items()` return borrowed slices (`&[BufferItem]`)
//! - Mutations require `&mut self` (exclusive access)
//!
//! ### Shared Identity
//! - Every real line holds an `Arc<Origin>`
//! - Copies of a line share the origin, which is how a paste is later
//!   recognised as a copy of the same file

mod buffer;
mod cursor;
mod fuzzy;
mod history;
mod item;
mod selection;

pub use buffer::{BufferConfig, DirBuffer};
pub use cursor::{Position, byte_to_column, column_count, column_slice, column_to_byte, splice_columns};
pub use fuzzy::{FuzzyMatch, FuzzyState, MatchOptions, MatchSpan, match_items, match_text};
pub use history::{History, HistoryItem, Snapshot};
pub use item::{BufferItem, EntryKind, IdentityKey, Origin};
pub use selection::LineSelection;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Line {0} is out of bounds")]
    LineOutOfBounds(usize),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory() {
        let buffer = DirBuffer::new("/empty", Vec::<Origin>::new());
        assert!(buffer.is_empty());
        assert_eq!(buffer.cursor(), Position::ZERO);
        assert!(!buffer.has_prev());
    }

    #[test]
    fn test_buffer_from_entries() {
        let buffer = DirBuffer::new(
            "/dir",
            [Origin::directory("src"), Origin::file("Cargo.toml")],
        );
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.line_text(1), Some("Cargo.toml"));
        assert!(buffer.original_items().iter().all(BufferItem::is_real));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(BufferError::LineOutOfBounds(3).to_string(), "Line 3 is out of bounds");
        assert_eq!(BufferError::NothingToUndo.to_string(), "Nothing to undo");
    }
}
