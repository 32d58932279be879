//! Undo/redo history management.
//!
//! ## Learning: Snapshots vs. Deltas
//!
//! A directory listing is small (hundreds of lines, not megabytes), so
//! each history entry stores the buffer state before and after the edit
//! instead of an inverse operation. Undo restores `before`, redo
//! restores `after`, and merging several edits into one undo step is
//! just a matter of keeping the earliest `before`.
//!
//! Cloning a snapshot is cheap where it matters: origins are shared
//! through `Arc`, only line text is copied.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{BufferItem, Position};

/// Items and cursor of a buffer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub items: Vec<BufferItem>,
    pub cursor: Position,
}

/// One undoable step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// State restored by undo
    pub before: Snapshot,
    /// State restored by redo
    pub after: Snapshot,
}

impl HistoryItem {
    /// Creates a history item.
    pub fn new(before: Snapshot, after: Snapshot) -> Self {
        Self { before, after }
    }

    /// Returns true if the step changed nothing.
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// Manages undo/redo history for one buffer.
///
/// ## Learning: VecDeque
///
/// We use `VecDeque` instead of `Vec` because we need efficient:
/// - Push to back (new edits)
/// - Pop from front (when at capacity)
/// - Pop from back (for undo)
#[derive(Debug, Clone)]
pub struct History {
    /// Stack of undoable steps
    undo_stack: VecDeque<HistoryItem>,
    /// Stack of redoable steps
    redo_stack: Vec<HistoryItem>,
    /// Maximum number of steps to keep
    max_size: usize,
}

impl History {
    /// Creates a new history with the given capacity.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_size.min(64)),
            redo_stack: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Pushes a step onto the history.
    ///
    /// Clears the redo stack (can't redo after new edit).
    pub fn push(&mut self, item: HistoryItem) {
        // Branching history not supported
        self.redo_stack.clear();
        self.undo_stack.push_back(item);

        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
            tracing::trace!(max = self.max_size, "history trimmed");
        }
        tracing::trace!(depth = self.undo_stack.len(), "history push");
    }

    /// Undoes the last step, returning the state to restore.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let item = self.undo_stack.pop_back()?;
        let restore = item.before.clone();
        self.redo_stack.push(item);
        Some(restore)
    }

    /// Redoes the last undone step, returning the state to restore.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let item = self.redo_stack.pop()?;
        let restore = item.after.clone();
        self.undo_stack.push_back(item);
        Some(restore)
    }

    /// Returns true if there are steps to undo.
    pub fn has_prev(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are steps to redo.
    pub fn has_next(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Returns the number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns the number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns the most recent undo step.
    pub fn last(&self) -> Option<&HistoryItem> {
        self.undo_stack.back()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(names: &[&str], line: usize) -> Snapshot {
        Snapshot {
            items: names.iter().map(|n| BufferItem::new_entry(*n)).collect(),
            cursor: Position::new(line, 0),
        }
    }

    #[test]
    fn test_history_undo_redo() {
        let mut history = History::new(100);
        history.push(HistoryItem::new(snap(&["a"], 0), snap(&["a", "b"], 1)));

        assert!(history.has_prev());
        assert!(!history.has_next());
        assert_eq!(history.undo(), Some(snap(&["a"], 0)));

        assert!(!history.has_prev());
        assert!(history.has_next());
        assert_eq!(history.redo(), Some(snap(&["a", "b"], 1)));
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut history = History::default();
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = History::new(10);
        history.push(HistoryItem::new(snap(&[], 0), snap(&["a"], 0)));
        history.undo();
        assert!(history.has_next());

        history.push(HistoryItem::new(snap(&[], 0), snap(&["b"], 0)));
        assert!(!history.has_next());
    }

    #[test]
    fn test_capacity() {
        let mut history = History::new(2);
        for name in ["a", "b", "c"] {
            history.push(HistoryItem::new(snap(&[], 0), snap(&[name], 0)));
        }
        assert_eq!(history.undo_count(), 2);
        assert_eq!(history.last().unwrap().after, snap(&["c"], 0));
    }
}
