//! One directory listing as an editable line buffer.
//!
//! ## Two Projections of One Directory
//!
//! - `original_items`: what the directory looked like when it was loaded.
//!   Never touched by editing; only an explicit reload replaces it.
//! - `items`: what the user has turned it into. Every edit goes here.
//!
//! The change aggregator compares the two across all buffers. Nothing in
//! this module performs I/O; entries are handed in by the caller.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::fuzzy::{FuzzyState, MatchOptions};
use crate::history::{History, HistoryItem, Snapshot};
use crate::selection::LineSelection;
use crate::{BufferError, BufferItem, BufferResult, Origin, Position};

/// Configuration for buffer behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Maximum history entries to keep
    pub max_history: usize,

    /// Maximum remembered fuzzy queries
    pub fuzzy_history_limit: usize,

    /// Fuzzy matching options
    pub match_options: MatchOptions,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_history: 1000,
            fuzzy_history_limit: 50,
            match_options: MatchOptions::default(),
        }
    }
}

/// An editable view of one directory.
#[derive(Debug, Clone)]
pub struct DirBuffer {
    /// Directory this buffer shows
    path: PathBuf,

    /// Current lines
    items: Vec<BufferItem>,

    /// Lines as loaded (all `Real`)
    original_items: Vec<BufferItem>,

    /// Undo/redo steps
    history: History,

    /// Cursor position, always clamped to `items`
    cursor: Position,

    /// Selected lines
    selection: LineSelection,

    /// Active fuzzy query and its matches
    fuzzy: FuzzyState,

    /// Previously committed fuzzy queries, oldest first
    fuzzy_history: Vec<String>,

    /// Bumped on every change to `items`
    revision: u64,

    /// Buffer-specific settings
    config: BufferConfig,
}

impl DirBuffer {
    /// Creates a buffer from a directory snapshot.
    ///
    /// # Example
    /// ```
    /// use panedit_buffer::{DirBuffer, Origin};
    ///
    /// let buffer = DirBuffer::new("/tmp", [Origin::file("a.txt")]);
    /// assert_eq!(buffer.len(), 1);
    /// assert!(!buffer.is_modified());
    /// ```
    pub fn new(path: impl Into<PathBuf>, entries: impl IntoIterator<Item = Origin>) -> Self {
        Self::with_config(path, entries, BufferConfig::default())
    }

    /// Creates a buffer with custom configuration.
    pub fn with_config(
        path: impl Into<PathBuf>,
        entries: impl IntoIterator<Item = Origin>,
        config: BufferConfig,
    ) -> Self {
        let original_items: Vec<BufferItem> = entries.into_iter().map(BufferItem::real).collect();
        Self {
            path: path.into(),
            items: original_items.clone(),
            original_items,
            history: History::new(config.max_history),
            cursor: Position::ZERO,
            selection: LineSelection::new(),
            fuzzy: FuzzyState::new(),
            fuzzy_history: Vec::new(),
            revision: 0,
            config,
        }
    }

    // ==================== Access ====================

    /// The directory this buffer shows.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lines.
    pub fn items(&self) -> &[BufferItem] {
        &self.items
    }

    /// Lines as loaded.
    pub fn original_items(&self) -> &[BufferItem] {
        &self.original_items
    }

    /// Returns one line.
    pub fn item(&self, line: usize) -> Option<&BufferItem> {
        self.items.get(line)
    }

    /// Returns the text of one line.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.items.get(line).map(BufferItem::text)
    }

    /// Number of lines.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true for an empty directory (or one emptied by edits).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the last line, if any.
    pub fn last_line(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }

    /// Returns true if `items` differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        self.items != self.original_items
    }

    /// Counter bumped on every change to `items`.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the buffer's configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    // ==================== Cursor & Selection ====================

    /// Cursor position.
    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Moves the cursor, clamping it to the lines.
    pub fn set_cursor(&mut self, position: Position) {
        self.cursor = position.clamp_to(&self.items);
    }

    /// Selected lines.
    pub fn selection(&self) -> &LineSelection {
        &self.selection
    }

    /// Mutable access to the selected lines.
    pub fn selection_mut(&mut self) -> &mut LineSelection {
        &mut self.selection
    }

    // ==================== Mutations ====================
    //
    // These never record history. Callers take a `snapshot()` first and
    // hand it to `record()` once the whole command is done, so one
    // command is one undo step.

    /// Removes an inclusive range of lines and returns them in order.
    pub fn remove_lines(&mut self, range: RangeInclusive<usize>) -> BufferResult<Vec<BufferItem>> {
        let (start, end) = (*range.start(), *range.end());
        if start > end || end >= self.items.len() {
            return Err(BufferError::LineOutOfBounds(end));
        }
        let removed: Vec<BufferItem> = self.items.drain(start..=end).collect();
        self.selection.lines_removed(start..=end);
        self.items_changed();
        Ok(removed)
    }

    /// Inserts lines so the first one lands at index `at`.
    pub fn insert_lines(&mut self, at: usize, lines: Vec<BufferItem>) -> BufferResult<()> {
        if at > self.items.len() {
            return Err(BufferError::LineOutOfBounds(at));
        }
        let count = lines.len();
        self.items.splice(at..at, lines);
        self.selection.lines_inserted(at, count);
        self.items_changed();
        Ok(())
    }

    /// Replaces the text of one line, keeping its identity.
    pub fn set_text(&mut self, line: usize, text: impl Into<String>) -> BufferResult<()> {
        let item = self
            .items
            .get_mut(line)
            .ok_or(BufferError::LineOutOfBounds(line))?;
        item.set_text(text);
        self.items_changed();
        Ok(())
    }

    /// Keeps derived state in step with `items`.
    fn items_changed(&mut self) {
        self.revision += 1;
        self.cursor = self.cursor.clamp_to(&self.items);
        self.selection.truncate(self.items.len());
        self.fuzzy.refresh(&self.items, self.config.match_options);
    }

    // ==================== Undo/Redo ====================

    /// Captures items and cursor.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
            cursor: self.cursor,
        }
    }

    /// Records one undo step from `before` to the current state.
    ///
    /// Returns false (and records nothing) if nothing changed.
    pub fn record(&mut self, before: Snapshot) -> bool {
        let item = HistoryItem::new(before, self.snapshot());
        if item.is_noop() {
            return false;
        }
        self.history.push(item);
        true
    }

    /// Reverts the last recorded step.
    pub fn undo(&mut self) -> BufferResult<()> {
        let snapshot = self.history.undo().ok_or(BufferError::NothingToUndo)?;
        self.restore(snapshot);
        Ok(())
    }

    /// Re-applies the last undone step.
    pub fn redo(&mut self) -> BufferResult<()> {
        let snapshot = self.history.redo().ok_or(BufferError::NothingToRedo)?;
        self.restore(snapshot);
        Ok(())
    }

    /// Returns true if there is a step to undo.
    pub fn has_prev(&self) -> bool {
        self.history.has_prev()
    }

    /// Returns true if there is a step to redo.
    pub fn has_next(&self) -> bool {
        self.history.has_next()
    }

    /// The undo history.
    pub fn history(&self) -> &History {
        &self.history
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.items = snapshot.items;
        self.cursor = snapshot.cursor;
        self.items_changed();
    }

    // ==================== Reload ====================

    /// Replaces the loaded snapshot with fresh entries.
    ///
    /// If the user had not changed anything, `items` follows the new
    /// snapshot and history is dropped. Otherwise the edits are kept and
    /// only `original_items` moves.
    pub fn reload(&mut self, entries: impl IntoIterator<Item = Origin>) {
        let untouched = !self.is_modified();
        self.original_items = entries.into_iter().map(BufferItem::real).collect();
        if untouched {
            self.items = self.original_items.clone();
            self.history.clear();
            self.selection.clear();
            self.items_changed();
        }
        tracing::debug!(path = %self.path.display(), untouched, "buffer reloaded");
    }

    // ==================== Search ====================

    /// The fuzzy query state.
    pub fn fuzzy(&self) -> &FuzzyState {
        &self.fuzzy
    }

    /// Previously committed queries, oldest first.
    pub fn fuzzy_history(&self) -> &[String] {
        &self.fuzzy_history
    }

    /// Sets the fuzzy query and recomputes matches.
    pub fn set_fuzzy_query(&mut self, query: impl Into<String>) {
        self.fuzzy
            .set_query(query, &self.items, self.config.match_options);
    }

    /// Remembers the current query in the fuzzy history.
    pub fn commit_fuzzy_query(&mut self) {
        let query = self.fuzzy.query();
        if query.is_empty() {
            return;
        }
        let query = query.to_string();
        self.fuzzy_history.retain(|q| *q != query);
        self.fuzzy_history.push(query);
        let limit = self.config.fuzzy_history_limit;
        if self.fuzzy_history.len() > limit {
            let excess = self.fuzzy_history.len() - limit;
            self.fuzzy_history.drain(..excess);
        }
    }

    /// Drops the query and its matches.
    pub fn clear_fuzzy(&mut self) {
        self.fuzzy.clear();
    }

    /// Line of the `count`-th match after (or before) the cursor.
    pub fn match_line(&self, forward: bool, count: usize) -> Option<usize> {
        let line = self.cursor.line;
        let index = if forward {
            self.fuzzy.index_after(line, count)?
        } else {
            self.fuzzy.index_before(line, count)?
        };
        Some(self.fuzzy.matches()[index].line)
    }

    /// Moves the cursor to the `count`-th next (or previous) match.
    pub fn jump_to_match(&mut self, forward: bool, count: usize) -> Option<usize> {
        let line = self.cursor.line;
        let index = if forward {
            self.fuzzy.index_after(line, count)?
        } else {
            self.fuzzy.index_before(line, count)?
        };
        let target = self.fuzzy.select(index)?;
        let column = self.fuzzy.matches()[index]
            .spans
            .first()
            .map_or(0, |span| span.start);
        self.set_cursor(Position::new(target, column));
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(names: &[&str]) -> DirBuffer {
        DirBuffer::new("/dir", names.iter().map(|n| Origin::file(*n)))
    }

    fn texts(buffer: &DirBuffer) -> Vec<&str> {
        buffer.items().iter().map(BufferItem::text).collect()
    }

    #[test]
    fn test_remove_and_insert() {
        let mut buf = buffer(&["a", "b", "c"]);
        let removed = buf.remove_lines(0..=1).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(texts(&buf), vec!["c"]);

        buf.insert_lines(1, removed).unwrap();
        assert_eq!(texts(&buf), vec!["c", "a", "b"]);
        assert!(buf.is_modified());

        assert!(buf.remove_lines(2..=5).is_err());
        assert!(buf.insert_lines(9, vec![]).is_err());
    }

    #[test]
    fn test_cursor_is_clamped_after_removal() {
        let mut buf = buffer(&["a", "bb", "ccc"]);
        buf.set_cursor(Position::new(2, 2));
        buf.remove_lines(1..=2).unwrap();
        assert_eq!(buf.cursor(), Position::new(0, 1));

        buf.remove_lines(0..=0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), Position::ZERO);
    }

    #[test]
    fn test_record_and_undo() {
        let mut buf = buffer(&["a", "b"]);
        let before = buf.snapshot();
        buf.set_text(0, "z").unwrap();
        assert!(buf.record(before));
        assert!(buf.has_prev());

        buf.undo().unwrap();
        assert_eq!(texts(&buf), vec!["a", "b"]);
        assert!(!buf.has_prev());
        assert!(buf.has_next());

        buf.redo().unwrap();
        assert_eq!(texts(&buf), vec!["z", "b"]);
        assert!(matches!(buf.redo(), Err(BufferError::NothingToRedo)));
    }

    #[test]
    fn test_noop_is_not_recorded() {
        let mut buf = buffer(&["a"]);
        let before = buf.snapshot();
        assert!(!buf.record(before));
        assert!(matches!(buf.undo(), Err(BufferError::NothingToUndo)));
    }

    #[test]
    fn test_reload_untouched_follows_snapshot() {
        let mut buf = buffer(&["a"]);
        buf.reload([Origin::file("a"), Origin::file("new")]);
        assert_eq!(texts(&buf), vec!["a", "new"]);
        assert!(!buf.is_modified());
    }

    #[test]
    fn test_reload_keeps_edits() {
        let mut buf = buffer(&["a"]);
        buf.set_text(0, "renamed").unwrap();
        buf.reload([Origin::file("a"), Origin::file("new")]);
        assert_eq!(texts(&buf), vec!["renamed"]);
        assert_eq!(buf.original_items().len(), 2);
    }

    #[test]
    fn test_fuzzy_follows_edits() {
        let mut buf = buffer(&["main.rs", "lib.rs", "README.md"]);
        buf.set_fuzzy_query("rs");
        assert_eq!(buf.fuzzy().matches().len(), 2);

        buf.set_text(2, "readme.rs").unwrap();
        assert_eq!(buf.fuzzy().matches().len(), 3);

        assert_eq!(buf.jump_to_match(true, 1), Some(1));
        assert_eq!(buf.cursor(), Position::new(1, 4));
        assert_eq!(buf.match_line(false, 1), Some(0));
    }

    #[test]
    fn test_fuzzy_history_dedupes() {
        let mut buf = buffer(&["a"]);
        for query in ["x", "y", "x"] {
            buf.set_fuzzy_query(query);
            buf.commit_fuzzy_query();
        }
        assert_eq!(buf.fuzzy_history(), &["y".to_string(), "x".to_string()]);
    }
}
