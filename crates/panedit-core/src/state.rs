//! Editing state shared by all panes.
//!
//! ## Learning: State Machines as Plain Data
//!
//! Every keystroke is a `&mut State` transition. Nothing here performs I/O
//! or spawns work, and `State: Clone`, so a caller can keep the previous
//! value around and compare (which is exactly what the tests do).
//!
//! The grammar's partial input lives in a handful of `Option` fields:
//! `count`, `pending_operator`, `pending_find`, `text_object_modifier`.
//! Each is consumed by the command that completes it and cleared by `esc`.

use std::path::{Path, PathBuf};

use panedit_buffer::{BufferConfig, DirBuffer, FuzzyState, LineSelection, Origin, Position, Snapshot};

use crate::buffers::BufferSet;
use crate::motion::FindKind;
use crate::register::Registry;
use crate::textobject::{TextObjectModifier, TextObjects};
use crate::{CoreError, CoreResult};

/// Editing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Motions, operators, paste, undo
    #[default]
    Normal,
    /// Typing into one line; closed by `esc`
    Insert,
}

/// Operators waiting for a motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Delete,
    Yank,
    Change,
}

impl Operator {
    /// The key that starts this operator.
    pub fn key(&self) -> char {
        match self {
            Operator::Delete => 'd',
            Operator::Yank => 'y',
            Operator::Change => 'c',
        }
    }

    /// Maps `d`/`y`/`c` to an operator.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'd' => Some(Operator::Delete),
            'y' => Some(Operator::Yank),
            'c' => Some(Operator::Change),
            _ => None,
        }
    }
}

/// An operator and the count typed before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperator {
    pub operator: Operator,
    pub count: Option<usize>,
}

/// An open insert session.
///
/// Holds the buffer state from before the command that opened the
/// session, so the edit and the text typed afterwards undo as one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertSession {
    /// Buffer being edited
    pub directory: PathBuf,
    /// Line receiving the typed text
    pub line: usize,
    /// Buffer state before the opening command
    pub before: Snapshot,
}

/// The whole editing state.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub(crate) mode: Mode,
    pub(crate) buffers: BufferSet,
    pub(crate) registry: Registry,
    pub(crate) count: Option<usize>,
    pub(crate) pending_operator: Option<PendingOperator>,
    pub(crate) pending_find: Option<FindKind>,
    pub(crate) text_object_modifier: Option<TextObjectModifier>,
    pub(crate) insert_session: Option<InsertSession>,
    pub(crate) text_objects: TextObjects,
    pub(crate) buffer_config: BufferConfig,
}

impl State {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state whose buffers use `config`.
    pub fn with_buffer_config(config: BufferConfig) -> Self {
        Self {
            buffer_config: config,
            ..Self::default()
        }
    }

    // ==================== Selectors ====================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// All open buffers.
    pub fn buffers(&self) -> &BufferSet {
        &self.buffers
    }

    /// Returns a buffer by directory.
    pub fn buffer(&self, path: &Path) -> Option<&DirBuffer> {
        self.buffers.get(path)
    }

    /// The buffer that receives commands.
    pub fn active_buffer(&self) -> Option<&DirBuffer> {
        self.buffers.active()
    }

    /// Directory of the active buffer.
    pub fn active_path(&self) -> Option<&Path> {
        self.buffers.active_path()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count typed so far.
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    pub fn pending_operator(&self) -> Option<PendingOperator> {
        self.pending_operator
    }

    pub fn pending_find(&self) -> Option<FindKind> {
        self.pending_find
    }

    pub fn text_object_modifier(&self) -> Option<TextObjectModifier> {
        self.text_object_modifier
    }

    pub fn insert_session(&self) -> Option<&InsertSession> {
        self.insert_session.as_ref()
    }

    /// Cursor of the active buffer.
    pub fn cursor(&self) -> Option<Position> {
        self.active_buffer().map(DirBuffer::cursor)
    }

    /// Selection of the active buffer.
    pub fn selection(&self) -> Option<&LineSelection> {
        self.active_buffer().map(DirBuffer::selection)
    }

    /// Fuzzy state of the active buffer.
    pub fn fuzzy(&self) -> Option<&FuzzyState> {
        self.active_buffer().map(DirBuffer::fuzzy)
    }

    /// Returns true if the active buffer can undo.
    pub fn has_prev(&self) -> bool {
        self.active_buffer().is_some_and(DirBuffer::has_prev)
    }

    /// Returns true if the active buffer can redo.
    pub fn has_next(&self) -> bool {
        self.active_buffer().is_some_and(DirBuffer::has_next)
    }

    /// Returns true if any buffer differs from its directory.
    pub fn is_modified(&self) -> bool {
        self.buffers.iter().any(DirBuffer::is_modified)
    }

    /// Text object registry, for adding custom objects.
    pub fn text_objects_mut(&mut self) -> &mut TextObjects {
        &mut self.text_objects
    }

    // ==================== Buffer Lifecycle ====================

    /// Opens a buffer for `path` and makes it active.
    ///
    /// If one is already open it is focused and `entries` is ignored; use
    /// [`State::reload_buffer`] to refresh it.
    pub fn open_buffer(&mut self, path: impl Into<PathBuf>, entries: impl IntoIterator<Item = Origin>) -> &mut DirBuffer {
        let path = path.into();
        self.clear_pending();
        if self.buffers.contains(&path) {
            // `add` keeps the open buffer and focuses it
            return self.buffers.add(DirBuffer::new(path, Vec::new()));
        }
        tracing::debug!(path = %path.display(), "opening buffer");
        self.buffers
            .add(DirBuffer::with_config(path, entries, self.buffer_config))
    }

    /// Closes a buffer, dropping its insert session if it had one.
    pub fn close_buffer(&mut self, path: &Path) -> CoreResult<DirBuffer> {
        let buffer = self.buffers.close(path)?;
        if self
            .insert_session
            .as_ref()
            .is_some_and(|session| session.directory.as_path() == path)
        {
            self.insert_session = None;
            self.mode = Mode::Normal;
        }
        self.clear_pending();
        Ok(buffer)
    }

    /// Replaces a buffer's loaded snapshot.
    ///
    /// Ignored while the buffer has an open insert session, whose line
    /// index and undo snapshot refer to the current lines.
    pub fn reload_buffer(&mut self, path: &Path, entries: impl IntoIterator<Item = Origin>) -> CoreResult<()> {
        let buffer = self
            .buffers
            .get_mut(path)
            .ok_or_else(|| CoreError::BufferNotFound(path.to_path_buf()))?;
        if self
            .insert_session
            .as_ref()
            .is_some_and(|session| session.directory.as_path() == path)
        {
            tracing::debug!(path = %path.display(), "reload ignored in insert mode");
            return Ok(());
        }
        buffer.reload(entries);
        Ok(())
    }

    // ==================== Focus ====================

    /// Makes the buffer for `path` active.
    ///
    /// Ignored while an insert session is open.
    pub fn focus(&mut self, path: &Path) -> CoreResult<()> {
        if self.mode == Mode::Insert {
            tracing::debug!("focus ignored in insert mode");
            return Ok(());
        }
        self.buffers.set_active(path)?;
        self.clear_pending();
        Ok(())
    }

    /// Focuses the next pane, wrapping.
    pub fn next_pane(&mut self) {
        self.cycle_pane(1);
    }

    /// Focuses the previous pane, wrapping.
    pub fn prev_pane(&mut self) {
        self.cycle_pane(-1);
    }

    fn cycle_pane(&mut self, offset: isize) {
        if self.mode == Mode::Insert {
            tracing::debug!("focus ignored in insert mode");
            return;
        }
        self.buffers.cycle_active(offset);
        self.clear_pending();
    }

    // ==================== Grammar State ====================

    /// Appends a decimal digit to the count.
    pub fn add_to_count(&mut self, digit: u32) {
        if self.mode == Mode::Insert || digit > 9 {
            return;
        }
        let count = self.count.unwrap_or(0);
        self.count = Some(count.saturating_mul(10).saturating_add(digit as usize));
    }

    /// Takes the count, resetting it.
    pub(crate) fn take_count(&mut self) -> Option<usize> {
        self.count.take()
    }

    /// Forgets count, operator, find and text-object input.
    pub(crate) fn clear_pending(&mut self) {
        self.count = None;
        self.pending_operator = None;
        self.pending_find = None;
        self.text_object_modifier = None;
    }
}

/// Multiplies an operator count with a motion count.
///
/// `2d3j` acts on six lines; with neither typed the motion default applies.
pub(crate) fn combine_counts(outer: Option<usize>, inner: Option<usize>) -> Option<usize> {
    match (outer, inner) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(1).saturating_mul(b.unwrap_or(1))),
    }
}
