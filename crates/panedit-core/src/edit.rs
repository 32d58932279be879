//! Editing primitives: operators, motions, insert sessions, paste, undo.
//!
//! Each primitive is a method on [`State`] named after its key. Sequences
//! that do not make sense (`p` with an empty register, `d` then `y`, a motion
//! that finds nothing) leave the buffers untouched and clear the partial
//! input.
//!
//! ## History
//!
//! Structural edits record one history step per command. Commands that open
//! an insert session (`c`, `o`, `O`, `i`, `a`, `I`, `A`) record nothing
//! themselves; `esc` records the session as one merged step from the state
//! before the opening command to the committed text.

use panedit_buffer::{BufferItem, DirBuffer, Position, Snapshot, column_count, column_slice, splice_columns};

use crate::motion::{FindKind, Motion, MotionRange};
use crate::register::Register;
use crate::state::{InsertSession, Mode, Operator, PendingOperator, State, combine_counts};
use crate::textobject::TextObjectModifier;

/// Where `i`/`a`/`I`/`A` put the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertPosition {
    /// `i`
    BeforeCursor,
    /// `a`
    AfterCursor,
    /// `I`
    LineStart,
    /// `A`
    LineEnd,
}

impl State {
    // ==================== Operators ====================

    /// `d`
    pub fn d(&mut self) {
        self.operator(Operator::Delete);
    }

    /// `y`
    pub fn y(&mut self) {
        self.operator(Operator::Yank);
    }

    /// `c`
    pub fn c(&mut self) {
        self.operator(Operator::Change);
    }

    /// Starts an operator, or runs its line command when typed twice.
    pub fn operator(&mut self, operator: Operator) {
        if self.mode == Mode::Insert {
            return;
        }
        let count = self.take_count();
        match self.pending_operator.take() {
            Some(pending) if pending.operator == operator => {
                self.clear_pending();
                self.line_command(operator, combine_counts(pending.count, count));
            }
            Some(pending) => {
                tracing::debug!(
                    pending = %pending.operator.key(),
                    typed = %operator.key(),
                    "mismatched operator, cancelling"
                );
                self.clear_pending();
            }
            None => {
                self.pending_operator = Some(PendingOperator { operator, count });
            }
        }
    }

    /// `dd`
    pub fn dd(&mut self) {
        let count = self.take_count();
        self.clear_pending();
        self.line_command(Operator::Delete, count);
    }

    /// `yy`
    pub fn yy(&mut self) {
        let count = self.take_count();
        self.clear_pending();
        self.line_command(Operator::Yank, count);
    }

    /// `cc`
    pub fn cc(&mut self) {
        let count = self.take_count();
        self.clear_pending();
        self.line_command(Operator::Change, count);
    }

    /// `count` lines starting at the cursor.
    fn line_command(&mut self, operator: Operator, count: Option<usize>) {
        if self.mode == Mode::Insert {
            return;
        }
        let Some(buffer) = self.buffers.active() else {
            return;
        };
        let Some(last) = buffer.last_line() else {
            tracing::debug!("line command on empty buffer");
            return;
        };
        let start = buffer.cursor().line;
        let n = count.unwrap_or(1).max(1);
        let end = start.saturating_add(n - 1).min(last);
        self.apply_operator(operator, MotionRange::Lines { start, end });
    }

    // ==================== Motions ====================

    /// Runs a motion: moves the cursor, or completes a pending operator.
    pub fn motion(&mut self, motion: Motion) {
        if self.mode == Mode::Insert {
            return;
        }
        let count = self.take_count();
        let pending = self.pending_operator.take();
        self.pending_find = None;
        self.text_object_modifier = None;

        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };

        match pending {
            Some(pending) => {
                let count = combine_counts(pending.count, count);
                let Some(resolved) = motion.resolve(buffer, count) else {
                    tracing::debug!(?motion, "motion resolved nothing");
                    return;
                };
                self.apply_operator(pending.operator, resolved.range);
            }
            None => match motion {
                Motion::NextMatch | Motion::PrevMatch => {
                    let n = count.unwrap_or(1).max(1);
                    if buffer.jump_to_match(motion == Motion::NextMatch, n).is_none() {
                        tracing::debug!("no fuzzy matches");
                    }
                }
                _ => {
                    if let Some(resolved) = motion.resolve(buffer, count) {
                        buffer.set_cursor(resolved.target);
                    }
                }
            },
        }
    }

    /// `f`, `F`, `t`, `T`: waits for the character.
    pub fn begin_find(&mut self, kind: FindKind) {
        if self.mode == Mode::Insert {
            return;
        }
        self.pending_find = Some(kind);
    }

    /// The character after `f`/`F`/`t`/`T`.
    pub fn find_char(&mut self, ch: char) {
        let Some(kind) = self.pending_find.take() else {
            return;
        };
        self.motion(Motion::FindChar { kind, ch });
    }

    // ==================== Text Objects ====================

    /// `i`/`a` after an operator.
    pub fn set_text_object_modifier(&mut self, modifier: TextObjectModifier) {
        if self.pending_operator.is_none() {
            tracing::debug!("text object modifier without operator");
            return;
        }
        self.text_object_modifier = Some(modifier);
    }

    /// The object key after `i`/`a` (`w`, `e`, `n`, ...).
    pub fn text_object(&mut self, key: char) {
        let count = self.take_count();
        let modifier = self.text_object_modifier.take();
        let pending = self.pending_operator.take();
        self.clear_pending();
        let (Some(modifier), Some(pending)) = (modifier, pending) else {
            return;
        };
        let Some(buffer) = self.buffers.active() else {
            return;
        };
        let n = combine_counts(pending.count, count).unwrap_or(1);
        match self.text_objects.resolve(key, buffer, modifier, n) {
            Some(range) => self.apply_operator(pending.operator, range),
            None => tracing::debug!(%key, "text object resolved nothing"),
        }
    }

    // ==================== Operator Application ====================

    fn apply_operator(&mut self, operator: Operator, range: MotionRange) {
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        match range {
            MotionRange::Lines { start, end } => {
                let Some(last) = buffer.last_line() else {
                    return;
                };
                let end = end.min(last);
                if start > end {
                    return;
                }
                match operator {
                    Operator::Yank => {
                        let items = buffer.items()[start..=end].to_vec();
                        self.registry.write_lines(items);
                        let column = buffer.cursor().column;
                        buffer.set_cursor(Position::new(start, column));
                    }
                    Operator::Delete => {
                        let before = buffer.snapshot();
                        let Ok(removed) = buffer.remove_lines(start..=end) else {
                            return;
                        };
                        self.registry.write_lines(removed);
                        let line = start.min(buffer.last_line().unwrap_or(0));
                        buffer.set_cursor(Position::new(line, 0));
                        buffer.record(before);
                    }
                    Operator::Change => {
                        let before = buffer.snapshot();
                        let Ok(removed) = buffer.remove_lines(start..=end) else {
                            return;
                        };
                        let placeholder = removed[0].blank_like();
                        if buffer.insert_lines(start, vec![placeholder]).is_err() {
                            return;
                        }
                        self.registry.write_lines(removed);
                        buffer.set_cursor(Position::new(start, 0));
                        self.begin_insert(start, before);
                    }
                }
            }
            MotionRange::Chars { line, start, end } => {
                let Some(text) = buffer.line_text(line) else {
                    return;
                };
                let removed = column_slice(text, start, end).to_string();
                let remaining = splice_columns(text, start, end, "");
                match operator {
                    Operator::Yank => {
                        self.registry.write_chars(removed);
                        buffer.set_cursor(Position::new(line, start));
                    }
                    Operator::Delete => {
                        if removed.is_empty() {
                            return;
                        }
                        let before = buffer.snapshot();
                        if buffer.set_text(line, remaining).is_err() {
                            return;
                        }
                        self.registry.write_chars(removed);
                        buffer.set_cursor(Position::new(line, start));
                        buffer.record(before);
                    }
                    Operator::Change => {
                        let before = buffer.snapshot();
                        if buffer.set_text(line, remaining).is_err() {
                            return;
                        }
                        self.registry.write_chars(removed);
                        buffer.set_cursor(Position::new(line, start));
                        self.begin_insert(line, before);
                    }
                }
            }
        }
    }

    // ==================== Insert Sessions ====================

    /// Enters insert mode on `line` of the active buffer.
    fn begin_insert(&mut self, line: usize, before: Snapshot) {
        let Some(directory) = self.buffers.active_path().map(|p| p.to_path_buf()) else {
            return;
        };
        self.insert_session = Some(InsertSession {
            directory,
            line,
            before,
        });
        self.mode = Mode::Insert;
    }

    /// `o`
    pub fn o(&mut self) {
        self.open_line(true);
    }

    /// `O`
    pub fn open_above(&mut self) {
        self.open_line(false);
    }

    fn open_line(&mut self, below: bool) {
        if self.mode == Mode::Insert {
            return;
        }
        self.clear_pending();
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        let line = buffer.cursor().line;
        let at = match (buffer.is_empty(), below) {
            (true, _) => 0,
            (false, true) => line + 1,
            (false, false) => line,
        };
        let before = buffer.snapshot();
        if buffer.insert_lines(at, vec![BufferItem::new_entry("")]).is_err() {
            return;
        }
        buffer.set_cursor(Position::new(at, 0));
        self.begin_insert(at, before);
    }

    /// `i`, `a`, `I`, `A`: edits the current line in place.
    ///
    /// On an empty buffer this opens a new line instead.
    pub fn insert(&mut self, position: InsertPosition) {
        if self.mode == Mode::Insert {
            return;
        }
        self.clear_pending();
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        if buffer.is_empty() {
            self.open_line(true);
            return;
        }
        let cursor = buffer.cursor();
        let width = buffer.item(cursor.line).map_or(0, BufferItem::width);
        let column = match position {
            InsertPosition::BeforeCursor => cursor.column,
            InsertPosition::AfterCursor => (cursor.column + 1).min(width),
            InsertPosition::LineStart => 0,
            InsertPosition::LineEnd => width,
        };
        let before = buffer.snapshot();
        buffer.set_cursor(cursor.with_column(column));
        self.begin_insert(cursor.line, before);
    }

    /// `esc`, optionally committing a line's text.
    ///
    /// In insert mode `text` replaces the session line and the session is
    /// recorded as one step. Outside insert mode `text` renames the cursor
    /// line as its own step; without it only the partial input is dropped.
    pub fn esc(&mut self, text: Option<String>, column: Option<usize>) {
        self.clear_pending();

        if self.mode == Mode::Insert {
            self.mode = Mode::Normal;
            let Some(session) = self.insert_session.take() else {
                return;
            };
            let Some(buffer) = self.buffers.get_mut(&session.directory) else {
                return;
            };
            commit_line(buffer, session.line, text, column);
            if !buffer.record(session.before) {
                tracing::trace!("insert session changed nothing");
            }
            return;
        }

        let Some(text) = text else {
            return;
        };
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        let line = buffer.cursor().line;
        if buffer.line_text(line).is_none_or(|current| current == text) {
            return;
        }
        let before = buffer.snapshot();
        commit_line(buffer, line, Some(text), column);
        buffer.record(before);
    }

    // ==================== Paste ====================

    /// `p`
    pub fn p(&mut self) {
        self.paste(true);
    }

    /// `P`
    pub fn paste_before(&mut self) {
        self.paste(false);
    }

    fn paste(&mut self, after: bool) {
        if self.mode == Mode::Insert {
            return;
        }
        let count = self.take_count().unwrap_or(1).max(1);
        self.clear_pending();
        let Some(register) = self.registry.get().cloned() else {
            tracing::debug!("paste with empty register");
            return;
        };
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };

        match &register {
            Register::Lines(_) => {
                let lines = register.paste_lines(count);
                let len = lines.len();
                let line = buffer.cursor().line;
                let at = match (buffer.is_empty(), after) {
                    (true, _) => 0,
                    (false, true) => line + 1,
                    (false, false) => line,
                };
                let before = buffer.snapshot();
                if buffer.insert_lines(at, lines).is_err() {
                    return;
                }
                buffer.set_cursor(Position::new(at + len - 1, 0));
                buffer.record(before);
            }
            Register::Chars(text) => {
                let cursor = buffer.cursor();
                let Some(current) = buffer.line_text(cursor.line) else {
                    return;
                };
                let width = column_count(current);
                let at = if after {
                    (cursor.column + 1).min(width)
                } else {
                    cursor.column.min(width)
                };
                let inserted = text.repeat(count);
                let updated = splice_columns(current, at, at, &inserted);
                let before = buffer.snapshot();
                if buffer.set_text(cursor.line, updated).is_err() {
                    return;
                }
                let end = at + column_count(&inserted);
                buffer.set_cursor(Position::new(cursor.line, end.saturating_sub(1)));
                buffer.record(before);
            }
        }
    }

    // ==================== Undo ====================

    /// `u`, repeated by the count.
    pub fn u(&mut self) {
        self.step_history(true);
    }

    /// `Ctrl-r`, repeated by the count.
    pub fn redo(&mut self) {
        self.step_history(false);
    }

    fn step_history(&mut self, undo: bool) {
        if self.mode == Mode::Insert {
            tracing::debug!("undo/redo ignored in insert mode");
            return;
        }
        let count = self.take_count().unwrap_or(1).max(1);
        self.clear_pending();
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        for _ in 0..count {
            let result = if undo { buffer.undo() } else { buffer.redo() };
            if let Err(err) = result {
                tracing::debug!(%err, "history exhausted");
                break;
            }
        }
    }

    // ==================== Selection ====================

    /// Toggles the cursor line in the selection.
    pub fn toggle_selection(&mut self) {
        self.with_cursor_line(|buffer, line| buffer.selection_mut().toggle(line));
    }

    /// Toggles the range from the last selected line to the cursor.
    pub fn extend_selection(&mut self) {
        self.with_cursor_line(|buffer, line| buffer.selection_mut().select_range(line));
    }

    /// Drops the selection.
    pub fn clear_selection(&mut self) {
        if let Some(buffer) = self.buffers.active_mut() {
            buffer.selection_mut().clear();
        }
    }

    fn with_cursor_line(&mut self, f: impl FnOnce(&mut DirBuffer, usize)) {
        if self.mode == Mode::Insert {
            return;
        }
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        if buffer.is_empty() {
            return;
        }
        let line = buffer.cursor().line;
        f(buffer, line);
    }

    /// Deletes every selected line as one step.
    pub fn delete_selection(&mut self) {
        self.selection_operator(Operator::Delete);
    }

    /// Yanks every selected line.
    pub fn yank_selection(&mut self) {
        self.selection_operator(Operator::Yank);
    }

    fn selection_operator(&mut self, operator: Operator) {
        if self.mode == Mode::Insert {
            return;
        }
        self.clear_pending();
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        let indexes: Vec<usize> = buffer.selection().indexes().collect();
        let Some(&first) = indexes.first() else {
            tracing::debug!("no selection");
            return;
        };
        let items: Vec<BufferItem> = indexes
            .iter()
            .filter_map(|&i| buffer.item(i).cloned())
            .collect();

        if operator == Operator::Delete {
            let runs = buffer.selection().runs();
            let before = buffer.snapshot();
            for run in runs.into_iter().rev() {
                if buffer.remove_lines(run).is_err() {
                    return;
                }
            }
            let line = first.min(buffer.last_line().unwrap_or(0));
            buffer.set_cursor(Position::new(line, 0));
            buffer.record(before);
        }
        buffer.selection_mut().clear();
        self.registry.write_lines(items);
    }

    // ==================== Search ====================

    /// Sets the fuzzy query of the active buffer.
    pub fn set_fuzzy_query(&mut self, query: impl Into<String>) {
        if let Some(buffer) = self.buffers.active_mut() {
            buffer.set_fuzzy_query(query);
        }
    }

    /// Remembers the query and moves to a match if the cursor is not on one.
    pub fn commit_fuzzy_query(&mut self) {
        let Some(buffer) = self.buffers.active_mut() else {
            return;
        };
        buffer.commit_fuzzy_query();
        let line = buffer.cursor().line;
        if buffer.fuzzy().match_on(line).is_none() {
            buffer.jump_to_match(true, 1);
        }
    }

    /// Drops the fuzzy query.
    pub fn clear_fuzzy(&mut self) {
        if let Some(buffer) = self.buffers.active_mut() {
            buffer.clear_fuzzy();
        }
    }
}

/// Writes `text` (if any) into `line` and places the cursor.
fn commit_line(buffer: &mut DirBuffer, line: usize, text: Option<String>, column: Option<usize>) {
    if let Some(text) = text {
        if let Err(err) = buffer.set_text(line, text) {
            tracing::debug!(%err, "commit target vanished");
            return;
        }
    }
    let column = column.unwrap_or(buffer.cursor().column);
    buffer.set_cursor(Position::new(line, column));
}

#[cfg(test)]
mod tests {
    use super::*;
    use panedit_buffer::Origin;
    use std::path::Path;
    use std::sync::Arc;

    fn state(names: &[&str]) -> State {
        let mut state = State::new();
        state.open_buffer("/dir", names.iter().map(|n| Origin::file(*n)));
        state
    }

    fn texts(state: &State) -> Vec<String> {
        state
            .active_buffer()
            .unwrap()
            .items()
            .iter()
            .map(|item| item.text().to_string())
            .collect()
    }

    fn set_cursor(state: &mut State, line: usize, column: usize) {
        state
            .buffers
            .active_mut()
            .unwrap()
            .set_cursor(Position::new(line, column));
    }

    #[test]
    fn test_dd_with_count() {
        let mut s = state(&["a", "b", "c", "d"]);
        set_cursor(&mut s, 1, 0);
        s.add_to_count(2);
        s.dd();
        assert_eq!(texts(&s), vec!["a", "d"]);
        assert_eq!(s.cursor(), Some(Position::new(1, 0)));
        assert!(matches!(s.registry().get(), Some(Register::Lines(items)) if items.len() == 2));
    }

    #[test]
    fn test_operator_twice_is_line_command() {
        let mut s = state(&["a", "b", "c"]);
        s.d();
        assert!(s.pending_operator().is_some());
        s.d();
        assert_eq!(texts(&s), vec!["b", "c"]);
        assert!(s.pending_operator().is_none());
        assert!(s.has_prev());
    }

    #[test]
    fn test_mismatched_operator_cancels() {
        let mut s = state(&["a", "b"]);
        s.d();
        s.y();
        assert!(s.pending_operator().is_none());
        s.motion(Motion::Down);
        assert_eq!(texts(&s), vec!["a", "b"]);
        assert_eq!(s.cursor(), Some(Position::new(1, 0)));
    }

    #[test]
    fn test_counts_multiply() {
        let names: Vec<String> = (0..10).map(|i| format!("f{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut s = state(&refs);
        s.add_to_count(2);
        s.d();
        s.add_to_count(3);
        s.motion(Motion::Down);
        assert_eq!(texts(&s), vec!["f7", "f8", "f9"]);
    }

    #[test]
    fn test_dk_and_clamped_dj() {
        let mut s = state(&["a", "b", "c"]);
        set_cursor(&mut s, 1, 0);
        s.d();
        s.motion(Motion::Up);
        assert_eq!(texts(&s), vec!["c"]);

        let mut s = state(&["a", "b", "c"]);
        set_cursor(&mut s, 2, 0);
        s.d();
        s.motion(Motion::Down);
        assert_eq!(texts(&s), vec!["a", "b"]);
    }

    #[test]
    fn test_dg_deletes_to_end() {
        let mut s = state(&["a", "b", "c"]);
        set_cursor(&mut s, 1, 0);
        s.d();
        s.motion(Motion::LastLine);
        assert_eq!(texts(&s), vec!["a"]);
    }

    #[test]
    fn test_yank_keeps_lines() {
        let mut s = state(&["a", "b", "c"]);
        s.y();
        s.motion(Motion::Down);
        assert_eq!(texts(&s), vec!["a", "b", "c"]);
        assert!(!s.has_prev());
        set_cursor(&mut s, 2, 0);
        s.p();
        assert_eq!(texts(&s), vec!["a", "b", "c", "a", "b"]);
        assert_eq!(s.cursor(), Some(Position::new(4, 0)));
    }

    #[test]
    fn test_paste_count_shares_origin() {
        let mut s = state(&["file.txt", "other.txt"]);
        s.dd();
        s.add_to_count(3);
        s.p();
        assert_eq!(texts(&s), vec!["other.txt", "file.txt", "file.txt", "file.txt"]);
        let items = s.active_buffer().unwrap().items();
        let origin = items[1].origin().unwrap();
        assert!(items[2..].iter().all(|i| Arc::ptr_eq(i.origin().unwrap(), origin)));
    }

    #[test]
    fn test_paste_before_and_empty_register() {
        let mut s = state(&["a", "b"]);
        s.paste_before();
        assert_eq!(texts(&s), vec!["a", "b"]);

        set_cursor(&mut s, 1, 0);
        s.yy();
        set_cursor(&mut s, 0, 0);
        s.paste_before();
        assert_eq!(texts(&s), vec!["b", "a", "b"]);
        assert_eq!(s.cursor(), Some(Position::new(0, 0)));
    }

    #[test]
    fn test_change_line_merges_into_one_step() {
        let mut s = state(&["a", "b"]);
        s.cc();
        assert_eq!(s.mode(), Mode::Insert);
        assert_eq!(texts(&s), vec!["", "b"]);
        assert!(!s.has_prev());

        s.esc(Some("renamed".into()), None);
        assert_eq!(s.mode(), Mode::Normal);
        assert_eq!(texts(&s), vec!["renamed", "b"]);
        let item = s.active_buffer().unwrap().item(0).unwrap();
        assert_eq!(item.origin().unwrap().name, "a");

        s.u();
        assert_eq!(texts(&s), vec!["a", "b"]);
        assert!(!s.has_prev());
    }

    #[test]
    fn test_change_str_line_gives_blank_str() {
        let mut s = state(&["a"]);
        s.o();
        s.esc(Some("new".into()), None);
        s.cc();
        let item = s.active_buffer().unwrap().item(1).unwrap();
        assert!(!item.is_real());
        assert_eq!(item.text(), "");
    }

    #[test]
    fn test_open_below_and_above() {
        let mut s = state(&["a", "b"]);
        s.o();
        assert_eq!(texts(&s), vec!["a", "", "b"]);
        assert_eq!(s.insert_session().unwrap().line, 1);
        s.esc(Some("new.txt".into()), None);

        s.open_above();
        assert_eq!(texts(&s), vec!["a", "", "new.txt", "b"]);
        s.esc(None, None);

        s.u();
        assert_eq!(texts(&s), vec!["a", "new.txt", "b"]);
        s.u();
        assert_eq!(texts(&s), vec!["a", "b"]);
        s.redo();
        assert_eq!(texts(&s), vec!["a", "new.txt", "b"]);
    }

    #[test]
    fn test_direct_commit_is_standalone() {
        let mut s = state(&["a"]);
        s.esc(Some("b".into()), Some(1));
        assert_eq!(texts(&s), vec!["b"]);
        assert_eq!(s.cursor(), Some(Position::new(0, 1)));
        s.esc(Some("b".into()), None);
        assert_eq!(s.active_buffer().unwrap().history().undo_count(), 1);
        s.u();
        assert_eq!(texts(&s), vec!["a"]);
    }

    #[test]
    fn test_esc_clears_pending() {
        let mut s = state(&["a"]);
        s.add_to_count(3);
        s.d();
        s.begin_find(FindKind::Forward);
        s.esc(None, None);
        assert!(s.pending_operator().is_none());
        assert!(s.pending_find().is_none());
        assert!(s.count().is_none());
    }

    #[test]
    fn test_undo_in_insert_mode_is_ignored() {
        let mut s = state(&["a", "b"]);
        s.dd();
        s.o();
        s.u();
        assert_eq!(s.mode(), Mode::Insert);
        assert_eq!(texts(&s), vec!["b", ""]);
    }

    #[test]
    fn test_undo_count() {
        let mut s = state(&["a", "b", "c"]);
        s.dd();
        s.dd();
        s.add_to_count(5);
        s.u();
        assert_eq!(texts(&s), vec!["a", "b", "c"]);
        assert!(!s.has_prev());
        s.add_to_count(2);
        s.redo();
        assert_eq!(texts(&s), vec!["c"]);
    }

    #[test]
    fn test_undo_restores_cursor_after_dd() {
        let mut s = state(&["ab", "cd", "ef"]);
        set_cursor(&mut s, 1, 1);
        s.dd();
        assert_eq!(texts(&s), vec!["ab", "ef"]);
        s.u();
        assert_eq!(texts(&s), vec!["ab", "cd", "ef"]);
        assert_eq!(s.cursor(), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_undo_restores_cursor_after_change_line() {
        let mut s = state(&["ab", "cd", "ef"]);
        set_cursor(&mut s, 1, 1);
        s.cc();
        s.esc(Some("x".into()), None);
        assert_eq!(texts(&s), vec!["ab", "x", "ef"]);
        s.u();
        assert_eq!(texts(&s), vec!["ab", "cd", "ef"]);
        assert_eq!(s.cursor(), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_undo_append_restores_cursor_column() {
        let mut s = state(&["abc"]);
        set_cursor(&mut s, 0, 1);
        s.insert(InsertPosition::AfterCursor);
        s.esc(Some("abxc".into()), None);
        s.u();
        assert_eq!(texts(&s), vec!["abc"]);
        assert_eq!(s.cursor(), Some(Position::new(0, 1)));
    }

    #[test]
    fn test_reload_waits_for_insert_to_end() {
        let mut s = state(&["a", "b"]);
        s.insert(InsertPosition::LineEnd);
        s.reload_buffer(Path::new("/dir"), ["new", "a", "b"].map(Origin::file))
            .unwrap();
        s.esc(Some("a2".into()), None);
        assert_eq!(texts(&s), vec!["a2", "b"]);

        let buffer = s.active_buffer().unwrap();
        assert_eq!(buffer.item(0).unwrap().origin().unwrap().name, "a");
        assert_eq!(buffer.original_items().len(), 2);

        s.u();
        assert_eq!(texts(&s), vec!["a", "b"]);
        assert!(!s.active_buffer().unwrap().is_modified());
    }

    #[test]
    fn test_charwise_delete_and_paste() {
        let mut s = state(&["report.txt"]);
        s.d();
        s.begin_find(FindKind::TillForward);
        s.find_char('.');
        assert_eq!(texts(&s), vec![".txt"]);
        assert_eq!(s.registry().get(), Some(&Register::Chars("report".into())));

        s.motion(Motion::LineEnd);
        s.p();
        assert_eq!(texts(&s), vec![".txtreport"]);
        s.u();
        assert_eq!(texts(&s), vec![".txt"]);
    }

    #[test]
    fn test_change_extension() {
        let mut s = state(&["notes.md"]);
        s.c();
        s.set_text_object_modifier(TextObjectModifier::Inner);
        s.text_object('e');
        assert_eq!(texts(&s), vec!["notes."]);
        assert_eq!(s.mode(), Mode::Insert);
        s.esc(Some("notes.txt".into()), None);
        s.u();
        assert_eq!(texts(&s), vec!["notes.md"]);
    }

    #[test]
    fn test_text_object_needs_operator() {
        let mut s = state(&["notes.md"]);
        s.set_text_object_modifier(TextObjectModifier::Around);
        assert!(s.text_object_modifier().is_none());
        s.text_object('e');
        assert_eq!(texts(&s), vec!["notes.md"]);
    }

    #[test]
    fn test_insert_positions() {
        let mut s = state(&["abc"]);
        set_cursor(&mut s, 0, 1);
        s.insert(InsertPosition::AfterCursor);
        assert_eq!(s.cursor(), Some(Position::new(0, 2)));
        s.esc(None, None);
        assert!(!s.has_prev());

        s.insert(InsertPosition::LineEnd);
        assert_eq!(s.cursor(), Some(Position::new(0, 3)));
        s.esc(Some("abcd".into()), None);
        assert!(s.has_prev());
    }

    #[test]
    fn test_insert_on_empty_buffer_opens_line() {
        let mut s = state(&[]);
        s.insert(InsertPosition::BeforeCursor);
        assert_eq!(texts(&s), vec![""]);
        s.esc(Some("first".into()), None);
        assert_eq!(texts(&s), vec!["first"]);
    }

    #[test]
    fn test_selection_delete_is_one_step() {
        let mut s = state(&["a", "b", "c", "d"]);
        s.toggle_selection();
        set_cursor(&mut s, 2, 0);
        s.toggle_selection();
        set_cursor(&mut s, 3, 0);
        s.extend_selection();
        s.delete_selection();
        assert_eq!(texts(&s), vec!["b"]);
        assert!(s.selection().unwrap().is_empty());
        assert!(matches!(s.registry().get(), Some(Register::Lines(items)) if items.len() == 3));
        s.u();
        assert_eq!(texts(&s), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_move_between_panes() {
        let mut s = State::new();
        s.open_buffer("/src", [Origin::file("a.txt")]);
        s.open_buffer("/dst", [Origin::file("b.txt")]);
        s.focus(Path::new("/src")).unwrap();
        s.dd();
        s.focus(Path::new("/dst")).unwrap();
        s.p();
        let dst = s.buffer(Path::new("/dst")).unwrap();
        assert_eq!(dst.line_text(1), Some("a.txt"));
        assert!(s.buffer(Path::new("/src")).unwrap().is_empty());
    }

    #[test]
    fn test_fuzzy_motion() {
        let mut s = state(&["main.rs", "README.md", "lib.rs"]);
        s.set_fuzzy_query("rs");
        s.commit_fuzzy_query();
        assert_eq!(s.cursor().map(|c| c.line), Some(0));
        s.motion(Motion::NextMatch);
        assert_eq!(s.cursor(), Some(Position::new(2, 4)));

        s.d();
        s.motion(Motion::PrevMatch);
        assert_eq!(texts(&s), vec![] as Vec<String>);
    }

    #[test]
    fn test_close_buffer_drops_session() {
        let mut s = state(&["a"]);
        s.o();
        s.close_buffer(Path::new("/dir")).unwrap();
        assert_eq!(s.mode(), Mode::Normal);
        assert!(s.insert_session().is_none());
    }
}
