//! Single-line text entry for insert mode and the search prompt.
//!
//! The engine itself only sees the committed text (`esc(text)`), so the
//! keystrokes typed in between are collected here.

use panedit_buffer::{byte_to_column, column_count, column_to_byte, splice_columns};

use crate::keymap::{Key, KeyPress};

/// What a prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Text of the line being edited
    Insert,
    /// Fuzzy query
    Search,
}

/// Outcome of one key in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    /// Text or cursor changed
    Edited,
    /// Enter: keep the text
    Submit,
    /// Escape
    Cancel,
    /// Key has no meaning here
    Ignored,
}

/// An editable line with a grapheme cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEditor {
    text: String,
    cursor: usize,
}

impl LineEditor {
    /// Starts editing `text` with the cursor at `cursor` (clamped).
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let cursor = cursor.min(column_count(&text));
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Inserts a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let mut buf = [0u8; 4];
        // A combining mark joins the grapheme before it
        let end = column_to_byte(&self.text, self.cursor) + c.len_utf8();
        self.text = splice_columns(&self.text, self.cursor, self.cursor, c.encode_utf8(&mut buf));
        self.cursor = byte_to_column(&self.text, end);
    }

    /// Deletes the grapheme before the cursor.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.text = splice_columns(&self.text, self.cursor - 1, self.cursor, "");
        self.cursor -= 1;
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(column_count(&self.text));
    }

    /// Applies one key.
    pub fn handle(&mut self, key: KeyPress) -> PromptAction {
        if key.modifiers.ctrl || key.modifiers.alt {
            return PromptAction::Ignored;
        }
        match key.key {
            Key::Char(c) => self.insert(c),
            Key::Space => self.insert(' '),
            Key::Backspace => {
                if !self.backspace() {
                    return PromptAction::Ignored;
                }
            }
            Key::Left => self.move_left(),
            Key::Right => self.move_right(),
            Key::Enter => return PromptAction::Submit,
            Key::Escape => return PromptAction::Cancel,
            Key::Tab => return PromptAction::Ignored,
        }
        PromptAction::Edited
    }
}

/// An open prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub editor: LineEditor,
}

impl Prompt {
    pub fn new(kind: PromptKind, text: impl Into<String>, cursor: usize) -> Self {
        Self {
            kind,
            editor: LineEditor::new(text, cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_in_the_middle() {
        let mut editor = LineEditor::new("ac", 1);
        assert_eq!(editor.handle(KeyPress::char('b')), PromptAction::Edited);
        assert_eq!(editor.text(), "abc");
        assert_eq!(editor.cursor(), 2);

        editor.handle(KeyPress::plain(Key::Backspace));
        assert_eq!(editor.text(), "ac");
        editor.move_left();
        editor.move_left();
        assert_eq!(editor.handle(KeyPress::plain(Key::Backspace)), PromptAction::Ignored);
    }

    #[test]
    fn test_combining_mark_joins_previous_column() {
        let mut editor = LineEditor::new("e", 1);
        editor.insert('\u{301}');
        assert_eq!(editor.text(), "e\u{301}");
        assert_eq!(editor.cursor(), 1);

        assert!(editor.backspace());
        assert_eq!(editor.text(), "");
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_graphemes() {
        let mut editor = LineEditor::new("café", 99);
        assert_eq!(editor.cursor(), 4);
        editor.backspace();
        assert_eq!(editor.text(), "caf");
        editor.handle(KeyPress::plain(Key::Space));
        assert_eq!(editor.into_text(), "caf ");
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut editor = LineEditor::new("", 0);
        assert_eq!(editor.handle(KeyPress::plain(Key::Enter)), PromptAction::Submit);
        assert_eq!(editor.handle(KeyPress::plain(Key::Escape)), PromptAction::Cancel);
    }
}
