//! Commands: editing primitives as values.
//!
//! ## Learning: The Command Pattern
//!
//! Commands encapsulate actions as objects:
//! - Keymaps produce them, config files name them, scripts replay them
//! - `State::execute` is the single dispatcher
//!
//! Parameterless commands have a stable dotted name (`editor.undo`) used
//! by the `[keyboard.bindings]` config section.

use std::path::PathBuf;

use crate::CoreResult;
use crate::edit::InsertPosition;
use crate::motion::{FindKind, Motion};
use crate::state::{Operator, State};
use crate::textobject::TextObjectModifier;

/// Built-in commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    // Grammar
    AddToCount(u32),
    Operator(Operator),
    Motion(Motion),
    BeginFind(FindKind),
    FindChar(char),
    TextObjectModifier(TextObjectModifier),
    TextObject(char),

    // Line commands
    DeleteLines,
    YankLines,
    ChangeLines,
    OpenBelow,
    OpenAbove,
    Insert(InsertPosition),

    // Registers & history
    PasteAfter,
    PasteBefore,
    Undo,
    Redo,

    /// Leaves insert mode, or commits a line directly
    Escape {
        text: Option<String>,
        column: Option<usize>,
    },

    // Selection
    ToggleSelection,
    ExtendSelection,
    ClearSelection,
    DeleteSelection,
    YankSelection,

    // Search
    StartSearch,
    SetFuzzyQuery(String),
    CommitFuzzyQuery,
    ClearFuzzy,

    // Panes
    FocusBuffer(PathBuf),
    NextPane,
    PrevPane,
}

impl Command {
    /// Returns the command's display name.
    pub fn display_name(&self) -> &str {
        match self {
            Command::AddToCount(_) => "Count",
            Command::Operator(Operator::Delete) => "Delete",
            Command::Operator(Operator::Yank) => "Yank",
            Command::Operator(Operator::Change) => "Change",
            Command::Motion(_) => "Motion",
            Command::BeginFind(_) => "Find Character",
            Command::FindChar(_) => "Find Target",
            Command::TextObjectModifier(_) => "Text Object Modifier",
            Command::TextObject(_) => "Text Object",
            Command::DeleteLines => "Delete Lines",
            Command::YankLines => "Yank Lines",
            Command::ChangeLines => "Change Lines",
            Command::OpenBelow => "Open Line Below",
            Command::OpenAbove => "Open Line Above",
            Command::Insert(_) => "Insert",
            Command::PasteAfter => "Paste After",
            Command::PasteBefore => "Paste Before",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
            Command::Escape { .. } => "Escape",
            Command::ToggleSelection => "Toggle Selection",
            Command::ExtendSelection => "Extend Selection",
            Command::ClearSelection => "Clear Selection",
            Command::DeleteSelection => "Delete Selection",
            Command::YankSelection => "Yank Selection",
            Command::StartSearch => "Search",
            Command::SetFuzzyQuery(_) => "Set Search Query",
            Command::CommitFuzzyQuery => "Commit Search",
            Command::ClearFuzzy => "Clear Search",
            Command::FocusBuffer(_) => "Focus Pane",
            Command::NextPane => "Next Pane",
            Command::PrevPane => "Previous Pane",
        }
    }

    /// Looks up a parameterless command by its dotted name.
    pub fn from_name(name: &str) -> Option<Command> {
        let command = match name {
            "editor.delete" => Command::Operator(Operator::Delete),
            "editor.yank" => Command::Operator(Operator::Yank),
            "editor.change" => Command::Operator(Operator::Change),
            "editor.delete_lines" => Command::DeleteLines,
            "editor.yank_lines" => Command::YankLines,
            "editor.change_lines" => Command::ChangeLines,
            "editor.open_below" => Command::OpenBelow,
            "editor.open_above" => Command::OpenAbove,
            "editor.insert" => Command::Insert(InsertPosition::BeforeCursor),
            "editor.append" => Command::Insert(InsertPosition::AfterCursor),
            "editor.insert_line_start" => Command::Insert(InsertPosition::LineStart),
            "editor.append_line_end" => Command::Insert(InsertPosition::LineEnd),
            "editor.paste_after" => Command::PasteAfter,
            "editor.paste_before" => Command::PasteBefore,
            "editor.undo" => Command::Undo,
            "editor.redo" => Command::Redo,
            "editor.escape" => Command::Escape { text: None, column: None },
            "cursor.left" => Command::Motion(Motion::Left),
            "cursor.right" => Command::Motion(Motion::Right),
            "cursor.down" => Command::Motion(Motion::Down),
            "cursor.up" => Command::Motion(Motion::Up),
            "cursor.line_start" => Command::Motion(Motion::LineStart),
            "cursor.line_end" => Command::Motion(Motion::LineEnd),
            "cursor.first_line" => Command::Motion(Motion::FirstLine),
            "cursor.last_line" => Command::Motion(Motion::LastLine),
            "cursor.next_match" => Command::Motion(Motion::NextMatch),
            "cursor.prev_match" => Command::Motion(Motion::PrevMatch),
            "selection.toggle" => Command::ToggleSelection,
            "selection.extend" => Command::ExtendSelection,
            "selection.clear" => Command::ClearSelection,
            "selection.delete" => Command::DeleteSelection,
            "selection.yank" => Command::YankSelection,
            "search.start" => Command::StartSearch,
            "search.commit" => Command::CommitFuzzyQuery,
            "search.clear" => Command::ClearFuzzy,
            "pane.next" => Command::NextPane,
            "pane.prev" => Command::PrevPane,
            _ => return None,
        };
        Some(command)
    }
}

impl State {
    /// Executes one command.
    ///
    /// Only commands that name something outside the state (a pane to
    /// focus) can fail; everything else degrades to a no-op.
    pub fn execute(&mut self, command: Command) -> CoreResult<()> {
        tracing::trace!(command = command.display_name(), "execute");
        match command {
            Command::AddToCount(digit) => self.add_to_count(digit),
            Command::Operator(operator) => self.operator(operator),
            Command::Motion(motion) => self.motion(motion),
            Command::BeginFind(kind) => self.begin_find(kind),
            Command::FindChar(ch) => self.find_char(ch),
            Command::TextObjectModifier(modifier) => self.set_text_object_modifier(modifier),
            Command::TextObject(key) => self.text_object(key),
            Command::DeleteLines => self.dd(),
            Command::YankLines => self.yy(),
            Command::ChangeLines => self.cc(),
            Command::OpenBelow => self.o(),
            Command::OpenAbove => self.open_above(),
            Command::Insert(position) => self.insert(position),
            Command::PasteAfter => self.p(),
            Command::PasteBefore => self.paste_before(),
            Command::Undo => self.u(),
            Command::Redo => self.redo(),
            Command::Escape { text, column } => self.esc(text, column),
            Command::ToggleSelection => self.toggle_selection(),
            Command::ExtendSelection => self.extend_selection(),
            Command::ClearSelection => self.clear_selection(),
            Command::DeleteSelection => self.delete_selection(),
            Command::YankSelection => self.yank_selection(),
            // The prompt belongs to the session; the state has nothing to do
            Command::StartSearch => {}
            Command::SetFuzzyQuery(query) => self.set_fuzzy_query(query),
            Command::CommitFuzzyQuery => self.commit_fuzzy_query(),
            Command::ClearFuzzy => self.clear_fuzzy(),
            Command::FocusBuffer(path) => self.focus(&path)?,
            Command::NextPane => self.next_pane(),
            Command::PrevPane => self.prev_pane(),
        }
        Ok(())
    }
}
