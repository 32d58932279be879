//! Keyboard mapping and input handling.
//!
//! ## Learning: State Machines
//!
//! Key handling is a state machine in two layers:
//! - Sequences: `g g` waits for the second key before matching
//! - Grammar: the meaning of a key depends on what the state is waiting
//!   for (`x` after `f` is a target, `w` after `di` is a text object,
//!   `0` after `2` is a digit)
//!
//! The keymap handles the first layer with its own `pending` buffer and
//! asks a [`KeyContext`] snapshot of the state for the second.

use std::collections::HashMap;

use crate::command::Command;
use crate::config::Config;
use crate::edit::InsertPosition;
use crate::motion::{FindKind, Motion};
use crate::state::{Mode, Operator, State};
use crate::textobject::TextObjectModifier;
use crate::{CoreError, CoreResult};

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
    };

    /// Ctrl modifier.
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
    };

    /// Shift modifier.
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: true,
    };

    /// Returns true if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift
    }

    /// Parses modifiers from a string like "ctrl+shift".
    pub fn parse(s: &str) -> Self {
        let mut mods = Modifiers::NONE;
        for part in s.split('+') {
            match part.trim().to_lowercase().as_str() {
                "ctrl" | "control" | "c" => mods.ctrl = true,
                "alt" | "option" | "a" | "m" => mods.alt = true,
                "shift" | "s" => mods.shift = true,
                _ => {}
            }
        }
        mods
    }
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Space,
    Left,
    Right,
}

impl Key {
    /// Parses a key name. Single characters keep their case.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(if c == ' ' { Key::Space } else { Key::Char(c) });
        }
        match s.to_lowercase().as_str() {
            "enter" | "return" | "cr" => Some(Key::Enter),
            "tab" => Some(Key::Tab),
            "backspace" | "bs" => Some(Key::Backspace),
            "escape" | "esc" => Some(Key::Escape),
            "space" => Some(Key::Space),
            "left" => Some(Key::Left),
            "right" => Some(Key::Right),
            "lt" => Some(Key::Char('<')),
            _ => None,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Enter => write!(f, "Enter"),
            Key::Tab => write!(f, "Tab"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Escape => write!(f, "Escape"),
            Key::Space => write!(f, "Space"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
        }
    }
}

/// A key press event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    /// Creates a new key press.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A plain key without modifiers.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// A plain character key.
    pub fn char(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    /// Parses a key binding string like "ctrl+r" or "shift+tab".
    pub fn parse(s: &str) -> Option<Self> {
        // A lone "+" is the plus key
        if s == "+" {
            return Some(Self::char('+'));
        }
        let (mods, key) = match s.rsplit_once('+') {
            Some((mods, key)) if !key.is_empty() => (mods, key),
            _ => ("", s),
        };
        let key = Key::parse(key)?;
        Some(Self::new(key, Modifiers::parse(mods)))
    }

    /// Parses a whitespace-separated sequence like "g g".
    pub fn parse_sequence(s: &str) -> Option<Vec<Self>> {
        let keys: Option<Vec<Self>> = s.split_whitespace().map(Self::parse).collect();
        keys.filter(|keys| !keys.is_empty())
    }
}

impl std::fmt::Display for KeyPress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// A key binding maps a key sequence to a command.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    /// The key sequence (may be multiple keys, like `g g`).
    pub keys: Vec<KeyPress>,
    /// The command to execute.
    pub command: Command,
    /// Mode(s) in which this binding is active.
    pub modes: Vec<Mode>,
}

impl KeyBinding {
    /// Creates a normal-mode binding.
    pub fn simple(keys: Vec<KeyPress>, command: Command) -> Self {
        Self::for_mode(keys, command, Mode::Normal)
    }

    /// Creates a mode-specific binding.
    pub fn for_mode(keys: Vec<KeyPress>, command: Command, mode: Mode) -> Self {
        Self {
            keys,
            command,
            modes: vec![mode],
        }
    }

    /// Returns the key sequence as a string.
    pub fn key_string(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What the state is waiting for, as far as key lookup cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyContext {
    pub mode: Mode,
    pub has_count: bool,
    pub pending_operator: bool,
    pub pending_find: bool,
    pub text_object_modifier: bool,
}

impl From<&State> for KeyContext {
    fn from(state: &State) -> Self {
        Self {
            mode: state.mode(),
            has_count: state.count().is_some(),
            pending_operator: state.pending_operator().is_some(),
            pending_find: state.pending_find().is_some(),
            text_object_modifier: state.text_object_modifier().is_some(),
        }
    }
}

/// Keyboard mapping configuration.
pub struct Keymap {
    /// All key bindings.
    bindings: Vec<KeyBinding>,
    /// Index by first key for fast lookup.
    by_key: HashMap<KeyPress, Vec<usize>>,
    /// Current pending keys (for multi-key sequences).
    pending: Vec<KeyPress>,
}

impl Keymap {
    /// Creates a new keymap with default bindings.
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: Vec::new(),
            by_key: HashMap::new(),
            pending: Vec::new(),
        };
        keymap.add_default_bindings();
        keymap.rebuild_index();
        keymap
    }

    /// Creates a keymap from configuration.
    ///
    /// Unknown keys or command names are skipped with a warning.
    pub fn from_config(config: &Config) -> Self {
        let mut keymap = Self::new();

        for (key_str, cmd_str) in &config.keyboard.bindings {
            let (Some(keys), Some(cmd)) = (KeyPress::parse_sequence(key_str), Command::from_name(cmd_str)) else {
                tracing::warn!(key = %key_str, command = %cmd_str, "ignoring key binding");
                continue;
            };
            keymap.bindings.push(KeyBinding::simple(keys, cmd));
        }

        keymap.rebuild_index();
        keymap
    }

    /// Adds default key bindings.
    fn add_default_bindings(&mut self) {
        let plain = |c: char| vec![KeyPress::char(c)];
        let bindings = vec![
            // Motions
            (plain('h'), Command::Motion(Motion::Left)),
            (plain('l'), Command::Motion(Motion::Right)),
            (plain('j'), Command::Motion(Motion::Down)),
            (plain('k'), Command::Motion(Motion::Up)),
            (plain('0'), Command::Motion(Motion::LineStart)),
            (plain('$'), Command::Motion(Motion::LineEnd)),
            (vec![KeyPress::char('g'), KeyPress::char('g')], Command::Motion(Motion::FirstLine)),
            (plain('G'), Command::Motion(Motion::LastLine)),
            (plain('n'), Command::Motion(Motion::NextMatch)),
            (plain('N'), Command::Motion(Motion::PrevMatch)),
            (plain('f'), Command::BeginFind(FindKind::Forward)),
            (plain('F'), Command::BeginFind(FindKind::Backward)),
            (plain('t'), Command::BeginFind(FindKind::TillForward)),
            (plain('T'), Command::BeginFind(FindKind::TillBackward)),
            // Operators
            (plain('d'), Command::Operator(Operator::Delete)),
            (plain('y'), Command::Operator(Operator::Yank)),
            (plain('c'), Command::Operator(Operator::Change)),
            // Lines
            (plain('o'), Command::OpenBelow),
            (plain('O'), Command::OpenAbove),
            (plain('i'), Command::Insert(InsertPosition::BeforeCursor)),
            (plain('a'), Command::Insert(InsertPosition::AfterCursor)),
            (plain('I'), Command::Insert(InsertPosition::LineStart)),
            (plain('A'), Command::Insert(InsertPosition::LineEnd)),
            (plain('p'), Command::PasteAfter),
            (plain('P'), Command::PasteBefore),
            // History
            (plain('u'), Command::Undo),
            (vec![KeyPress::new(Key::Char('r'), Modifiers::CTRL)], Command::Redo),
            (vec![KeyPress::plain(Key::Escape)], Command::Escape { text: None, column: None }),
            // Selection
            (vec![KeyPress::plain(Key::Space)], Command::ToggleSelection),
            (plain('V'), Command::ExtendSelection),
            (plain('X'), Command::DeleteSelection),
            (plain('Y'), Command::YankSelection),
            (vec![KeyPress::new(Key::Char('u'), Modifiers::CTRL)], Command::ClearSelection),
            // Search
            (plain('/'), Command::StartSearch),
            (vec![KeyPress::new(Key::Char('l'), Modifiers::CTRL)], Command::ClearFuzzy),
            // Panes
            (vec![KeyPress::plain(Key::Tab)], Command::NextPane),
            (vec![KeyPress::new(Key::Tab, Modifiers::SHIFT)], Command::PrevPane),
        ];

        for (keys, cmd) in bindings {
            self.bindings.push(KeyBinding::simple(keys, cmd));
        }
    }

    /// Rebuilds the key index.
    fn rebuild_index(&mut self) {
        self.by_key.clear();
        for (i, binding) in self.bindings.iter().enumerate() {
            if let Some(first_key) = binding.keys.first() {
                self.by_key.entry(*first_key).or_default().push(i);
            }
        }
    }

    /// Processes a key press.
    ///
    /// Grammar keys (find targets, text objects, count digits) are resolved
    /// from `context` before bindings are consulted.
    pub fn process(&mut self, key: KeyPress, context: KeyContext) -> KeymapResult {
        if self.pending.is_empty() {
            if let Some(cmd) = Self::grammar_key(key, context) {
                return KeymapResult::Match(cmd);
            }
        }

        self.pending.push(key);

        // Find matching bindings
        let first_key = &self.pending[0];
        let indices = match self.by_key.get(first_key) {
            Some(v) => v.clone(),
            None => {
                self.pending.clear();
                return KeymapResult::NoMatch;
            }
        };

        let mut exact_match = None;
        let mut prefix_match = false;

        for i in indices {
            let binding = &self.bindings[i];

            if !binding.modes.contains(&context.mode) {
                continue;
            }

            if binding.keys.len() == self.pending.len() {
                // Later bindings (user config) win
                if binding.keys == self.pending {
                    exact_match = Some(binding.command.clone());
                }
            } else if binding.keys.len() > self.pending.len()
                && binding.keys[..self.pending.len()] == self.pending[..]
            {
                prefix_match = true;
            }
        }

        if let Some(cmd) = exact_match {
            self.pending.clear();
            return KeymapResult::Match(cmd);
        }

        if prefix_match {
            return KeymapResult::Pending;
        }

        self.pending.clear();
        KeymapResult::NoMatch
    }

    /// Keys whose meaning comes from the grammar state, not a binding.
    fn grammar_key(key: KeyPress, context: KeyContext) -> Option<Command> {
        if context.mode != Mode::Normal || key.modifiers.ctrl || key.modifiers.alt {
            return None;
        }
        let c = match key.key {
            Key::Char(c) => c,
            Key::Space => ' ',
            _ => return None,
        };

        if context.pending_find {
            return Some(Command::FindChar(c));
        }
        if context.text_object_modifier {
            return Some(Command::TextObject(c));
        }
        if context.pending_operator {
            if let Some(modifier) = TextObjectModifier::from_key(c) {
                return Some(Command::TextObjectModifier(modifier));
            }
        }
        match c.to_digit(10) {
            Some(0) if !context.has_count => None,
            Some(digit) => Some(Command::AddToCount(digit)),
            None => None,
        }
    }

    /// Clears pending keys.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Returns true if waiting for more keys.
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Returns all bindings.
    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Adds a binding.
    pub fn add_binding(&mut self, binding: KeyBinding) {
        self.bindings.push(binding);
        self.rebuild_index();
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of processing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeymapResult {
    /// A command was matched.
    Match(Command),
    /// Waiting for more keys.
    Pending,
    /// No binding matches.
    NoMatch,
}

/// Parses a key script such as `dd3p<Esc>` or `cwnew<Esc>`.
///
/// Plain characters are keys. Angle brackets name special keys:
/// `<Esc>`, `<CR>`, `<Tab>`, `<S-Tab>`, `<BS>`, `<Space>`, `<lt>`, `<C-r>`.
pub fn parse_key_script(script: &str) -> CoreResult<Vec<KeyPress>> {
    let mut keys = Vec::new();
    let mut chars = script.chars();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '>' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(CoreError::InvalidKey(format!("<{name}")));
                }
                let binding = name.replace('-', "+");
                let key = KeyPress::parse(&binding).ok_or_else(|| CoreError::InvalidKey(format!("<{name}>")))?;
                keys.push(key);
            }
            '\n' => keys.push(KeyPress::plain(Key::Enter)),
            '\t' => keys.push(KeyPress::plain(Key::Tab)),
            ' ' => keys.push(KeyPress::plain(Key::Space)),
            c => keys.push(KeyPress::char(c)),
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal() -> KeyContext {
        KeyContext::default()
    }

    #[test]
    fn test_keypress_parse() {
        let kp = KeyPress::parse("ctrl+r").unwrap();
        assert_eq!(kp.key, Key::Char('r'));
        assert!(kp.modifiers.ctrl);

        let kp = KeyPress::parse("shift+tab").unwrap();
        assert_eq!(kp, KeyPress::new(Key::Tab, Modifiers::SHIFT));

        assert_eq!(KeyPress::parse("G"), Some(KeyPress::char('G')));
        assert_eq!(KeyPress::parse("f"), Some(KeyPress::char('f')));
        assert_eq!(KeyPress::parse("+"), Some(KeyPress::char('+')));
        assert_eq!(KeyPress::parse("ctrl+r").unwrap().to_string(), "Ctrl+r");
    }

    #[test]
    fn test_keymap_match() {
        let mut keymap = Keymap::new();
        let result = keymap.process(KeyPress::new(Key::Char('r'), Modifiers::CTRL), normal());
        assert_eq!(result, KeymapResult::Match(Command::Redo));
    }

    #[test]
    fn test_sequence() {
        let mut keymap = Keymap::new();
        assert_eq!(keymap.process(KeyPress::char('g'), normal()), KeymapResult::Pending);
        assert!(keymap.is_pending());
        assert_eq!(
            keymap.process(KeyPress::char('g'), normal()),
            KeymapResult::Match(Command::Motion(Motion::FirstLine))
        );
        assert!(!keymap.is_pending());

        keymap.process(KeyPress::char('g'), normal());
        assert_eq!(keymap.process(KeyPress::char('x'), normal()), KeymapResult::NoMatch);
    }

    #[test]
    fn test_grammar_keys() {
        let mut keymap = Keymap::new();
        let find = KeyContext {
            pending_find: true,
            ..normal()
        };
        assert_eq!(keymap.process(KeyPress::char('d'), find), KeymapResult::Match(Command::FindChar('d')));

        let operator = KeyContext {
            pending_operator: true,
            ..normal()
        };
        assert_eq!(
            keymap.process(KeyPress::char('i'), operator),
            KeymapResult::Match(Command::TextObjectModifier(TextObjectModifier::Inner))
        );

        let object = KeyContext {
            pending_operator: true,
            text_object_modifier: true,
            ..normal()
        };
        assert_eq!(keymap.process(KeyPress::char('e'), object), KeymapResult::Match(Command::TextObject('e')));
    }

    #[test]
    fn test_zero_is_motion_without_count() {
        let mut keymap = Keymap::new();
        assert_eq!(
            keymap.process(KeyPress::char('0'), normal()),
            KeymapResult::Match(Command::Motion(Motion::LineStart))
        );
        let counting = KeyContext {
            has_count: true,
            ..normal()
        };
        assert_eq!(keymap.process(KeyPress::char('0'), counting), KeymapResult::Match(Command::AddToCount(0)));
        assert_eq!(keymap.process(KeyPress::char('7'), normal()), KeymapResult::Match(Command::AddToCount(7)));
    }

    #[test]
    fn test_insert_mode_ignores_normal_bindings() {
        let mut keymap = Keymap::new();
        let insert = KeyContext {
            mode: Mode::Insert,
            ..normal()
        };
        assert_eq!(keymap.process(KeyPress::char('d'), insert), KeymapResult::NoMatch);
    }

    #[test]
    fn test_config_overrides() {
        let mut config = Config::default();
        config.keyboard.bindings.insert("U".into(), "editor.redo".into());
        config.keyboard.bindings.insert("u".into(), "editor.paste_after".into());
        config.keyboard.bindings.insert("ctrl+x".into(), "no.such.command".into());

        let mut keymap = Keymap::from_config(&config);
        assert_eq!(keymap.process(KeyPress::char('U'), normal()), KeymapResult::Match(Command::Redo));
        assert_eq!(keymap.process(KeyPress::char('u'), normal()), KeymapResult::Match(Command::PasteAfter));
        assert_eq!(
            keymap.process(KeyPress::new(Key::Char('x'), Modifiers::CTRL), normal()),
            KeymapResult::NoMatch
        );
    }

    #[test]
    fn test_parse_key_script() {
        let keys = parse_key_script("cwab<Esc><C-r><S-Tab><lt> ").unwrap();
        assert_eq!(
            keys,
            vec![
                KeyPress::char('c'),
                KeyPress::char('w'),
                KeyPress::char('a'),
                KeyPress::char('b'),
                KeyPress::plain(Key::Escape),
                KeyPress::new(Key::Char('r'), Modifiers::CTRL),
                KeyPress::new(Key::Tab, Modifiers::SHIFT),
                KeyPress::char('<'),
                KeyPress::plain(Key::Space),
            ]
        );
        assert!(matches!(parse_key_script("<Nope>"), Err(CoreError::InvalidKey(_))));
        assert!(matches!(parse_key_script("<Esc"), Err(CoreError::InvalidKey(_))));
    }
}
