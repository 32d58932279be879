//! Text objects: `iw`, `ae`, `in`, ...
//!
//! ## Learning: Trait Objects as Plug-ins
//!
//! Each object is a small type implementing [`TextObject`]. The registry
//! stores them as `Arc<dyn TextObject>` keyed by the character typed after
//! `i`/`a`, so callers can register their own objects without touching the
//! dispatcher.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use panedit_buffer::{DirBuffer, byte_to_column, column_count};
use unicode_segmentation::UnicodeSegmentation;

use crate::motion::MotionRange;

/// `i` (inner) or `a` (around).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObjectModifier {
    Inner,
    Around,
}

impl TextObjectModifier {
    /// Maps `i`/`a` to a modifier.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'i' => Some(TextObjectModifier::Inner),
            'a' => Some(TextObjectModifier::Around),
            _ => None,
        }
    }
}

/// Resolves a text object to a range in the active buffer.
pub trait TextObject: Send + Sync {
    /// Range covered at the cursor, or `None` if the object is absent.
    fn resolve(&self, buffer: &DirBuffer, modifier: TextObjectModifier, count: usize) -> Option<MotionRange>;
}

/// `w`: unicode word at the cursor.
///
/// Inner covers `count` word-boundary segments starting at the cursor.
/// Around also takes the whitespace that follows (or precedes, at the end
/// of the line).
#[derive(Debug, Default)]
pub struct Word;

impl TextObject for Word {
    fn resolve(&self, buffer: &DirBuffer, modifier: TextObjectModifier, count: usize) -> Option<MotionRange> {
        let cursor = buffer.cursor();
        let text = buffer.line_text(cursor.line)?;

        let mut segments = Vec::new();
        let mut col = 0;
        for word in text.split_word_bounds() {
            let width = column_count(word);
            segments.push((col, col + width, word.trim().is_empty()));
            col += width;
        }

        let first = segments
            .iter()
            .position(|&(start, end, _)| start <= cursor.column && cursor.column < end)?;
        let last = (first + count.max(1) - 1).min(segments.len() - 1);
        let mut start = segments[first].0;
        let mut end = segments[last].1;

        if modifier == TextObjectModifier::Around {
            match segments.get(last + 1) {
                Some(&(_, next_end, true)) => end = next_end,
                _ => {
                    if let Some(&(prev_start, _, true)) = first.checked_sub(1).and_then(|i| segments.get(i)) {
                        start = prev_start;
                    }
                }
            }
        }

        Some(MotionRange::Chars { line: cursor.line, start, end })
    }
}

/// Column of the extension dot, if the name has an extension.
///
/// A leading dot (`.gitignore`) is part of the stem.
fn extension_dot(text: &str) -> Option<usize> {
    match text.rfind('.') {
        Some(0) | None => None,
        Some(byte) => Some(byte_to_column(text, byte)),
    }
}

/// `e`: file extension. Inner is after the last dot, around includes it.
#[derive(Debug, Default)]
pub struct Extension;

impl TextObject for Extension {
    fn resolve(&self, buffer: &DirBuffer, modifier: TextObjectModifier, _count: usize) -> Option<MotionRange> {
        let line = buffer.cursor().line;
        let text = buffer.line_text(line)?;
        let dot = extension_dot(text)?;
        let start = match modifier {
            TextObjectModifier::Inner => dot + 1,
            TextObjectModifier::Around => dot,
        };
        Some(MotionRange::Chars { line, start, end: column_count(text) })
    }
}

/// `n`: name stem. Inner stops before the extension, around is the whole name.
#[derive(Debug, Default)]
pub struct Stem;

impl TextObject for Stem {
    fn resolve(&self, buffer: &DirBuffer, modifier: TextObjectModifier, _count: usize) -> Option<MotionRange> {
        let line = buffer.cursor().line;
        let text = buffer.line_text(line)?;
        let width = column_count(text);
        let end = match modifier {
            TextObjectModifier::Inner => extension_dot(text).unwrap_or(width),
            TextObjectModifier::Around => width,
        };
        Some(MotionRange::Chars { line, start: 0, end })
    }
}

/// Text objects by key.
#[derive(Clone)]
pub struct TextObjects {
    objects: HashMap<char, Arc<dyn TextObject>>,
}

impl TextObjects {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    /// Registers (or replaces) the object for `key`.
    pub fn register(&mut self, key: char, object: impl TextObject + 'static) {
        self.objects.insert(key, Arc::new(object));
    }

    /// Returns true if `key` names an object.
    pub fn contains(&self, key: char) -> bool {
        self.objects.contains_key(&key)
    }

    /// Resolves the object for `key`.
    pub fn resolve(
        &self,
        key: char,
        buffer: &DirBuffer,
        modifier: TextObjectModifier,
        count: usize,
    ) -> Option<MotionRange> {
        self.objects.get(&key)?.resolve(buffer, modifier, count)
    }
}

impl Default for TextObjects {
    fn default() -> Self {
        let mut objects = Self::empty();
        objects.register('w', Word);
        objects.register('e', Extension);
        objects.register('n', Stem);
        objects
    }
}

impl fmt::Debug for TextObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.objects.keys().collect();
        keys.sort();
        f.debug_struct("TextObjects").field("keys", &keys).finish()
    }
}
