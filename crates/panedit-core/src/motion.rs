//! Motions and the ranges they cover.
//!
//! A motion answers two questions for the active buffer:
//! - where does the cursor go when it is used on its own?
//! - which lines (or which columns of the current line) does an
//!   operator act on when it follows `d`, `y` or `c`?

use panedit_buffer::{DirBuffer, Position, column_count};
use unicode_segmentation::UnicodeSegmentation;

/// Character search flavours (`f`, `F`, `t`, `T`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindKind {
    /// `f`: onto the next occurrence
    Forward,
    /// `F`: onto the previous occurrence
    Backward,
    /// `t`: just before the next occurrence
    TillForward,
    /// `T`: just after the previous occurrence
    TillBackward,
}

impl FindKind {
    /// The key that starts this search.
    pub fn key(&self) -> char {
        match self {
            FindKind::Forward => 'f',
            FindKind::Backward => 'F',
            FindKind::TillForward => 't',
            FindKind::TillBackward => 'T',
        }
    }

    fn is_forward(&self) -> bool {
        matches!(self, FindKind::Forward | FindKind::TillForward)
    }
}

/// Cursor motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    /// `h`
    Left,
    /// `l`
    Right,
    /// `j`
    Down,
    /// `k`
    Up,
    /// `0`
    LineStart,
    /// `$`
    LineEnd,
    /// `gg` (or `{count}gg`)
    FirstLine,
    /// `G` (or `{count}G`)
    LastLine,
    /// `f`/`F`/`t`/`T` followed by a character
    FindChar { kind: FindKind, ch: char },
    /// `n`: next fuzzy match line
    NextMatch,
    /// `N`: previous fuzzy match line
    PrevMatch,
}

/// What an operator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionRange {
    /// Whole lines, `start..=end`, `start <= end`
    Lines { start: usize, end: usize },
    /// Columns `start..end` of one line (end exclusive)
    Chars { line: usize, start: usize, end: usize },
}

impl MotionRange {
    /// Linewise range with its ends normalized low to high.
    pub fn lines(a: usize, b: usize) -> Self {
        MotionRange::Lines {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Returns true if the range covers nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            MotionRange::Lines { .. } => false,
            MotionRange::Chars { start, end, .. } => start >= end,
        }
    }
}

/// A resolved motion: cursor target plus operator range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub target: Position,
    pub range: MotionRange,
}

impl Motion {
    /// Returns true if the motion moves between lines.
    pub fn is_linewise(&self) -> bool {
        matches!(
            self,
            Motion::Down | Motion::Up | Motion::FirstLine | Motion::LastLine | Motion::NextMatch | Motion::PrevMatch
        )
    }

    /// Resolves the motion against a buffer.
    ///
    /// `count` is the raw typed count; `None` means the motion's default
    /// (1 for relative motions, first/last line for `gg`/`G`). Returns
    /// `None` when the motion has nowhere to go (empty buffer, character
    /// not found, no fuzzy matches).
    pub fn resolve(&self, buffer: &DirBuffer, count: Option<usize>) -> Option<Resolved> {
        let last = buffer.last_line()?;
        let cursor = buffer.cursor();
        let line = cursor.line;
        let col = cursor.column;
        let n = count.unwrap_or(1).max(1);
        let text = buffer.line_text(line).unwrap_or("");
        let width = column_count(text);

        let resolved = match *self {
            Motion::Down => {
                let target = (line + n).min(last);
                linewise(buffer, line, target, col)
            }
            Motion::Up => {
                let target = line.saturating_sub(n);
                linewise(buffer, line, target, col)
            }
            Motion::FirstLine => {
                let target = count.map_or(0, |c| c.saturating_sub(1)).min(last);
                linewise(buffer, line, target, col)
            }
            Motion::LastLine => {
                let target = count.map_or(last, |c| c.saturating_sub(1)).min(last);
                linewise(buffer, line, target, col)
            }
            Motion::NextMatch | Motion::PrevMatch => {
                let target = buffer.match_line(*self == Motion::NextMatch, n)?;
                linewise(buffer, line, target, col)
            }
            Motion::Left => {
                let target = col.saturating_sub(n);
                Resolved {
                    target: Position::new(line, target),
                    range: MotionRange::Chars { line, start: target, end: col },
                }
            }
            Motion::Right => {
                let end = (col + n).min(width);
                Resolved {
                    target: Position::new(line, end.min(width.saturating_sub(1))),
                    range: MotionRange::Chars { line, start: col, end },
                }
            }
            Motion::LineStart => Resolved {
                target: Position::new(line, 0),
                range: MotionRange::Chars { line, start: 0, end: col },
            },
            Motion::LineEnd => Resolved {
                target: Position::new(line, width.saturating_sub(1)),
                range: MotionRange::Chars { line, start: col, end: width },
            },
            Motion::FindChar { kind, ch } => {
                let found = find_char(text, col, kind.is_forward(), ch, n)?;
                let (target, start, end) = match kind {
                    FindKind::Forward => (found, col, found + 1),
                    FindKind::TillForward => (found - 1, col, found),
                    FindKind::Backward => (found, found, col),
                    FindKind::TillBackward => (found + 1, found + 1, col),
                };
                Resolved {
                    target: Position::new(line, target),
                    range: MotionRange::Chars { line, start, end },
                }
            }
        };
        Some(resolved)
    }
}

fn linewise(buffer: &DirBuffer, from: usize, target: usize, column: usize) -> Resolved {
    Resolved {
        target: Position::new(target, column).clamp_to(buffer.items()),
        range: MotionRange::lines(from, target),
    }
}

/// Column of the `n`-th `ch` after (or before) `col`.
fn find_char(text: &str, col: usize, forward: bool, ch: char, n: usize) -> Option<usize> {
    let mut buf = [0u8; 4];
    let needle: &str = ch.encode_utf8(&mut buf);
    let columns: Vec<usize> = text
        .graphemes(true)
        .enumerate()
        .filter(|(_, g)| *g == needle)
        .map(|(i, _)| i)
        .collect();
    if forward {
        columns.into_iter().filter(|&i| i > col).nth(n - 1)
    } else {
        columns.into_iter().rev().filter(|&i| i < col).nth(n - 1)
    }
}
