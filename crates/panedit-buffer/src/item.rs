//! Directory entries as buffer lines.
//!
//! ## Learning: Shared Ownership with `Arc`
//!
//! A pasted line must still point at the *same* filesystem entry as the
//! line it was yanked from. Cloning a `BufferItem` clones the `Arc<Origin>`
//! handle, not the origin itself, so every copy of a line shares one
//! origin record. That shared record is what the change aggregator keys on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cursor::column_count;

/// What kind of filesystem entry an origin describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    File,
    Directory,
}

/// The externally supplied description of an existing entry.
///
/// Origins are immutable once loaded. Renames are expressed by the
/// line's `text`, never by mutating the origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// Entry name as it exists on disk
    pub name: String,
    /// File or directory
    pub kind: EntryKind,
    /// Canonical path, when the provider knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Origin {
    /// Creates an origin without a canonical path.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            path: None,
        }
    }

    /// Shorthand for a file origin.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    /// Shorthand for a directory origin.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory)
    }

    /// Attaches a canonical path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns the canonical path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns true for directories.
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// The key that links every line showing this entry.
    ///
    /// Canonical path when present, bare name otherwise.
    pub fn identity_key(&self) -> IdentityKey {
        match &self.path {
            Some(path) => IdentityKey::Path(path.clone()),
            None => IdentityKey::Name(self.name.clone()),
        }
    }
}

/// Stable identity of a real entry across all buffers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKey {
    Path(PathBuf),
    Name(String),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Path(path) => write!(f, "{}", path.display()),
            IdentityKey::Name(name) => write!(f, "{}", name),
        }
    }
}

/// One line of a directory buffer.
///
/// ## Learning: Enums Carry Data
///
/// `Real` lines are backed by an existing entry; `Str` lines are new
/// entries typed by the user. Exhaustive `match` forces every consumer
/// (aggregator, renderer, executor) to decide what each kind means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BufferItem {
    /// An existing entry, possibly with an edited name
    Real { origin: Arc<Origin>, text: String },
    /// A new entry with no identity yet
    Str { text: String },
}

impl BufferItem {
    /// A real line showing the origin's current name.
    pub fn real(origin: impl Into<Arc<Origin>>) -> Self {
        let origin = origin.into();
        let text = origin.name.clone();
        BufferItem::Real { origin, text }
    }

    /// A new, identity-less line.
    pub fn new_entry(text: impl Into<String>) -> Self {
        BufferItem::Str { text: text.into() }
    }

    /// The line's display text.
    pub fn text(&self) -> &str {
        match self {
            BufferItem::Real { text, .. } | BufferItem::Str { text } => text,
        }
    }

    /// Replaces the line's display text, keeping its identity.
    pub fn set_text(&mut self, new_text: impl Into<String>) {
        match self {
            BufferItem::Real { text, .. } | BufferItem::Str { text } => *text = new_text.into(),
        }
    }

    /// Returns the origin of a real line.
    pub fn origin(&self) -> Option<&Arc<Origin>> {
        match self {
            BufferItem::Real { origin, .. } => Some(origin),
            BufferItem::Str { .. } => None,
        }
    }

    /// Returns the identity key of a real line.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        self.origin().map(|origin| origin.identity_key())
    }

    /// Returns true when the line is backed by an existing entry.
    pub fn is_real(&self) -> bool {
        matches!(self, BufferItem::Real { .. })
    }

    /// Returns true when the text is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Returns true when a real line's text differs from its origin's name.
    pub fn is_renamed(&self) -> bool {
        match self {
            BufferItem::Real { origin, text } => origin.name != *text,
            BufferItem::Str { .. } => false,
        }
    }

    /// Number of grapheme columns in the text.
    pub fn width(&self) -> usize {
        column_count(self.text())
    }

    /// An empty line with the same identity (or none, for new lines).
    pub fn blank_like(&self) -> Self {
        match self {
            BufferItem::Real { origin, .. } => BufferItem::Real {
                origin: Arc::clone(origin),
                text: String::new(),
            },
            BufferItem::Str { .. } => BufferItem::new_entry(""),
        }
    }
}

impl From<Origin> for BufferItem {
    fn from(origin: Origin) -> Self {
        BufferItem::real(origin)
    }
}
