//! # Panedit Core
//!
//! Modal editing of directory listings, and the change plan derived from
//! the edits.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Session                           │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────┐ │
//! │  │  Keymap  │ │  Prompt  │ │  Config  │ │ DirectorySrc │ │
//! │  └────┬─────┘ └────┬─────┘ └──────────┘ └──────────────┘ │
//! │       └──── Command ────┐                                 │
//! │  ┌──────────────────────┴───────────────────────┐        │
//! │  │                    State                       │        │
//! │  │  mode · count · operator · registry            │        │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐       │        │
//! │  │  │ /dir/a   │ │ /dir/b   │ │ /dir/c   │ ...   │        │
//! │  │  └──────────┘ └──────────┘ └──────────┘       │        │
//! │  └───────────────────────┬──────────────────────┘        │
//! │                    aggregate_changes                      │
//! │                          ▼                                │
//! │                 ChangeSet (add/remove/rename/copy)        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Learning: Module Organization
//!
//! Rust modules map to files:
//! - `mod foo;` looks for `foo.rs` or `foo/mod.rs`
//! - `pub use` re-exports items for cleaner public APIs
//!
//! `edit` and `command` add `impl State` blocks; one type can have its
//! methods spread over several modules of the same crate.

pub mod aggregate;
pub mod buffers;
pub mod command;
pub mod config;
pub mod edit;
pub mod event;
pub mod keymap;
pub mod motion;
pub mod prompt;
pub mod register;
pub mod session;
pub mod source;
pub mod state;
pub mod textobject;

pub use aggregate::{Change, ChangeSet, Conflict, aggregate_buffers, aggregate_changes};
pub use buffers::BufferSet;
pub use command::Command;
pub use config::{Config, ConfigError};
pub use edit::InsertPosition;
pub use event::{EditorEvent, EventBus, EventHandler};
pub use keymap::{Key, KeyBinding, KeyPress, Keymap, KeymapResult, Modifiers, parse_key_script};
pub use motion::{FindKind, Motion, MotionRange};
pub use register::{Register, Registry};
pub use session::Session;
pub use source::{DirEntry, DirectorySource, MemorySource};
pub use state::{InsertSession, Mode, Operator, State};
pub use textobject::{TextObject, TextObjectModifier, TextObjects};

use std::path::PathBuf;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Buffer not found: {}", .0.display())]
    BufferNotFound(PathBuf),

    #[error("No active buffer")]
    NoActiveBuffer,

    #[error("Directory unavailable: {}", .0.display())]
    DirectoryUnavailable(PathBuf),

    #[error("Two changes target {}", .0.display())]
    DestinationCollision(PathBuf),

    #[error("Empty name in {}", .0.display())]
    EmptyName(PathBuf),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Buffer error: {0}")]
    Buffer(#[from] panedit_buffer::BufferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
