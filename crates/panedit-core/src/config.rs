//! Engine configuration.
//!
//! ## Learning: Serde for Serialization
//!
//! The `#[derive(Serialize, Deserialize)]` macro generates code to convert
//! structs to/from TOML. `#[serde(default)]` fills missing fields from
//! `Default::default()`, so a config file only needs the keys it changes:
//!
//! ```toml
//! [editor]
//! undo_limit = 200
//!
//! [fuzzy]
//! subsequence = false
//!
//! [keyboard.bindings]
//! "ctrl+r" = "editor.redo"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use panedit_buffer::{BufferConfig, MatchOptions};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editing behavior
    pub editor: EditorConfig,

    /// Fuzzy search behavior
    pub fuzzy: FuzzyConfig,

    /// Key binding overrides
    pub keyboard: KeyboardConfig,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "using default config");
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("panedit").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings handed to every new buffer.
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            max_history: self.editor.undo_limit,
            fuzzy_history_limit: self.fuzzy.history_limit,
            match_options: MatchOptions {
                subsequence: self.fuzzy.subsequence,
            },
        }
    }
}

/// Editing behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo steps kept per buffer
    pub undo_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { undo_limit: 1000 }
    }
}

/// Fuzzy search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Accept in-order subsequence matches, not just substrings
    pub subsequence: bool,

    /// Committed queries remembered per buffer
    pub history_limit: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            subsequence: true,
            history_limit: 50,
        }
    }
}

/// Keyboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Custom key bindings: key string to command name
    pub bindings: HashMap<String, String>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
