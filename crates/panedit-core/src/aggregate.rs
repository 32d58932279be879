//! Change aggregation: from edited buffers to filesystem operations.
//!
//! ## The Algorithm
//!
//! 1. **Homes.** Every line of every buffer's `original_items` is the
//!    entry's home: the directory and name it has on disk. The first home
//!    seen for an identity wins.
//! 2. **Occurrences.** Scan buffers in the order they were opened and
//!    lines top to bottom. New (`Str`) lines with text become `Add`s right
//!    away. Real lines are appended to their identity's occurrence list.
//! 3. **Classification**, per identity:
//!    - no occurrence left: `Remove` from home
//!    - one occurrence is the home itself: keep it, `Copy` the rest
//!    - otherwise: the last occurrence is a `Rename`, earlier ones `Copy`
//!
//! Line order within a buffer never matters to the result except for
//! choosing which of several moved copies is the rename.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use panedit_buffer::{BufferItem, DirBuffer, IdentityKey, Origin};
use serde::{Deserialize, Serialize};

use crate::state::State;
use crate::{CoreError, CoreResult};

/// One intended filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Change {
    /// Create a new entry
    Add { directory: PathBuf, name: String },
    /// Delete an existing entry
    Remove { directory: PathBuf, item: Arc<Origin> },
    /// Move or rename an existing entry
    Rename {
        item: Arc<Origin>,
        new_directory: PathBuf,
        new_name: String,
    },
    /// Duplicate an existing entry
    Copy {
        item: Arc<Origin>,
        new_directory: PathBuf,
        new_name: String,
    },
}

impl Change {
    /// Where the change puts an entry, if it creates one.
    pub fn destination(&self) -> Option<(&Path, &str)> {
        match self {
            Change::Add { directory, name } => Some((directory, name)),
            Change::Rename {
                new_directory,
                new_name,
                ..
            }
            | Change::Copy {
                new_directory,
                new_name,
                ..
            } => Some((new_directory, new_name)),
            Change::Remove { .. } => None,
        }
    }

    /// The existing entry the change acts on.
    pub fn item(&self) -> Option<&Arc<Origin>> {
        match self {
            Change::Add { .. } => None,
            Change::Remove { item, .. } | Change::Rename { item, .. } | Change::Copy { item, .. } => Some(item),
        }
    }
}

/// Several changes creating the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub directory: PathBuf,
    pub name: String,
    /// Indexes into the change list
    pub changes: Vec<usize>,
}

/// The result of aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Destinations targeted by more than one change, in first-seen order.
    pub fn conflicts(&self) -> Vec<Conflict> {
        let mut seen: HashMap<(&Path, &str), usize> = HashMap::new();
        let mut conflicts: Vec<Conflict> = Vec::new();
        for (index, change) in self.changes.iter().enumerate() {
            let Some((directory, name)) = change.destination() else {
                continue;
            };
            match seen.entry((directory, name)) {
                Entry::Vacant(entry) => {
                    entry.insert(conflicts.len());
                    conflicts.push(Conflict {
                        directory: directory.to_path_buf(),
                        name: name.to_string(),
                        changes: vec![index],
                    });
                }
                Entry::Occupied(entry) => conflicts[*entry.get()].changes.push(index),
            }
        }
        conflicts.retain(|conflict| conflict.changes.len() > 1);
        conflicts
    }

    /// Checks that the plan can be executed as is.
    pub fn validate(&self) -> CoreResult<()> {
        for change in &self.changes {
            if let Some((directory, name)) = change.destination() {
                if name.trim().is_empty() {
                    return Err(CoreError::EmptyName(directory.to_path_buf()));
                }
            }
        }
        if let Some(conflict) = self.conflicts().into_iter().next() {
            return Err(CoreError::DestinationCollision(conflict.directory.join(conflict.name)));
        }
        Ok(())
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Aggregates every open buffer of `state`.
pub fn aggregate_changes(state: &State) -> ChangeSet {
    aggregate_buffers(state.buffers().iter())
}

struct Home<'a> {
    directory: &'a Path,
    name: &'a str,
    origin: &'a Arc<Origin>,
}

struct Occurrence<'a> {
    directory: &'a Path,
    name: &'a str,
    origin: &'a Arc<Origin>,
}

/// Aggregates buffers given in scan order.
pub fn aggregate_buffers<'a>(buffers: impl IntoIterator<Item = &'a DirBuffer>) -> ChangeSet {
    let buffers: Vec<&DirBuffer> = buffers.into_iter().collect();

    // Homes, first one wins
    let mut homes: HashMap<IdentityKey, Home<'_>> = HashMap::new();
    let mut identities: Vec<IdentityKey> = Vec::new();
    for buffer in &buffers {
        for item in buffer.original_items() {
            let BufferItem::Real { origin, text } = item else {
                continue;
            };
            if let Entry::Vacant(entry) = homes.entry(origin.identity_key()) {
                identities.push(entry.key().clone());
                entry.insert(Home {
                    directory: buffer.path(),
                    name: text,
                    origin,
                });
            }
        }
    }

    // Occurrences
    let mut changes = Vec::new();
    let mut occurrences: HashMap<IdentityKey, Vec<Occurrence<'_>>> = HashMap::new();
    for buffer in &buffers {
        for item in buffer.items() {
            match item {
                BufferItem::Str { text } => {
                    if !text.trim().is_empty() {
                        changes.push(Change::Add {
                            directory: buffer.path().to_path_buf(),
                            name: text.clone(),
                        });
                    }
                }
                BufferItem::Real { origin, text } => {
                    let key = origin.identity_key();
                    if !homes.contains_key(&key) && !occurrences.contains_key(&key) {
                        identities.push(key.clone());
                    }
                    occurrences.entry(key).or_default().push(Occurrence {
                        directory: buffer.path(),
                        name: text,
                        origin,
                    });
                }
            }
        }
    }

    // Classification
    for key in &identities {
        let mut found = occurrences.remove(key).unwrap_or_default();
        let Some(home) = homes.get(key) else {
            // Source pane closed after a yank: the entry stays where it is
            changes.extend(found.iter().map(copy));
            continue;
        };

        if found.is_empty() {
            changes.push(Change::Remove {
                directory: home.directory.to_path_buf(),
                item: Arc::clone(home.origin),
            });
            continue;
        }

        let at_home = found
            .iter()
            .position(|o| o.directory == home.directory && o.name == home.name);
        match at_home {
            Some(index) => {
                found.remove(index);
                changes.extend(found.iter().map(copy));
            }
            None => {
                let Some(last) = found.pop() else {
                    continue;
                };
                changes.extend(found.iter().map(copy));
                changes.push(Change::Rename {
                    item: Arc::clone(last.origin),
                    new_directory: last.directory.to_path_buf(),
                    new_name: last.name.to_string(),
                });
            }
        }
    }

    tracing::debug!(buffers = buffers.len(), changes = changes.len(), "aggregated changes");
    ChangeSet::new(changes)
}

fn copy(occurrence: &Occurrence<'_>) -> Change {
    Change::Copy {
        item: Arc::clone(occurrence.origin),
        new_directory: occurrence.directory.to_path_buf(),
        new_name: occurrence.name.to_string(),
    }
}
