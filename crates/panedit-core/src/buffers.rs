//! The set of open directory buffers.
//!
//! ## Learning: Map + Order
//!
//! `HashMap` gives O(1) lookup by path but no stable order. The change
//! aggregator needs a deterministic scan order (the order panes were
//! opened), so a `Vec<PathBuf>` records insertion order alongside the map.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};

use panedit_buffer::DirBuffer;

use crate::{CoreError, CoreResult};

/// Open buffers keyed by directory, in the order they were opened.
#[derive(Debug, Clone, Default)]
pub struct BufferSet {
    /// All open buffers
    buffers: HashMap<PathBuf, DirBuffer>,

    /// Order in which buffers were opened
    order: Vec<PathBuf>,

    /// Buffer that receives commands
    active: Option<PathBuf>,
}

impl BufferSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a buffer and makes it active.
    ///
    /// A buffer that is already open for the same path is kept as is.
    pub fn add(&mut self, buffer: DirBuffer) -> &mut DirBuffer {
        let path = buffer.path().to_path_buf();
        self.active = Some(path.clone());
        match self.buffers.entry(path) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(buffer)
            }
        }
    }

    /// Removes a buffer.
    pub fn close(&mut self, path: &Path) -> CoreResult<DirBuffer> {
        let buffer = self
            .buffers
            .remove(path)
            .ok_or_else(|| CoreError::BufferNotFound(path.to_path_buf()))?;
        self.order.retain(|p| p != path);

        if self.active.as_deref() == Some(path) {
            self.active = self.order.last().cloned();
        }

        Ok(buffer)
    }

    /// Returns a buffer by path.
    pub fn get(&self, path: &Path) -> Option<&DirBuffer> {
        self.buffers.get(path)
    }

    /// Returns a mutable buffer by path.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut DirBuffer> {
        self.buffers.get_mut(path)
    }

    /// Returns true if a buffer is open for `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.buffers.contains_key(path)
    }

    /// Returns the active buffer.
    pub fn active(&self) -> Option<&DirBuffer> {
        self.active.as_ref().and_then(|p| self.buffers.get(p))
    }

    /// Returns a mutable reference to the active buffer.
    pub fn active_mut(&mut self) -> Option<&mut DirBuffer> {
        self.active.as_ref().and_then(|p| self.buffers.get_mut(p))
    }

    /// Path of the active buffer.
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    /// Sets the active buffer.
    pub fn set_active(&mut self, path: &Path) -> CoreResult<()> {
        if !self.buffers.contains_key(path) {
            return Err(CoreError::BufferNotFound(path.to_path_buf()));
        }
        self.active = Some(path.to_path_buf());
        Ok(())
    }

    /// Moves focus `offset` panes forward (negative = backward), wrapping.
    pub fn cycle_active(&mut self, offset: isize) {
        if self.order.is_empty() {
            return;
        }
        let len = self.order.len() as isize;
        let current = self
            .active
            .as_ref()
            .and_then(|a| self.order.iter().position(|p| p == a))
            .unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        self.active = Some(self.order[next].clone());
    }

    /// Buffers in the order they were opened.
    pub fn iter(&self) -> impl Iterator<Item = &DirBuffer> {
        self.order.iter().filter_map(|p| self.buffers.get(p))
    }

    /// Paths in the order they were opened.
    pub fn order(&self) -> &[PathBuf] {
        &self.order
    }

    /// Returns the number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if no buffers are open.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
