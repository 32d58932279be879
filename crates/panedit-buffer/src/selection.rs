//! Line selection handling.
//!
//! ## Learning: Ordered Sets
//!
//! A directory pane selects whole lines, not character spans. A
//! `BTreeSet<usize>` keeps the selected line indexes sorted and unique,
//! so iterating it yields lines top to bottom and contiguous runs are
//! easy to find.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// A set of selected lines plus the anchor used for range extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSelection {
    /// Selected line indexes
    indexes: BTreeSet<usize>,
    /// The most recently toggled line
    last: Option<usize>,
}

impl LineSelection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Returns the number of selected lines.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if a line is selected.
    pub fn contains(&self, index: usize) -> bool {
        self.indexes.contains(&index)
    }

    /// Selected lines, top to bottom.
    pub fn indexes(&self) -> impl Iterator<Item = usize> + '_ {
        self.indexes.iter().copied()
    }

    /// The anchor for range extension.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    /// Selects exactly one line.
    pub fn select_only(&mut self, index: usize) {
        self.indexes.clear();
        self.indexes.insert(index);
        self.last = Some(index);
    }

    /// Flips one line in or out of the selection.
    pub fn toggle(&mut self, index: usize) {
        if !self.indexes.remove(&index) {
            self.indexes.insert(index);
        }
        self.last = Some(index);
    }

    /// Extends from the anchor to `index`.
    ///
    /// If every line between the anchor and `index` is already selected
    /// the whole range is removed, otherwise the whole range is added.
    /// Without an anchor this behaves like [`toggle`](Self::toggle).
    pub fn select_range(&mut self, index: usize) {
        let Some(last) = self.last else {
            self.toggle(index);
            return;
        };

        let range = last.min(index)..=last.max(index);
        let fully_selected = range.clone().all(|i| self.indexes.contains(&i));
        for i in range {
            if fully_selected {
                self.indexes.remove(&i);
            } else {
                self.indexes.insert(i);
            }
        }
        self.last = Some(index);
    }

    /// Clears the selection and its anchor.
    pub fn clear(&mut self) {
        self.indexes.clear();
        self.last = None;
    }

    /// Drops indexes at or past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.indexes.retain(|&i| i < len);
        if self.last.is_some_and(|last| last >= len) {
            self.last = None;
        }
    }

    /// Contiguous runs of selected lines, top to bottom.
    pub fn runs(&self) -> Vec<RangeInclusive<usize>> {
        let mut runs: Vec<RangeInclusive<usize>> = Vec::new();
        for index in self.indexes() {
            match runs.last_mut() {
                Some(run) if *run.end() + 1 == index => *run = *run.start()..=index,
                _ => runs.push(index..=index),
            }
        }
        runs
    }

    /// Adjusts indexes after `range` was removed from the buffer.
    pub fn lines_removed(&mut self, range: RangeInclusive<usize>) {
        let removed = range.end() - range.start() + 1;
        let shift = |i: usize| {
            if i < *range.start() {
                Some(i)
            } else if i > *range.end() {
                Some(i - removed)
            } else {
                None
            }
        };
        self.indexes = self.indexes.iter().filter_map(|&i| shift(i)).collect();
        self.last = self.last.and_then(shift);
    }

    /// Adjusts indexes after `count` lines were inserted at `at`.
    pub fn lines_inserted(&mut self, at: usize, count: usize) {
        let shift = |i: usize| if i >= at { i + count } else { i };
        self.indexes = self.indexes.iter().map(|&i| shift(i)).collect();
        self.last = self.last.map(shift);
    }
}
