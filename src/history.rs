use std::collections::VecDeque;

use crate::engine::Grid;

/// Most recent entries kept for undo; older entries are evicted first.
pub const UNDO_LIMIT: usize = 20;

/// Immutable (grid, score) snapshot captured before a move attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub grid: Grid,
    pub score: u64,
}

/// Bounded undo stack.
///
/// Entries are pushed speculatively before every move attempt: a no-op move
/// rolls its entry back with [`History::discard_last`], an undo consumes the
/// newest entry via [`History::pop`]. Once the bound is exceeded the oldest
/// entry is dropped.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        History {
            entries: VecDeque::with_capacity(UNDO_LIMIT),
        }
    }

    /// Push a deep-cloned snapshot, evicting the oldest entry past the bound.
    pub fn save(&mut self, grid: &Grid, score: u64) {
        if self.entries.len() == UNDO_LIMIT {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            grid: grid.clone(),
            score,
        });
    }

    /// Remove and return the most recent entry.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Drop the most recent entry, rolling back a speculative save.
    pub fn discard_last(&mut self) {
        self.entries.pop_back();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
