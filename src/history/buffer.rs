//! Bounded circular buffer of history entries.

use std::collections::VecDeque;

use thiserror::Error;

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that can occur while navigating the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Undo was requested on a buffer that holds no entry at all.
    #[error("the undo history is empty")]
    EmptyHistory,
    /// Redo was requested with no undone suffix available.
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Fixed-capacity history of opaque snapshots with a cursor.
///
/// `pointer` is 1-indexed and marks "one past the active entry", so the
/// active entry lives at `pointer - 1`. Entries at `pointer..` form the
/// future slice that can be redone. They only exist while `redo_available`
/// holds and are discarded by the next [`push`](Self::push).
///
/// When the buffer is full, a push evicts the oldest entry (index 0) and
/// slides the cursor back by one before inserting. The storage is a ring,
/// so eviction does not move the remaining entries.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    pointer: usize,
    capacity: usize,
    redo_available: bool,
}

impl<T> HistoryBuffer<T> {
    /// Create a buffer holding at most `capacity` entries, seeded with
    /// `baseline`. A capacity of zero is treated as one.
    pub fn new(capacity: usize, baseline: T) -> Self {
        let capacity = capacity.max(1);
        let mut buffer = Self {
            entries: VecDeque::with_capacity(capacity),
            pointer: 0,
            capacity,
            redo_available: false,
        };
        buffer.reset(baseline);
        buffer
    }

    /// Drop every entry and start over from a single baseline entry.
    /// Returns the dropped entries, oldest first.
    pub fn reset(&mut self, baseline: T) -> Vec<T> {
        let dropped = self.entries.drain(..).collect();
        self.entries.push_back(baseline);
        self.pointer = 1;
        self.redo_available = false;
        dropped
    }

    /// Commit a new entry after the active one.
    ///
    /// Anything that was undone before this call can no longer be redone.
    /// Returns the entries that left the buffer: the evicted oldest one and
    /// the discarded future slice.
    pub fn push(&mut self, entry: T) -> Vec<T> {
        let mut dropped = Vec::new();
        if self.entries.len() == self.capacity {
            dropped.extend(self.entries.pop_front());
            self.pointer = self.pointer.saturating_sub(1);
        }

        // Inserting at the cursor and erasing everything after it is the same
        // as cutting the future slice and appending.
        dropped.extend(self.entries.drain(self.pointer..));
        self.entries.push_back(entry);
        self.pointer += 1;

        self.redo_available = false;
        dropped
    }

    /// Step back one entry and return the state now active.
    ///
    /// At the oldest retained entry the cursor stays put and that entry is
    /// returned again.
    pub fn undo(&mut self) -> Result<&T> {
        if self.entries.is_empty() {
            return Err(HistoryError::EmptyHistory);
        }

        self.pointer = self.pointer.saturating_sub(1).max(1);
        self.redo_available = true;

        self.entries
            .get(self.pointer - 1)
            .ok_or(HistoryError::EmptyHistory)
    }

    /// Step forward one entry and return the state now active.
    pub fn redo(&mut self) -> Result<&T> {
        if !self.redo_available {
            return Err(HistoryError::NothingToRedo);
        }

        self.pointer = (self.pointer + 1).min(self.entries.len());

        self.entries
            .get(self.pointer.saturating_sub(1))
            .ok_or(HistoryError::EmptyHistory)
    }

    /// The active entry.
    pub fn current(&self) -> Option<&T> {
        self.pointer
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
    }

    /// The entry right after the active one, i.e. the one the last undo
    /// stepped away from.
    pub fn peek_next(&self) -> Option<&T> {
        if self.pointer < 1 {
            return None;
        }
        self.entries.get(self.pointer)
    }

    /// Replace the active entry wholesale, returning the previous one.
    pub fn replace_current(&mut self, entry: T) -> Result<T> {
        let slot = self
            .pointer
            .checked_sub(1)
            .and_then(|index| self.entries.get_mut(index))
            .ok_or(HistoryError::EmptyHistory)?;
        Ok(std::mem::replace(slot, entry))
    }

    /// Whether an undo would move the cursor.
    pub fn can_undo(&self) -> bool {
        self.pointer > 1
    }

    /// Whether a redo would succeed.
    pub fn can_redo(&self) -> bool {
        self.redo_available
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cursor position, one past the active entry
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Retained entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}
