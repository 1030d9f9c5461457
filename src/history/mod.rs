//! Session history
//!
//! Mirrors the browser history contract: navigating to a page pushes an
//! entry, going back after a push drops the forward entries, and the
//! state payload carries the path needed to restore the page.

use serde::{Deserialize, Serialize};

/// State payload attached to a history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// Site-relative path of the page
    pub path: String,
}

impl HistoryState {
    /// Create a state for a path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Linear history with a cursor
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryState>,
    index: usize,
}

impl SessionHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries with a single entry for `path`
    pub fn reset(&mut self, path: impl Into<String>) {
        self.entries = vec![HistoryState::new(path)];
        self.index = 0;
    }

    /// Push a new entry, discarding any forward entries
    pub fn push(&mut self, state: HistoryState) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(state);
        self.index = self.entries.len() - 1;
    }

    /// Move the cursor back, returning the entry now current
    pub fn back(&mut self) -> Option<HistoryState> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).cloned()
    }

    /// Move the cursor forward, returning the entry now current
    pub fn forward(&mut self) -> Option<HistoryState> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).cloned()
    }

    /// Check whether back navigation is possible
    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    /// Check whether forward navigation is possible
    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Entry the cursor points at
    pub fn current(&self) -> Option<&HistoryState> {
        self.entries.get(self.index)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
