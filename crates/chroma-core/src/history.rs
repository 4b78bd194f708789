//! Bounded, insertion-ordered outcome history

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{Outcome, Symbol};

/// Fixed-capacity FIFO window of outcomes, oldest first
///
/// The history is the single source of truth for every detector and for
/// the transition model. Readers only ever get shared borrows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<Outcome>,
    capacity: usize,
}

impl History {
    /// Create an empty history. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the newest end, evicting the oldest entries beyond capacity
    ///
    /// Returns the evicted outcomes, oldest first.
    pub fn append(&mut self, outcome: Outcome) -> Vec<Outcome> {
        self.entries.push_back(outcome);
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            if let Some(old) = self.entries.pop_front() {
                evicted.push(old);
            }
        }
        evicted
    }

    /// Read-only view in insertion order
    pub fn snapshot(&self) -> &VecDeque<Outcome> {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent outcome
    pub fn last(&self) -> Option<&Outcome> {
        self.entries.back()
    }

    /// Oldest-first projection of the window
    pub fn chronological<T: Symbol>(&self) -> Vec<T> {
        self.entries.iter().map(|o| T::project(o.value)).collect()
    }

    /// Newest-first projection of the window (index 0 = most recent)
    pub fn newest_first<T: Symbol>(&self) -> Vec<T> {
        self.entries
            .iter()
            .rev()
            .map(|o| T::project(o.value))
            .collect()
    }
}
