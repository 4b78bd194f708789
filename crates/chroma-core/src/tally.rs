//! Insertion-ordered weight tally

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Mapping from candidate to accumulated weight
///
/// Keeps first-seen order so that ranking breaks exact-weight ties
/// deterministically, by whichever candidate entered the tally first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tally<K> {
    entries: Vec<(K, f64)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add weight to a candidate, inserting it at the end if unseen
    pub fn add(&mut self, key: K, weight: f64) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, w)) => *w += weight,
            None => self.entries.push((key, weight)),
        }
    }

    /// Weight of a candidate, zero if unseen
    pub fn get(&self, key: K) -> f64 {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| *w).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn entries(&self) -> &[(K, f64)] {
        &self.entries
    }

    /// Entries sorted by weight descending, ties in first-seen order
    pub fn ranked(&self) -> Vec<(K, f64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked
    }

    /// Highest-weighted candidate, first-seen on ties
    pub fn leader(&self) -> Option<(K, f64)> {
        self.ranked().into_iter().next()
    }

    /// Every candidate sharing the top weight, in first-seen order
    pub fn leaders(&self) -> Vec<K> {
        let ranked = self.ranked();
        match ranked.first() {
            Some(&(_, top)) => ranked
                .into_iter()
                .take_while(|(_, w)| *w == top)
                .map(|(k, _)| k)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Keys of the `n` highest-weighted candidates
    pub fn top(&self, n: usize) -> Vec<K> {
        self.ranked().into_iter().take(n).map(|(k, _)| k).collect()
    }
}

impl<K: Copy + PartialEq> FromIterator<K> for Tally<K> {
    /// Count occurrences, one unit of weight each
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tally = Self::new();
        for key in iter {
            tally.add(key, 1.0);
        }
        tally
    }
}
