//! First-order transition model over projected outcomes

use chroma_core::{Digit, History, Symbol, Tally};
use serde::{Deserialize, Serialize};

/// Frequency table `previous label -> next label -> count`
///
/// Rows and the cells within each row keep the order in which they were
/// first accumulated, which is what breaks argmax ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable<T> {
    rows: Vec<(T, Tally<T>)>,
}

impl<T: Symbol> TransitionTable<T> {
    /// Count every adjacent pair of an oldest-first sequence
    pub fn build(chronological: &[T]) -> Self {
        let mut table = Self { rows: Vec::new() };
        for pair in chronological.windows(2) {
            table.record(pair[0], pair[1]);
        }
        table
    }

    fn record(&mut self, prev: T, next: T) {
        match self.rows.iter_mut().find(|(label, _)| *label == prev) {
            Some((_, row)) => row.add(next, 1.0),
            None => {
                let mut row = Tally::new();
                row.add(next, 1.0);
                self.rows.push((prev, row));
            }
        }
    }

    /// Observed successors of `prev`
    pub fn row(&self, prev: T) -> Option<&Tally<T>> {
        self.rows
            .iter()
            .find(|(label, _)| *label == prev)
            .map(|(_, row)| row)
    }

    /// Times `next` followed `prev`
    pub fn count(&self, prev: T, next: T) -> usize {
        self.row(prev).map_or(0, |row| row.get(next) as usize)
    }

    pub fn rows(&self) -> &[(T, Tally<T>)] {
        &self.rows
    }

    /// Most likely successor of `last` with its empirical probability
    pub fn forecast(&self, last: Option<T>) -> TransitionForecast<T> {
        let row = last.and_then(|label| self.row(label));
        let leader = row.and_then(|row| Some((row, row.leader()?)));
        match leader {
            Some((row, (most_likely, count))) => {
                let total = row.total();
                TransitionForecast {
                    last,
                    most_likely: Some(most_likely),
                    probability: count / total,
                    support: total as usize,
                }
            }
            None => TransitionForecast {
                last,
                most_likely: None,
                probability: 0.0,
                support: 0,
            },
        }
    }
}

/// What the transition model expects after the most recent label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionForecast<T> {
    /// Projected label of the most recent outcome
    pub last: Option<T>,
    /// Argmax of the last label's row
    pub most_likely: Option<T>,
    /// `row[most_likely] / sum(row)`, zero when the row is empty
    pub probability: f64,
    /// Number of observed transitions out of `last`
    pub support: usize,
}

impl<T> TransitionForecast<T> {
    pub fn is_empty(&self) -> bool {
        self.support == 0
    }
}

/// Build the table for one projection of the history and forecast from it
pub fn model<T: Symbol>(history: &History) -> (TransitionTable<T>, TransitionForecast<T>) {
    let chronological: Vec<T> = history.chronological();
    let table = TransitionTable::build(&chronological);
    let forecast = table.forecast(chronological.last().copied());
    (table, forecast)
}

/// Map a predicted label back to the digits consistent with it
///
/// Digits are ranked by how often they occur in the window among entries
/// carrying that label, most frequent first, ties in order of first
/// appearance. Digits never observed are not proposed.
pub fn candidates<T: Symbol>(history: &History, label: T, limit: usize) -> Vec<Digit> {
    let tally: Tally<Digit> = history
        .snapshot()
        .iter()
        .map(|o| o.value)
        .filter(|d| label.admits(*d))
        .collect();
    tally.top(limit)
}
