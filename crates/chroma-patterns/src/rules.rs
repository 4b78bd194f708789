//! Built-in pattern rules
//!
//! Every rule reads the newest-first window (index 0 = most recent) and
//! abstains when the window is too short for it.

use chroma_core::{Symbol, TieBreak};
use rand::RngCore;

use crate::detector::{break_tie, count_pair};
use crate::{Detector, Named, Vote};

/// The most recent `length` entries are identical
///
/// Binary spaces vote the opposite label; many-valued spaces mark the
/// streak value as unlikely.
#[derive(Debug, Clone)]
pub struct StreakRule {
    pub length: usize,
}

impl Named for StreakRule {
    fn name(&self) -> String {
        format!("streak_{}", self.length)
    }
}

impl<T: Symbol> Detector<T> for StreakRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if self.length == 0 || recent.len() < self.length {
            return None;
        }
        let head = recent[0];
        if !recent[..self.length].iter().all(|l| *l == head) {
            return None;
        }
        Some(match head.opposite() {
            Some(other) => Vote::favor(self.name(), other),
            None => Vote::avoid(self.name(), head),
        })
    }
}

/// Two labels interleaved over `span` positions: `0 != 1`, and every
/// position equals position 0 or 1 by parity. Votes position 0.
#[derive(Debug, Clone)]
pub struct AlternationRule {
    pub span: usize,
}

impl Named for AlternationRule {
    fn name(&self) -> String {
        format!("alternation_{}", self.span)
    }
}

impl<T: Symbol> Detector<T> for AlternationRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if self.span < 2 || recent.len() < self.span || recent[0] == recent[1] {
            return None;
        }
        let interleaved = (2..self.span).all(|i| recent[i] == recent[i % 2]);
        interleaved.then(|| Vote::favor(self.name(), recent[0]))
    }
}

/// Every adjacent pair within `span` differs. Votes position 0.
#[derive(Debug, Clone)]
pub struct ZigZagRule {
    pub span: usize,
}

impl Named for ZigZagRule {
    fn name(&self) -> String {
        format!("zigzag_{}", self.span)
    }
}

impl<T: Symbol> Detector<T> for ZigZagRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if self.span < 2 || recent.len() < self.span {
            return None;
        }
        let zigzag = recent[..self.span].windows(2).all(|w| w[0] != w[1]);
        zigzag.then(|| Vote::favor(self.name(), recent[0]))
    }
}

/// `[x, x, y, y, x, x]`: three internally equal pairs, first and last
/// matching. Votes `x`.
#[derive(Debug, Clone, Default)]
pub struct RepeatingPairsRule;

impl Named for RepeatingPairsRule {
    fn name(&self) -> String {
        "repeating_pairs".to_string()
    }
}

impl<T: Symbol> Detector<T> for RepeatingPairsRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if recent.len() < 6 {
            return None;
        }
        let r = recent;
        let matched = r[0] == r[1] && r[2] == r[3] && r[4] == r[5] && r[0] == r[4];
        matched.then(|| Vote::favor(self.name(), r[0]))
    }
}

/// `[x, x, y, y]` with `x != y`: the pair is about to flip. Votes `y`,
/// which in a binary space is the opposite of `x`.
#[derive(Debug, Clone, Default)]
pub struct PairFlipRule;

impl Named for PairFlipRule {
    fn name(&self) -> String {
        "pair_flip".to_string()
    }
}

impl<T: Symbol> Detector<T> for PairFlipRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if recent.len() < 4 {
            return None;
        }
        let r = recent;
        let matched = r[0] == r[1] && r[2] == r[3] && r[0] != r[2];
        matched.then(|| Vote::favor(self.name(), r[2]))
    }
}

/// Smallest exact period of the window, extrapolated one step
///
/// Scans `p` from 1 to `len / 2`. The first `p` with `w[i] == w[i - p]`
/// across the whole window votes `w[p - 1]`, the entry one full period
/// before the step being predicted.
#[derive(Debug, Clone, Default)]
pub struct PeriodicityRule {
    /// Only the most recent `max_span` entries are scanned when set
    pub max_span: Option<usize>,
}

impl PeriodicityRule {
    /// Smallest exact period of a window, if any
    pub fn period_of<T: PartialEq>(window: &[T]) -> Option<usize> {
        let repeats = |p: usize| (p..window.len()).all(|i| window[i] == window[i - p]);
        (1..=window.len() / 2).find(|&p| repeats(p))
    }
}

impl Named for PeriodicityRule {
    fn name(&self) -> String {
        "periodicity".to_string()
    }
}

impl<T: Symbol> Detector<T> for PeriodicityRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        let span = self
            .max_span
            .map_or(recent.len(), |max| max.min(recent.len()));
        let window = &recent[..span];
        let period = Self::period_of(window)?;
        Some(Vote::favor(self.name(), window[period - 1]))
    }
}

/// Mean reversion over the last `window` entries of a binary space
///
/// If one label strictly outnumbers the other, votes the minority.
#[derive(Debug, Clone)]
pub struct MinorityRule {
    pub window: usize,
}

impl Named for MinorityRule {
    fn name(&self) -> String {
        format!("minority_{}", self.window)
    }
}

impl<T: Symbol> Detector<T> for MinorityRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if self.window == 0 || recent.len() < self.window {
            return None;
        }
        let ([first, second], a, b) = count_pair(&recent[..self.window])?;
        if a > b {
            Some(Vote::favor(self.name(), second))
        } else if b > a {
            Some(Vote::favor(self.name(), first))
        } else {
            None
        }
    }
}

/// At least `threshold` of the last `window` entries share a label:
/// votes the other label
#[derive(Debug, Clone)]
pub struct StrongMajorityRule {
    pub window: usize,
    pub threshold: usize,
}

impl Named for StrongMajorityRule {
    fn name(&self) -> String {
        format!("strong_majority_{}_of_{}", self.threshold, self.window)
    }
}

impl<T: Symbol> Detector<T> for StrongMajorityRule {
    fn detect(&self, recent: &[T], _rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if self.window == 0 || self.threshold == 0 || recent.len() < self.window {
            return None;
        }
        let ([first, second], a, b) = count_pair(&recent[..self.window])?;
        if a >= self.threshold {
            Some(Vote::favor(self.name(), second))
        } else if b >= self.threshold {
            Some(Vote::favor(self.name(), first))
        } else {
            None
        }
    }
}

/// Majority label over the whole window, trend-following
///
/// An exact tie is settled by the configured policy, so this rule always
/// votes on a non-empty binary window.
#[derive(Debug, Clone, Default)]
pub struct FrequencyRule {
    pub tie_break: TieBreak,
}

impl Named for FrequencyRule {
    fn name(&self) -> String {
        "frequency".to_string()
    }
}

impl<T: Symbol> Detector<T> for FrequencyRule {
    fn detect(&self, recent: &[T], rng: &mut dyn RngCore) -> Option<Vote<T>> {
        if recent.is_empty() {
            return None;
        }
        let ([first, second], a, b) = count_pair(recent)?;
        let label = if a > b {
            first
        } else if b > a {
            second
        } else {
            break_tie(self.tie_break, rng)?
        };
        Some(Vote::favor(self.name(), label))
    }
}
