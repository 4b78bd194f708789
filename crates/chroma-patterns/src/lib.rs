//! # chroma-patterns
//!
//! Pattern detectors for the Chroma prediction engine.
//!
//! This crate provides:
//! - The `Detector` trait: a rule that inspects the newest-first window and
//!   either votes or abstains
//! - The built-in rules (streaks, alternations, repeating pairs, periodicity,
//!   windowed minority, frequency fallback)
//! - `DetectorPanel`, which runs a rule list over one channel and settles
//!   the votes into a `Verdict`

mod detector;
mod panel;
mod rules;

pub use detector::{break_tie, Detector, Named, Signal, Vote};
pub use panel::{DetectorPanel, Verdict};
pub use rules::{
    AlternationRule, FrequencyRule, MinorityRule, PairFlipRule, PeriodicityRule,
    RepeatingPairsRule, StreakRule, StrongMajorityRule, ZigZagRule,
};
