//! Detector contract and vote types

use chroma_core::{Symbol, TieBreak};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Direction of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum Signal<T> {
    /// The label is expected next
    Favor(T),
    /// The label is expected NOT to come next
    Avoid(T),
}

impl<T: Copy> Signal<T> {
    pub fn label(&self) -> T {
        match self {
            Self::Favor(label) | Self::Avoid(label) => *label,
        }
    }

    /// Contribution of one unit of weight to the label's tally
    pub fn weight(&self) -> f64 {
        match self {
            Self::Favor(_) => 1.0,
            Self::Avoid(_) => -1.0,
        }
    }
}

/// A detector's opinion about the next label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote<T> {
    /// Name of the detector that cast it
    pub detector: String,
    pub signal: Signal<T>,
}

impl<T> Vote<T> {
    pub fn favor(detector: impl Into<String>, label: T) -> Self {
        Self {
            detector: detector.into(),
            signal: Signal::Favor(label),
        }
    }

    pub fn avoid(detector: impl Into<String>, label: T) -> Self {
        Self {
            detector: detector.into(),
            signal: Signal::Avoid(label),
        }
    }
}

/// Stable identifier a detector signs its votes with
///
/// Kept apart from `Detector<T>` so a rule has one name whatever label
/// space it runs on.
pub trait Named {
    fn name(&self) -> String;
}

/// A pattern rule over a projected window
///
/// `recent` is newest-first: index 0 is the most recent entry. Detectors
/// never fail; "no opinion" is `None`. The random source is only consulted
/// by rules with an explicit random tie-break.
pub trait Detector<T: Symbol>: Named {
    fn detect(&self, recent: &[T], rng: &mut dyn RngCore) -> Option<Vote<T>>;
}

/// Settle an exact tie between the two labels of a binary space
///
/// Returns `None` only for label spaces that are not binary.
pub fn break_tie<T: Symbol>(policy: TieBreak, rng: &mut dyn RngCore) -> Option<T> {
    let [first, second] = T::pair()?;
    Some(match policy {
        TieBreak::First => first,
        TieBreak::Second => second,
        TieBreak::Random => {
            if rng.gen_bool(0.5) {
                first
            } else {
                second
            }
        }
    })
}

/// Count the two labels of a binary space in a window
pub(crate) fn count_pair<T: Symbol>(window: &[T]) -> Option<([T; 2], usize, usize)> {
    let [first, second] = T::pair()?;
    let a = window.iter().filter(|l| **l == first).count();
    let b = window.iter().filter(|l| **l == second).count();
    Some(([first, second], a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::{Color, Digit, Size};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_break_tie_fixed_policies() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(
            break_tie::<Color>(TieBreak::First, &mut rng),
            Some(Color::Red)
        );
        assert_eq!(
            break_tie::<Color>(TieBreak::Second, &mut rng),
            Some(Color::Green)
        );
        assert_eq!(
            break_tie::<Size>(TieBreak::First, &mut rng),
            Some(Size::Small)
        );
        assert_eq!(break_tie::<Digit>(TieBreak::First, &mut rng), None);
    }

    #[test]
    fn test_break_tie_random_is_seeded() {
        let draws = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..64)
                .map(|_| break_tie::<Size>(TieBreak::Random, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draws(42), draws(42));
        let all = draws(42);
        assert!(all.contains(&Size::Small) && all.contains(&Size::Big));
    }

    #[test]
    fn test_signal_weight() {
        assert_eq!(Signal::Favor(Size::Big).weight(), 1.0);
        assert_eq!(Signal::Avoid(Size::Big).weight(), -1.0);
        assert_eq!(Signal::Avoid(Size::Big).label(), Size::Big);
    }
}
