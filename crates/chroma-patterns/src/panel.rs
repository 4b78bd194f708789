//! Detector panel: runs a rule list over one channel and settles the votes

use chroma_core::{DetectorConfig, Symbol, Tally, TieBreak};
use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use crate::rules::{
    AlternationRule, FrequencyRule, MinorityRule, PairFlipRule, PeriodicityRule,
    RepeatingPairsRule, StreakRule, StrongMajorityRule, ZigZagRule,
};
use crate::{break_tie, Detector, Named, Vote};

/// Outcome of one panel evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict<T> {
    /// Every vote cast, in detector order
    pub votes: Vec<Vote<T>>,
    /// Net weight per label
    pub tally: Tally<T>,
    /// Winning label, if any label ended with positive weight
    pub pick: Option<T>,
    /// Whether the pick came from the tie-break policy
    pub tie_broken: bool,
}

impl<T: Symbol> Verdict<T> {
    /// Share of the positive vote weight held by the pick
    pub fn share(&self) -> f64 {
        let positive: f64 = self
            .tally
            .entries()
            .iter()
            .map(|(_, w)| w.max(0.0))
            .sum();
        match self.pick {
            Some(label) if positive > 0.0 => self.tally.get(label).max(0.0) / positive,
            _ => 0.0,
        }
    }
}

/// Ordered list of detectors evaluated against one label space
///
/// Detectors are independent: adding one never requires touching the
/// others or the aggregator.
pub struct DetectorPanel<T: Symbol> {
    detectors: Vec<Box<dyn Detector<T>>>,
    tie_break: TieBreak,
}

impl<T: Symbol> DetectorPanel<T> {
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            detectors: Vec::new(),
            tie_break,
        }
    }

    /// The built-in rule list
    ///
    /// Rules that only make sense in a binary space (minority, strong
    /// majority, frequency) abstain on their own when `T` is many-valued.
    pub fn standard(config: &DetectorConfig, tie_break: TieBreak) -> Self {
        let mut panel = Self::new(tie_break)
            .with_detector(StreakRule {
                length: config.streak_length,
            })
            .with_detector(AlternationRule { span: 4 })
            .with_detector(ZigZagRule { span: 5 })
            .with_detector(RepeatingPairsRule)
            .with_detector(AlternationRule { span: 6 })
            .with_detector(PairFlipRule)
            .with_detector(PeriodicityRule {
                max_span: config.periodicity_span,
            });

        for &window in &config.majority_windows {
            panel = panel.with_detector(MinorityRule { window });
        }

        panel
            .with_detector(StrongMajorityRule {
                window: config.strong_majority_window,
                threshold: config.strong_majority_threshold,
            })
            .with_detector(FrequencyRule { tie_break })
    }

    pub fn with_detector(mut self, detector: impl Detector<T> + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector over the newest-first window and settle the votes
    pub fn evaluate(&self, recent: &[T], rng: &mut dyn RngCore) -> Verdict<T> {
        let votes: Vec<Vote<T>> = self
            .detectors
            .iter()
            .filter_map(|d| d.detect(recent, rng))
            .collect();

        let mut tally = Tally::new();
        for vote in &votes {
            tally.add(vote.signal.label(), vote.signal.weight());
        }

        let (pick, tie_broken) = self.settle(&tally, rng);

        debug!(
            "Panel verdict: {} votes, pick {:?}{}",
            votes.len(),
            pick,
            if tie_broken { " (tie-break)" } else { "" }
        );

        Verdict {
            votes,
            tally,
            pick,
            tie_broken,
        }
    }

    fn settle(&self, tally: &Tally<T>, rng: &mut dyn RngCore) -> (Option<T>, bool) {
        let Some((leader, weight)) = tally.leader() else {
            return (None, false);
        };
        if weight <= 0.0 {
            return (None, false);
        }

        // Only binary spaces can tie between exactly two labels; many-valued
        // spaces keep the first-seen leader.
        if tally.leaders().len() == 2 && T::pair().is_some() {
            return (break_tie(self.tie_break, rng), true);
        }
        (Some(leader), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::{Color, Digit, Size};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const R: Color = Color::Red;
    const G: Color = Color::Green;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn test_standard_panel_names() {
        let panel: DetectorPanel<Color> =
            DetectorPanel::standard(&DetectorConfig::default(), TieBreak::Random);
        let names = panel.names();

        assert_eq!(panel.len(), 13);
        assert_eq!(names[0], "streak_3");
        assert!(names.contains(&"minority_20".to_string()));
        assert!(names.contains(&"strong_majority_3_of_4".to_string()));
        assert_eq!(names.last().unwrap(), "frequency");
    }

    #[test]
    fn test_empty_window_has_no_pick() {
        let panel: DetectorPanel<Size> =
            DetectorPanel::standard(&DetectorConfig::default(), TieBreak::First);
        let verdict = panel.evaluate(&[], &mut rng());
        assert!(verdict.votes.is_empty());
        assert!(verdict.pick.is_none());
        assert_eq!(verdict.share(), 0.0);
    }

    #[test]
    fn test_streak_outvotes_frequency() {
        // streak, minority_4 and strong majority vote G; periodicity and frequency vote R
        let panel: DetectorPanel<Color> =
            DetectorPanel::standard(&DetectorConfig::default(), TieBreak::First);
        let verdict = panel.evaluate(&[R, R, R, R], &mut rng());

        assert_eq!(verdict.pick, Some(G));
        assert!(!verdict.tie_broken);
        assert_eq!(verdict.tally.get(G), 3.0);
        assert_eq!(verdict.tally.get(R), 2.0);
        assert_eq!(verdict.share(), 0.6);
    }

    #[test]
    fn test_binary_tie_uses_policy() {
        let panel = DetectorPanel::new(TieBreak::Second)
            .with_detector(StreakRule { length: 2 })
            .with_detector(FrequencyRule {
                tie_break: TieBreak::First,
            });
        // streak -> Big, frequency (all small) -> Small
        let verdict = panel.evaluate(&[Size::Small, Size::Small], &mut rng());

        assert!(verdict.tie_broken);
        assert_eq!(verdict.pick, Some(Size::Big));
    }

    #[test]
    fn test_numeric_avoid_votes_subtract() {
        let panel = DetectorPanel::new(TieBreak::Random)
            .with_detector(StreakRule { length: 3 })
            .with_detector(PeriodicityRule::default());
        let seven = Digit::new(7).unwrap();
        let verdict = panel.evaluate(&[seven, seven, seven], &mut rng());

        // streak avoids 7, periodicity (p = 1) favors 7
        assert_eq!(verdict.votes.len(), 2);
        assert_eq!(verdict.tally.get(seven), 0.0);
        assert!(verdict.pick.is_none());
    }

    #[test]
    fn test_custom_detector_plugs_in() {
        struct AlwaysBig;

        impl Named for AlwaysBig {
            fn name(&self) -> String {
                "always_big".to_string()
            }
        }

        impl Detector<Size> for AlwaysBig {
            fn detect(&self, _recent: &[Size], _rng: &mut dyn RngCore) -> Option<Vote<Size>> {
                Some(Vote::favor(self.name(), Size::Big))
            }
        }

        let panel = DetectorPanel::new(TieBreak::First).with_detector(AlwaysBig);
        let verdict = panel.evaluate(&[Size::Small], &mut rng());
        assert_eq!(verdict.pick, Some(Size::Big));
        assert_eq!(verdict.share(), 1.0);
    }
}
