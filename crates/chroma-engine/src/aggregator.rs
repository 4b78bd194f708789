//! Weighted aggregation of transition forecasts and detector verdicts

use chroma_core::{Color, Digit, EngineConfig, History, Size, Symbol, Tally};
use chroma_patterns::Verdict;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::transition::{candidates, TransitionForecast};

/// Which signal family the aggregator trusted this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Color,
    Size,
    /// Color and size equally strong, each seeded at half weight
    Both,
    /// No transition evidence on a full window: raw value frequency
    Statistical,
    None,
}

impl std::fmt::Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Color => write!(f, "color"),
            Self::Size => write!(f, "size"),
            Self::Both => write!(f, "both"),
            Self::Statistical => write!(f, "statistical"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Pick the stronger transition signal
///
/// Forecasts are compared by probability, then by support (the number of
/// transitions behind it). Equal on both counts, with positive probability,
/// is `Both`.
pub fn select_preference(
    color: &TransitionForecast<Color>,
    size: &TransitionForecast<Size>,
    window_full: bool,
) -> Preference {
    if color.probability <= 0.0 && size.probability <= 0.0 {
        return if window_full {
            Preference::Statistical
        } else {
            Preference::None
        };
    }

    let by_probability = color
        .probability
        .partial_cmp(&size.probability)
        .unwrap_or(Ordering::Equal);
    match by_probability.then(color.support.cmp(&size.support)) {
        Ordering::Greater => Preference::Color,
        Ordering::Less => Preference::Size,
        Ordering::Equal => Preference::Both,
    }
}

/// Everything the aggregator consumes for one cycle
pub struct Signals<'a> {
    pub history: &'a History,
    pub color: &'a TransitionForecast<Color>,
    pub size: &'a TransitionForecast<Size>,
    pub color_verdict: &'a Verdict<Color>,
    pub size_verdict: &'a Verdict<Size>,
    pub digit_verdict: &'a Verdict<Digit>,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub preference: Preference,
    /// Final weights, first-seen order
    pub tally: Tally<Digit>,
    /// Top-K positively weighted values
    pub values: Vec<Digit>,
}

/// Weighted-vote aggregator
#[derive(Debug, Clone)]
pub struct Aggregator {
    top_k: usize,
    candidates_per_projection: usize,
    boost_weight: f64,
    base_weight: f64,
    detector_weight: f64,
}

impl Aggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            top_k: config.top_k,
            candidates_per_projection: config.candidates_per_projection,
            boost_weight: config.boost_weight,
            base_weight: config.base_weight,
            detector_weight: config.detector_weight,
        }
    }

    pub fn aggregate(&self, signals: &Signals<'_>) -> Aggregation {
        let history = signals.history;
        let preference = select_preference(signals.color, signals.size, history.is_full());
        let mut tally = Tally::new();

        // 1. Seed from the preferred projection
        match preference {
            Preference::Color => self.seed(&mut tally, history, signals.color, 1.0),
            Preference::Size => self.seed(&mut tally, history, signals.size, 1.0),
            Preference::Both => {
                self.seed(&mut tally, history, signals.color, 0.5);
                self.seed(&mut tally, history, signals.size, 0.5);
            }
            Preference::Statistical => {
                let frequency: Tally<Digit> = history.snapshot().iter().map(|o| o.value).collect();
                for digit in frequency.top(self.candidates_per_projection) {
                    tally.add(digit, self.base_weight);
                }
            }
            Preference::None => {}
        }

        // 2. Reward agreement with the single most recent outcome
        if let Some(last) = history.last() {
            let color = Color::project(last.value);
            let size = last.size();
            for digit in Digit::all().filter(|d| color.admits(*d) && size.admits(*d)) {
                tally.add(digit, self.boost_weight);
            }
        }

        // 3. Fold in the detector panels
        self.merge_binary(&mut tally, signals.color_verdict);
        self.merge_binary(&mut tally, signals.size_verdict);
        for &(digit, net) in signals.digit_verdict.tally.entries() {
            if net != 0.0 {
                tally.add(digit, self.detector_weight * net);
            }
        }

        let values = tally
            .ranked()
            .into_iter()
            .filter(|(_, weight)| *weight > 0.0)
            .take(self.top_k)
            .map(|(digit, _)| digit)
            .collect();

        Aggregation {
            preference,
            tally,
            values,
        }
    }

    fn seed<T: Symbol>(
        &self,
        tally: &mut Tally<Digit>,
        history: &History,
        forecast: &TransitionForecast<T>,
        scale: f64,
    ) {
        if let Some(label) = forecast.most_likely {
            for digit in candidates(history, label, self.candidates_per_projection) {
                tally.add(digit, forecast.probability * scale);
            }
        }
    }

    fn merge_binary<T: Symbol>(&self, tally: &mut Tally<Digit>, verdict: &Verdict<T>) {
        if let Some(label) = verdict.pick {
            let weight = self.detector_weight * verdict.share();
            if weight > 0.0 {
                for digit in label.digits() {
                    tally.add(digit, weight);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_core::{Outcome, Period, TieBreak};
    use chroma_patterns::DetectorPanel;

    fn forecast<T>(
        most_likely: Option<T>,
        probability: f64,
        support: usize,
    ) -> TransitionForecast<T> {
        TransitionForecast {
            last: None,
            most_likely,
            probability,
            support,
        }
    }

    fn history(capacity: usize, values: &[i64]) -> History {
        let mut history = History::new(capacity);
        let mut period = Period::initial();
        for v in values {
            history.append(Outcome::new(Digit::new(*v).unwrap(), period.clone()));
            period = period.successor();
        }
        history
    }

    fn empty_verdict<T: Symbol>() -> Verdict<T> {
        Verdict {
            votes: Vec::new(),
            tally: Tally::new(),
            pick: None,
            tie_broken: false,
        }
    }

    fn digits(values: &[Digit]) -> Vec<u8> {
        values.iter().map(|d| d.value()).collect()
    }

    #[test]
    fn test_preference_by_probability() {
        let color = forecast(Some(Color::Red), 0.8, 4);
        let size = forecast(Some(Size::Big), 0.6, 9);
        assert_eq!(select_preference(&color, &size, false), Preference::Color);
        assert_eq!(
            select_preference(&forecast(None, 0.0, 0), &size, false),
            Preference::Size
        );
    }

    #[test]
    fn test_preference_equal_probability_uses_support() {
        let color = forecast(Some(Color::Green), 1.0, 4);
        let size = forecast(Some(Size::Big), 1.0, 2);
        assert_eq!(select_preference(&color, &size, false), Preference::Color);

        let size = forecast(Some(Size::Big), 1.0, 4);
        assert_eq!(select_preference(&color, &size, false), Preference::Both);
    }

    #[test]
    fn test_preference_fallbacks() {
        let color: TransitionForecast<Color> = forecast(None, 0.0, 0);
        let size: TransitionForecast<Size> = forecast(None, 0.0, 0);
        assert_eq!(
            select_preference(&color, &size, true),
            Preference::Statistical
        );
        assert_eq!(select_preference(&color, &size, false), Preference::None);
    }

    #[test]
    fn test_color_seed_and_boost() {
        let config = EngineConfig {
            detector_weight: 0.0,
            ..EngineConfig::default()
        };
        // Greens only: 1 1 3 3 3 9
        let h = history(50, &[1, 1, 3, 3, 3, 9]);
        let color = forecast(Some(Color::Green), 1.0, 5);
        let size = forecast(Some(Size::Small), 0.5, 4);

        let aggregation = Aggregator::new(&config).aggregate(&Signals {
            history: &h,
            color: &color,
            size: &size,
            color_verdict: &empty_verdict(),
            size_verdict: &empty_verdict(),
            digit_verdict: &empty_verdict(),
        });

        assert_eq!(aggregation.preference, Preference::Color);
        // seeds: 3, 1, 9 at 1.0; last is 9 (big green) so 5, 7, 9 get +0.25
        let nine = Digit::new(9).unwrap();
        assert_eq!(aggregation.tally.get(nine), 1.25);
        assert_eq!(digits(&aggregation.values), vec![9, 3]);
    }

    #[test]
    fn test_statistical_seed_on_full_window() {
        let config = EngineConfig {
            top_k: 1,
            boost_weight: 0.0,
            detector_weight: 0.0,
            ..EngineConfig::default()
        };
        let h = history(4, &[2, 2, 7, 4]);
        let none_c: TransitionForecast<Color> = forecast(None, 0.0, 0);
        let none_s: TransitionForecast<Size> = forecast(None, 0.0, 0);

        let aggregation = Aggregator::new(&config).aggregate(&Signals {
            history: &h,
            color: &none_c,
            size: &none_s,
            color_verdict: &empty_verdict(),
            size_verdict: &empty_verdict(),
            digit_verdict: &empty_verdict(),
        });

        assert_eq!(aggregation.preference, Preference::Statistical);
        assert_eq!(digits(&aggregation.values), vec![2]);
    }

    #[test]
    fn test_none_preference_ranks_boost_in_ascending_order() {
        let config = EngineConfig {
            top_k: 3,
            detector_weight: 0.0,
            ..EngineConfig::default()
        };
        let h = history(50, &[4]);
        let none_c: TransitionForecast<Color> = forecast(None, 0.0, 0);
        let none_s: TransitionForecast<Size> = forecast(None, 0.0, 0);

        let aggregation = Aggregator::new(&config).aggregate(&Signals {
            history: &h,
            color: &none_c,
            size: &none_s,
            color_verdict: &empty_verdict(),
            size_verdict: &empty_verdict(),
            digit_verdict: &empty_verdict(),
        });

        assert_eq!(aggregation.preference, Preference::None);
        assert_eq!(digits(&aggregation.values), vec![0, 2, 4]);
    }

    #[test]
    fn test_detector_verdicts_shift_ranking() {
        let config = EngineConfig {
            top_k: 1,
            boost_weight: 0.0,
            detector_weight: 1.0,
            ..EngineConfig::default()
        };
        let h = history(50, &[6, 6, 6]);
        let color = forecast(Some(Color::Red), 1.0, 2);
        let size = forecast(Some(Size::Big), 1.0, 2);

        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let digit_panel: DetectorPanel<Digit> =
            DetectorPanel::standard(&config.detectors, TieBreak::First);
        let digit_verdict = digit_panel.evaluate(&h.newest_first::<Digit>(), &mut rng);

        let aggregation = Aggregator::new(&config).aggregate(&Signals {
            history: &h,
            color: &color,
            size: &size,
            color_verdict: &empty_verdict(),
            size_verdict: &empty_verdict(),
            digit_verdict: &digit_verdict,
        });

        // The streak avoids 6 while periodicity favors it: net zero
        assert_eq!(aggregation.preference, Preference::Both);
        let six = Digit::new(6).unwrap();
        assert_eq!(aggregation.tally.get(six), 1.0);
        assert_eq!(digits(&aggregation.values), vec![6]);
    }
}
