//! Diagnostic per-value analysis of the history window
//!
//! Independent of the main prediction: groups every occurrence of each
//! digit and records what followed it, and summarises the window as
//! color runs, a label distribution and a simple majority trend.

use chroma_core::{Color, Digit, History, Outcome, Period, Size, Symbol, Tally};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of color runs kept, newest last
pub const MAX_RUN_COLUMNS: usize = 20;

/// Number of most frequent digits reported by the trend
pub const TREND_TOP_VALUES: usize = 2;

/// The outcome that came right after an occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follower {
    pub value: Digit,
    pub period: Period,
    pub color: Color,
    pub size: Size,
}

impl From<&Outcome> for Follower {
    fn from(outcome: &Outcome) -> Self {
        Self {
            value: outcome.value,
            period: outcome.period.clone(),
            color: outcome.color(),
            size: outcome.size(),
        }
    }
}

/// History of one digit within the window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueAnalysis {
    /// Periods at which the digit occurred, oldest first
    pub occurrences: Vec<Period>,
    /// What followed each occurrence (the newest occurrence may have none)
    pub followers: Vec<Follower>,
    /// Most common base color among followers
    pub next_color: Option<Color>,
    /// Most common size among followers
    pub next_size: Option<Size>,
}

/// Consecutive outcomes sharing a base color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRun {
    pub color: Color,
    pub values: Vec<Digit>,
}

/// Label counts over the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Per color label, dual labels kept distinct, first-seen order
    pub colors: Tally<Color>,
    pub sizes: Tally<Size>,
    /// Count of each digit 0-9
    pub digits: [usize; 10],
}

/// Axis with the larger imbalance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Color,
    Size,
}

/// Majority summary of the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    /// Red only when red strictly outnumbers green
    pub color: Color,
    /// Big only when big strictly outnumbers small
    pub size: Size,
    /// Color when its imbalance is strictly larger, size otherwise
    pub dominant: Axis,
    pub top_values: Vec<Digit>,
}

/// Full diagnostic view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub values: BTreeMap<Digit, ValueAnalysis>,
    pub runs: Vec<ColorRun>,
    pub distribution: Distribution,
    pub trend: Option<Trend>,
}

impl Analysis {
    pub fn build(history: &History) -> Self {
        Self {
            values: per_value(history),
            runs: color_runs(history),
            distribution: distribution(history),
            trend: trend(history),
        }
    }
}

fn per_value(history: &History) -> BTreeMap<Digit, ValueAnalysis> {
    let entries = history.snapshot();
    let mut values: BTreeMap<Digit, ValueAnalysis> = BTreeMap::new();

    for (i, outcome) in entries.iter().enumerate() {
        let analysis = values.entry(outcome.value).or_default();
        analysis.occurrences.push(outcome.period.clone());
        if let Some(next) = entries.get(i + 1) {
            analysis.followers.push(Follower::from(next));
        }
    }

    for analysis in values.values_mut() {
        let colors: Tally<Color> = analysis.followers.iter().map(|f| f.color.base()).collect();
        let sizes: Tally<Size> = analysis.followers.iter().map(|f| f.size).collect();
        analysis.next_color = colors.leader().map(|(c, _)| c);
        analysis.next_size = sizes.leader().map(|(s, _)| s);
    }

    values
}

fn color_runs(history: &History) -> Vec<ColorRun> {
    let mut runs: Vec<ColorRun> = Vec::new();
    for outcome in history.snapshot() {
        let color = Color::project(outcome.value);
        match runs.last_mut() {
            Some(run) if run.color == color => run.values.push(outcome.value),
            _ => runs.push(ColorRun {
                color,
                values: vec![outcome.value],
            }),
        }
    }
    if runs.len() > MAX_RUN_COLUMNS {
        runs.drain(..runs.len() - MAX_RUN_COLUMNS);
    }
    runs
}

fn distribution(history: &History) -> Distribution {
    let mut digits = [0usize; 10];
    for outcome in history.snapshot() {
        digits[outcome.value.value() as usize] += 1;
    }
    Distribution {
        colors: history.snapshot().iter().map(|o| o.color()).collect(),
        sizes: history.snapshot().iter().map(|o| o.size()).collect(),
        digits,
    }
}

fn trend(history: &History) -> Option<Trend> {
    if history.is_empty() {
        return None;
    }
    let colors: Vec<Color> = history.chronological();
    let sizes: Vec<Size> = history.chronological();

    let red = colors.iter().filter(|c| **c == Color::Red).count() as i64;
    let green = colors.len() as i64 - red;
    let big = sizes.iter().filter(|s| **s == Size::Big).count() as i64;
    let small = sizes.len() as i64 - big;

    // Digits ascending with stable sort: equal counts favor the lower digit
    let mut counts: Vec<(Digit, usize)> = Digit::all()
        .map(|d| {
            let count = history.snapshot().iter().filter(|o| o.value == d).count();
            (d, count)
        })
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    Some(Trend {
        color: if red > green {
            Color::Red
        } else {
            Color::Green
        },
        size: if big > small { Size::Big } else { Size::Small },
        dominant: if (red - green).abs() > (big - small).abs() {
            Axis::Color
        } else {
            Axis::Size
        },
        top_values: counts
            .into_iter()
            .take(TREND_TOP_VALUES)
            .map(|(d, _)| d)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(values: &[i64]) -> History {
        let mut history = History::new(50);
        let mut period = Period::new("001");
        for v in values {
            history.append(Outcome::new(Digit::new(*v).unwrap(), period.clone()));
            period = period.successor();
        }
        history
    }

    fn d(v: i64) -> Digit {
        Digit::new(v).unwrap()
    }

    #[test]
    fn test_per_value_followers() {
        let analysis = Analysis::build(&history(&[3, 8, 3, 1, 3]));
        let three = &analysis.values[&d(3)];

        let periods: Vec<&str> = three.occurrences.iter().map(|p| p.as_str()).collect();
        assert_eq!(periods, vec!["001", "003", "005"]);

        let followers: Vec<u8> = three.followers.iter().map(|f| f.value.value()).collect();
        assert_eq!(followers, vec![8, 1]);
        assert_eq!(three.followers[0].color, Color::Red);
        assert_eq!(three.followers[0].size, Size::Big);

        // red (8) first-seen, then green (1): tie keeps red
        assert_eq!(three.next_color, Some(Color::Red));
        assert_eq!(three.next_size, Some(Size::Big));

        let one = &analysis.values[&d(1)];
        assert_eq!(one.next_color, Some(Color::Green));
        assert!(!analysis.values.contains_key(&d(7)));
    }

    #[test]
    fn test_newest_value_has_no_follower() {
        let analysis = Analysis::build(&history(&[4]));
        let four = &analysis.values[&d(4)];
        assert!(four.followers.is_empty());
        assert_eq!(four.next_color, None);
    }

    #[test]
    fn test_next_color_uses_base_color() {
        // 0 and 5 follow 2: red+purple and green+purple
        let analysis = Analysis::build(&history(&[2, 0, 2, 0, 2, 5]));
        assert_eq!(analysis.values[&d(2)].next_color, Some(Color::Red));
    }

    #[test]
    fn test_color_runs() {
        let analysis = Analysis::build(&history(&[0, 2, 1, 3, 5, 6]));
        let shape: Vec<(Color, usize)> = analysis
            .runs
            .iter()
            .map(|r| (r.color, r.values.len()))
            .collect();
        assert_eq!(
            shape,
            vec![(Color::Red, 2), (Color::Green, 3), (Color::Red, 1)]
        );
    }

    #[test]
    fn test_color_runs_capped() {
        let alternating: Vec<i64> = (0..30).map(|i| i % 2).collect();
        let analysis = Analysis::build(&history(&alternating));
        assert_eq!(analysis.runs.len(), MAX_RUN_COLUMNS);
        // Oldest columns dropped: the newest run is the last value (1, green)
        assert_eq!(analysis.runs.last().unwrap().color, Color::Green);
    }

    #[test]
    fn test_distribution_keeps_dual_labels() {
        let analysis = Analysis::build(&history(&[0, 2, 5, 5, 9]));
        let dist = &analysis.distribution;
        assert_eq!(dist.colors.get(Color::RedPurple), 1.0);
        assert_eq!(dist.colors.get(Color::Red), 1.0);
        assert_eq!(dist.colors.get(Color::GreenPurple), 2.0);
        assert_eq!(dist.sizes.get(Size::Big), 3.0);
        assert_eq!(dist.digits[5], 2);
    }

    #[test]
    fn test_trend() {
        let trend = Analysis::build(&history(&[2, 4, 4, 6, 1, 8])).trend.unwrap();
        // red 5 vs green 1 (imbalance 4); small 4 vs big 2 (imbalance 2)
        assert_eq!(trend.color, Color::Red);
        assert_eq!(trend.size, Size::Small);
        assert_eq!(trend.dominant, Axis::Color);
        let top: Vec<u8> = trend.top_values.iter().map(|d| d.value()).collect();
        assert_eq!(top, vec![4, 1]);
    }

    #[test]
    fn test_empty_history() {
        let analysis = Analysis::build(&History::new(10));
        assert!(analysis.values.is_empty());
        assert!(analysis.runs.is_empty());
        assert!(analysis.trend.is_none());
    }
}
