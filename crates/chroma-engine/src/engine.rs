//! Engine facade
//!
//! Owns the history buffer, the three detector panels and the random
//! source. Every accepted outcome runs the whole pipeline to completion
//! before `append` returns.

use chroma_core::{Color, Digit, EngineConfig, History, Outcome, Period, Result, Size};
use chroma_patterns::{DetectorPanel, Verdict};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, Preference, Signals};
use crate::analysis::Analysis;
use crate::state::{on_append, Action, EngineState};
use crate::transition::{self, TransitionForecast};

/// Latest prediction, replaced wholesale on every cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Top-K values, strongest first
    pub values: Vec<Digit>,
    /// Signal family that seeded the tally
    pub basis: Preference,
    /// Every weighted value, strongest first
    pub ranking: Vec<(Digit, f64)>,
    pub color_transition: TransitionForecast<Color>,
    pub size_transition: TransitionForecast<Size>,
    pub color_verdict: Verdict<Color>,
    pub size_verdict: Verdict<Size>,
    pub digit_verdict: Verdict<Digit>,
    /// Window length the prediction was computed over
    pub window: usize,
}

impl Prediction {
    /// Color the detectors settled on
    pub fn color(&self) -> Option<Color> {
        self.color_verdict.pick
    }

    /// Size the detectors settled on
    pub fn size(&self) -> Option<Size> {
        self.size_verdict.pick
    }

    /// One-line summary, e.g. `color: 3, 7`
    pub fn headline(&self) -> String {
        let values: Vec<String> = self.values.iter().map(|d| d.to_string()).collect();
        format!("{}: {}", self.basis, values.join(", "))
    }
}

/// What happened to a batch of submitted values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReport {
    pub accepted: usize,
    /// Reason each dropped value was rejected
    pub rejected: Vec<String>,
    /// Token to hand to the next submission
    pub next_period: Period,
}

/// Prediction engine for one session
pub struct Engine<R: RngCore = StdRng> {
    config: EngineConfig,
    history: History,
    color_panel: DetectorPanel<Color>,
    size_panel: DetectorPanel<Size>,
    digit_panel: DetectorPanel<Digit>,
    aggregator: Aggregator,
    state: EngineState,
    prediction: Option<Prediction>,
    rng: R,
}

impl Engine<StdRng> {
    /// Engine with an entropy-seeded random source
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Engine whose random tie-breaks are reproducible
    pub fn seeded(config: EngineConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> Engine<R> {
    /// Engine with an injected random source
    pub fn with_rng(config: EngineConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history: History::new(config.capacity),
            color_panel: DetectorPanel::standard(&config.detectors, config.tie_break),
            size_panel: DetectorPanel::standard(&config.detectors, config.tie_break),
            digit_panel: DetectorPanel::standard(&config.detectors, config.tie_break),
            aggregator: Aggregator::new(&config),
            state: EngineState::Empty,
            prediction: None,
            config,
            rng,
        })
    }

    /// Append one outcome and rerun the pipeline if predicting
    pub fn append(&mut self, outcome: Outcome) {
        let evicted = self.history.append(outcome);
        if !evicted.is_empty() {
            debug!("Evicted {} outcome(s) from history", evicted.len());
        }

        let (state, actions) = on_append(
            self.state,
            self.history.size(),
            self.config.minimum_entries_for_prediction,
        );
        self.state = state;

        for action in actions {
            match action {
                Action::Predict => {
                    let prediction = self.compute();
                    self.prediction = Some(prediction);
                }
                Action::Announce { message } => info!("{}", message),
            }
        }
    }

    /// Submit raw integers; values outside 0-9 are dropped
    ///
    /// Accepted values get sequential period tokens starting at
    /// `starting_period` and are appended in order.
    pub fn submit(&mut self, raw: &[i64], starting_period: Period) -> SubmitReport {
        self.accept(raw.iter().map(|v| Digit::new(*v)), starting_period)
    }

    /// Submit free text; tokens are separated by whitespace or commas and
    /// anything that is not an integer in 0-9 is dropped
    pub fn submit_text(&mut self, text: &str, starting_period: Period) -> SubmitReport {
        let tokens = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty());
        self.accept(tokens.map(Digit::parse), starting_period)
    }

    fn accept(
        &mut self,
        values: impl Iterator<Item = Result<Digit>>,
        starting_period: Period,
    ) -> SubmitReport {
        let mut report = SubmitReport {
            accepted: 0,
            rejected: Vec::new(),
            next_period: starting_period,
        };

        for value in values {
            match value {
                Ok(digit) => {
                    let period = report.next_period.clone();
                    report.next_period = period.successor();
                    self.append(Outcome::new(digit, period));
                    report.accepted += 1;
                }
                Err(e) => {
                    warn!("Dropping submitted value: {}", e);
                    report.rejected.push(e.to_string());
                }
            }
        }

        report
    }

    /// Latest prediction; `None` until the minimum history is reached
    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    /// Per-value diagnostic view of the current window
    pub fn analysis(&self) -> Analysis {
        Analysis::build(&self.history)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn compute(&mut self) -> Prediction {
        let (_, color_transition) = transition::model::<Color>(&self.history);
        let (_, size_transition) = transition::model::<Size>(&self.history);

        let color_verdict = self
            .color_panel
            .evaluate(&self.history.newest_first::<Color>(), &mut self.rng);
        let size_verdict = self
            .size_panel
            .evaluate(&self.history.newest_first::<Size>(), &mut self.rng);
        let digit_verdict = self
            .digit_panel
            .evaluate(&self.history.newest_first::<Digit>(), &mut self.rng);

        let aggregation = self.aggregator.aggregate(&Signals {
            history: &self.history,
            color: &color_transition,
            size: &size_transition,
            color_verdict: &color_verdict,
            size_verdict: &size_verdict,
            digit_verdict: &digit_verdict,
        });

        let prediction = Prediction {
            ranking: aggregation.tally.ranked(),
            values: aggregation.values,
            basis: aggregation.preference,
            color_transition,
            size_transition,
            color_verdict,
            size_verdict,
            digit_verdict,
            window: self.history.size(),
        };

        debug!(
            "Prediction over {} entries: {} (color p={:.2}, size p={:.2})",
            prediction.window,
            prediction.headline(),
            prediction.color_transition.probability,
            prediction.size_transition.probability
        );

        prediction
    }
}
