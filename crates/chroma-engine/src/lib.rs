//! # chroma-engine
//!
//! Prediction pipeline for the Chroma outcome stream.
//!
//! This crate provides:
//! - First-order transition tables over the color and size projections
//! - The weighted-vote aggregator and its preference rule
//! - A pure state machine gating predictions on a minimum history length
//! - The `Engine` facade: submit outcomes, read the prediction and analysis

mod aggregator;
mod analysis;
mod engine;
mod state;
mod transition;

pub use aggregator::{select_preference, Aggregation, Aggregator, Preference, Signals};
pub use analysis::{
    Analysis, Axis, ColorRun, Distribution, Follower, Trend, ValueAnalysis, MAX_RUN_COLUMNS,
};
pub use engine::{Engine, Prediction, SubmitReport};
pub use state::{on_append, Action, EngineState};
pub use transition::{candidates, model, TransitionForecast, TransitionTable};
