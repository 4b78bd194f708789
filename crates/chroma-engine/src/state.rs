//! Pure state machine for engine gating
//!
//! This module implements the engine lifecycle as a pure function with NO I/O.
//!
//! Key design principles:
//! - Pure function: on_append(state, len, minimum) -> (state, actions)
//! - `Predicting` is sticky: eviction only happens once the window is past
//!   capacity, which is never below the minimum
//! - The facade executes the returned actions

use serde::{Deserialize, Serialize};

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EngineState {
    /// Nothing submitted yet
    #[default]
    Empty,
    /// Below the prediction threshold
    Collecting { have: usize, need: usize },
    /// Threshold reached; every append recomputes the prediction
    Predicting,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Collecting { have, need } => write!(f, "collecting ({}/{})", have, need),
            Self::Predicting => write!(f, "predicting"),
        }
    }
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Rerun detectors, transition model and aggregator
    Predict,
    /// Log a lifecycle change
    Announce { message: String },
}

/// State after an append that left the window holding `len` entries
pub fn on_append(state: EngineState, len: usize, minimum: usize) -> (EngineState, Vec<Action>) {
    match state {
        EngineState::Predicting => (EngineState::Predicting, vec![Action::Predict]),

        EngineState::Empty | EngineState::Collecting { .. } if len >= minimum => (
            EngineState::Predicting,
            vec![
                Action::Announce {
                    message: format!("Prediction threshold reached with {} entries", len),
                },
                Action::Predict,
            ],
        ),

        EngineState::Empty => (
            EngineState::Collecting {
                have: len,
                need: minimum,
            },
            vec![Action::Announce {
                message: format!("Collecting outcomes: need {} before predicting", minimum),
            }],
        ),

        EngineState::Collecting { .. } => (
            EngineState::Collecting {
                have: len,
                need: minimum,
            },
            Vec::new(),
        ),
    }
}
