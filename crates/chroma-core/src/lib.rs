//! # chroma-core
//!
//! Core types for the Chroma outcome prediction engine.
//!
//! Every outcome is a digit 0-9 whose color and size are derived from the
//! digit itself, never stored alongside it.
//!
//! ## Core Paradigm
//!
//! - Outcomes ARE digits (color and size are projections, recomputed on read)
//! - History IS a bounded FIFO window (oldest evicted first)
//! - Votes ARE weights in an insertion-ordered tally
//! - Configuration IS a single TOML file with defaults for every field

mod config;
mod error;
mod history;
mod tally;
mod types;

pub use config::{DetectorConfig, EngineConfig, TieBreak};
pub use error::{ChromaError, Result};
pub use history::History;
pub use tally::Tally;
pub use types::*;
