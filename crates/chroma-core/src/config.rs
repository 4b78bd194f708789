//! Configuration management for Chroma
//!
//! This module provides the engine configuration: history capacity, the
//! prediction threshold, aggregator weights, tie-break policy and the
//! parameters of the built-in pattern detectors.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ChromaError, Result};

/// Engine configuration
///
/// Loaded from `.chroma/config.toml` under a root directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// History buffer capacity
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Entries required before a prediction is attempted
    #[serde(default = "default_minimum_entries")]
    pub minimum_entries_for_prediction: usize,

    /// Number of ranked values returned with a prediction
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Values a predicted color or size maps back to
    #[serde(default = "default_candidates_per_projection")]
    pub candidates_per_projection: usize,

    /// Bonus for values matching the last outcome's color and size
    #[serde(default = "default_boost_weight")]
    pub boost_weight: f64,

    /// Seed weight for the statistical fallback
    #[serde(default = "default_base_weight")]
    pub base_weight: f64,

    /// Weight of detector-panel verdicts in the final tally
    #[serde(default = "default_detector_weight")]
    pub detector_weight: f64,

    /// How an exact tie between two binary labels is settled
    #[serde(default)]
    pub tie_break: TieBreak,

    /// Pattern detector parameters
    #[serde(default)]
    pub detectors: DetectorConfig,
}

/// Tie-break policy for two-valued label spaces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Fair coin flip from the injected random source
    #[default]
    Random,
    /// Always the first label of the pair (red, small)
    First,
    /// Always the second label of the pair (green, big)
    Second,
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Random => write!(f, "random"),
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "first" => Ok(Self::First),
            "second" => Ok(Self::Second),
            _ => Err(format!("Invalid tie-break policy: {}", s)),
        }
    }
}

/// Parameters of the built-in detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Identical most-recent entries needed to call a streak
    #[serde(default = "default_streak_length")]
    pub streak_length: usize,

    /// Window sizes for the minority (mean-reversion) rules
    #[serde(default = "default_majority_windows")]
    pub majority_windows: Vec<usize>,

    /// Window of the strong-majority rule
    #[serde(default = "default_strong_majority_window")]
    pub strong_majority_window: usize,

    /// Count within that window that fires the strong-majority rule
    #[serde(default = "default_strong_majority_threshold")]
    pub strong_majority_threshold: usize,

    /// Cap on how many recent entries the periodicity scan covers
    #[serde(default)]
    pub periodicity_span: Option<usize>,
}

// Default value providers
fn default_capacity() -> usize {
    50
}

fn default_minimum_entries() -> usize {
    15
}

fn default_top_k() -> usize {
    2
}

fn default_candidates_per_projection() -> usize {
    3
}

fn default_boost_weight() -> f64 {
    0.25
}

fn default_base_weight() -> f64 {
    0.5
}

fn default_detector_weight() -> f64 {
    0.25
}

fn default_streak_length() -> usize {
    3
}

fn default_majority_windows() -> Vec<usize> {
    vec![4, 5, 10, 20]
}

fn default_strong_majority_window() -> usize {
    4
}

fn default_strong_majority_threshold() -> usize {
    3
}

impl EngineConfig {
    /// Load configuration from `.chroma/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".chroma/config.toml");

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Write default configuration to `.chroma/config.toml`
    pub fn write_default(root: &Path) -> Result<()> {
        let config_dir = root.join(".chroma");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        std::fs::write(&config_path, Self::default().to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject configurations the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ChromaError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.minimum_entries_for_prediction == 0
            || self.minimum_entries_for_prediction > self.capacity
        {
            return Err(ChromaError::InvalidConfig(format!(
                "minimum_entries_for_prediction must be within 1..={}, got {}",
                self.capacity, self.minimum_entries_for_prediction
            )));
        }
        if self.top_k == 0 || self.candidates_per_projection == 0 {
            return Err(ChromaError::InvalidConfig(
                "top_k and candidates_per_projection must be at least 1".to_string(),
            ));
        }
        for (name, weight) in [
            ("boost_weight", self.boost_weight),
            ("base_weight", self.base_weight),
            ("detector_weight", self.detector_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ChromaError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        self.detectors.validate()
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<()> {
        if self.streak_length < 2 {
            return Err(ChromaError::InvalidConfig(
                "detectors.streak_length must be at least 2".to_string(),
            ));
        }
        if self.majority_windows.iter().any(|w| *w == 0) || self.strong_majority_window == 0 {
            return Err(ChromaError::InvalidConfig(
                "detector windows must be at least 1".to_string(),
            ));
        }
        if self.strong_majority_threshold > self.strong_majority_window {
            return Err(ChromaError::InvalidConfig(format!(
                "detectors.strong_majority_threshold ({}) exceeds its window ({})",
                self.strong_majority_threshold, self.strong_majority_window
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            minimum_entries_for_prediction: default_minimum_entries(),
            top_k: default_top_k(),
            candidates_per_projection: default_candidates_per_projection(),
            boost_weight: default_boost_weight(),
            base_weight: default_base_weight(),
            detector_weight: default_detector_weight(),
            tie_break: TieBreak::default(),
            detectors: DetectorConfig::default(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            streak_length: default_streak_length(),
            majority_windows: default_majority_windows(),
            strong_majority_window: default_strong_majority_window(),
            strong_majority_threshold: default_strong_majority_threshold(),
            periodicity_span: None,
        }
    }
}
