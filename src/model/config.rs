//! Background model configuration.
//!
//! All parameters are consumed at construction and never re-read per
//! frame. Each algorithm variant carries the defaults it was published
//! with, so swapping variants does not silently reuse another
//! variant's tuning.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::video::SceneConfig;

/// The mixture-model variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Stauffer/Grimson adaptive mixture model.
    #[serde(rename = "grimson")]
    Grimson,
    /// Zivkovic adaptive mixture with bias-driven mode pruning.
    #[serde(rename = "zivkovic")]
    Zivkovic,
    /// Type-2 fuzzy mixture, uncertain-mean membership.
    #[serde(rename = "fuzzy-um")]
    FuzzyUncertainMean,
    /// Type-2 fuzzy mixture, uncertain-variance membership.
    #[serde(rename = "fuzzy-uv")]
    FuzzyUncertainVariance,
}

impl Algorithm {
    /// Whether this variant drops components whose weight falls below
    /// zero after the per-frame decay.
    pub fn prunes_negative_weights(self) -> bool {
        !matches!(self, Algorithm::Grimson)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Algorithm::Grimson => "grimson",
            Algorithm::Zivkovic => "zivkovic",
            Algorithm::FuzzyUncertainMean => "fuzzy-um",
            Algorithm::FuzzyUncertainVariance => "fuzzy-uv",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grimson" => Ok(Algorithm::Grimson),
            "zivkovic" => Ok(Algorithm::Zivkovic),
            "fuzzy-um" => Ok(Algorithm::FuzzyUncertainMean),
            "fuzzy-uv" => Ok(Algorithm::FuzzyUncertainVariance),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Configuration for a per-pixel mixture background model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Algorithm variant.
    pub algorithm: Algorithm,
    /// Maximum live modes per pixel (`K`).
    pub max_modes: usize,
    /// Learning rate in `[0, 1]`.
    pub alpha: f64,
    /// Match sensitivity; multiplies the strategy's gate scale.
    pub variance_threshold: f64,
    /// Seed variance for newly created modes.
    pub default_variance: f64,
    /// Cumulative-weight cutoff separating background-capable modes.
    pub background_threshold: f64,
    /// Constant weight drain per frame (Zivkovic); zero elsewhere.
    pub bias: f64,
    /// Uncertainty factor `k` for the fuzzy membership functions.
    pub uncertainty: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::zivkovic()
    }
}

impl ModelConfig {
    /// Stauffer/Grimson defaults.
    pub fn grimson() -> Self {
        Self {
            algorithm: Algorithm::Grimson,
            max_modes: 3,
            alpha: 0.005,
            variance_threshold: 16.0,
            default_variance: 50.0,
            background_threshold: 0.7,
            bias: 0.0,
            uncertainty: 2.5,
        }
    }

    /// Zivkovic defaults.
    pub fn zivkovic() -> Self {
        Self {
            algorithm: Algorithm::Zivkovic,
            max_modes: 4,
            alpha: 0.005,
            variance_threshold: 15.0,
            default_variance: 16.0,
            background_threshold: 0.7,
            bias: 0.05,
            uncertainty: 2.5,
        }
    }

    /// Fuzzy uncertain-mean defaults.
    pub fn fuzzy_uncertain_mean() -> Self {
        Self {
            algorithm: Algorithm::FuzzyUncertainMean,
            max_modes: 4,
            alpha: 0.005,
            variance_threshold: 2.5,
            default_variance: 16.0,
            background_threshold: 0.7,
            bias: 0.0,
            uncertainty: 2.5,
        }
    }

    /// Fuzzy uncertain-variance defaults.
    pub fn fuzzy_uncertain_variance() -> Self {
        Self {
            uncertainty: 1.5,
            algorithm: Algorithm::FuzzyUncertainVariance,
            ..Self::fuzzy_uncertain_mean()
        }
    }

    /// Returns the published defaults for the given variant.
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Grimson => Self::grimson(),
            Algorithm::Zivkovic => Self::zivkovic(),
            Algorithm::FuzzyUncertainMean => Self::fuzzy_uncertain_mean(),
            Algorithm::FuzzyUncertainVariance => Self::fuzzy_uncertain_variance(),
        }
    }

    /// Validates the configuration parameters.
    ///
    /// Invalid parameters are programmer errors; construction fails
    /// fast and nothing is coerced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_modes == 0 {
            return Err(ConfigError::ZeroModes);
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::AlphaOutOfRange(self.alpha));
        }
        if self.variance_threshold <= 0.0 {
            return Err(ConfigError::NonPositiveVarianceThreshold(
                self.variance_threshold,
            ));
        }
        if self.default_variance <= 0.0 {
            return Err(ConfigError::NonPositiveVariance(self.default_variance));
        }
        if !(self.background_threshold > 0.0 && self.background_threshold <= 1.0) {
            return Err(ConfigError::BackgroundThresholdOutOfRange(
                self.background_threshold,
            ));
        }
        if self.bias < 0.0 {
            return Err(ConfigError::NegativeBias(self.bias));
        }
        if self.uncertainty <= 0.0 {
            return Err(ConfigError::NonPositiveUncertainty(self.uncertainty));
        }
        Ok(())
    }
}

/// Configuration validation and loading errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("max_modes must be at least 1")]
    ZeroModes,
    #[error("learning rate must be in [0, 1], got {0}")]
    AlphaOutOfRange(f64),
    #[error("variance threshold must be positive, got {0}")]
    NonPositiveVarianceThreshold(f64),
    #[error("default variance must be positive, got {0}")]
    NonPositiveVariance(f64),
    #[error("background threshold must be in (0, 1], got {0}")]
    BackgroundThresholdOutOfRange(f64),
    #[error("bias must be non-negative, got {0}")]
    NegativeBias(f64),
    #[error("uncertainty factor must be positive, got {0}")]
    NonPositiveUncertainty(f64),
    #[error("unknown algorithm: {0} (expected grimson, zivkovic, fuzzy-um or fuzzy-uv)")]
    UnknownAlgorithm(String),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Demo run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of frames to process.
    pub frames: u64,
    /// Log mask statistics every this many frames.
    pub log_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            log_every: 25,
        }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Background model parameters.
    #[serde(default)]
    pub model: ModelConfig,
    /// Synthetic scene description for the demo binary.
    #[serde(default)]
    pub scene: SceneConfig,
    /// Demo run settings.
    #[serde(default)]
    pub run: RunConfig,
}

impl FileConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.model.validate()?;
        Ok(config)
    }
}
