//! Detection parameters, loadable from and savable to JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::NoiseStats;

/// Errors from loading or validating a [`DetectionConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid detection config: {0}")]
    Invalid(String),

    #[error("config file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the detection threshold is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    /// A fixed pixel value.
    Absolute { value: f64 },
    /// `median + nsigma * stdev` of the background.
    Sigma { nsigma: f64 },
}

impl Threshold {
    /// The pixel value this threshold stands for given the background noise.
    pub fn resolve(&self, noise: &NoiseStats) -> f64 {
        match *self {
            Threshold::Absolute { value } => value,
            Threshold::Sigma { nsigma } => noise.median + nsigma * noise.stdev,
        }
    }
}

/// Parameters of a detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub threshold: Threshold,
    /// Footprints smaller than this are discarded.
    pub npix_min: usize,
    /// Find and cull peaks in every footprint.
    pub find_peaks: bool,
    /// Saddle depth, in units of the noise stdev, that separates two peaks.
    pub nsigma_delta: f64,
    /// Absolute floor below which a peak's saddle level culls it outright.
    pub min_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::Sigma { nsigma: 5.0 },
            npix_min: 1,
            find_peaks: true,
            nsigma_delta: 3.0,
            min_threshold: 0.0,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.threshold {
            Threshold::Absolute { value } if !value.is_finite() => {
                return Err(ConfigError::Invalid(format!(
                    "absolute threshold must be finite, got {value}"
                )));
            }
            Threshold::Sigma { nsigma } if !nsigma.is_finite() => {
                return Err(ConfigError::Invalid(format!(
                    "sigma threshold must be finite, got {nsigma}"
                )));
            }
            _ => {}
        }
        if self.npix_min == 0 {
            return Err(ConfigError::Invalid("npix_min must be at least 1".into()));
        }
        if !self.nsigma_delta.is_finite() || self.nsigma_delta < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "nsigma_delta must be finite and non-negative, got {}",
                self.nsigma_delta
            )));
        }
        if !self.min_threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "min_threshold must be finite, got {}",
                self.min_threshold
            )));
        }
        Ok(())
    }

    /// Save to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file and validate. Missing fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
