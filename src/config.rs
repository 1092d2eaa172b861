use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Tunables consumed by the analysis core.
///
/// Every knob has a default and can be overridden independently, either in
/// code or from a TOML file. Validation happens before any data is
/// processed; a bad configuration is a hard error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of histogram bins per feature.
    pub num_bins: usize,
    /// Minimum pooled sample count below which a histogram is marked
    /// "insufficient data" instead of being binned.
    pub min_samples: usize,
    /// Longest missing span (in frames) bridged by linear interpolation
    /// during normalization. Longer spans stay missing.
    pub max_gap_frames: usize,
    /// Largest frame gap across which locomotion features may difference
    /// two valid frames. No extrapolation across larger gaps.
    pub max_locomotion_gap: usize,
    /// Distance below which two distributions are classified "same".
    pub same_threshold: f64,
    /// Half-window (in samples) for curvature estimation along a point
    /// sequence; endpoints within the window are invalid.
    pub curvature_window: usize,
    /// Dwelling radius as a fraction of mean body length.
    pub dwell_radius_fraction: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            num_bins: 16,
            min_samples: 20,
            max_gap_frames: 6,
            max_locomotion_gap: 2,
            same_threshold: 0.05,
            curvature_window: 3,
            dwell_radius_fraction: 0.05,
        }
    }
}

impl AnalysisConfig {
    /// Checks every field once, up front.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.num_bins == 0 {
            return Err(AnalysisError::Configuration(
                "num_bins must be at least 1".into(),
            ));
        }
        if self.min_samples == 0 {
            return Err(AnalysisError::Configuration(
                "min_samples must be at least 1".into(),
            ));
        }
        if self.max_locomotion_gap == 0 {
            return Err(AnalysisError::Configuration(
                "max_locomotion_gap must be at least 1".into(),
            ));
        }
        if !(self.same_threshold >= 0.0 && self.same_threshold <= 2.0) {
            return Err(AnalysisError::Configuration(format!(
                "same_threshold must lie in [0, 2], got {}",
                self.same_threshold
            )));
        }
        if self.curvature_window == 0 {
            return Err(AnalysisError::Configuration(
                "curvature_window must be at least 1".into(),
            ));
        }
        if !(self.dwell_radius_fraction > 0.0 && self.dwell_radius_fraction.is_finite()) {
            return Err(AnalysisError::Configuration(format!(
                "dwell_radius_fraction must be a positive finite number, got {}",
                self.dwell_radius_fraction
            )));
        }
        Ok(())
    }

    /// Parses and validates a config from TOML text. Missing keys fall back
    /// to their defaults.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(text).context("failed to parse analysis config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        Self::from_toml_str(&text)
    }
}
