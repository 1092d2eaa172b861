//! Binned empirical distributions of feature samples, pooled across the
//! recordings of one experimental group.

pub mod comparison;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::features::{Feature, FeatureSet};
use crate::geometry;

/// A built histogram. Edges are strictly increasing, `counts.len() + 1 ==
/// edges.len()`, and all bins are right half-open except the last, which
/// is closed, so every sample lands in exactly one bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub feature: Feature,
    pub circular: bool,
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    pub num_samples: u64,
    /// Mean of each source recording's valid samples (NaN where a
    /// recording contributed none). Circular features use the circular
    /// mean.
    pub mean_per_recording: Vec<f64>,
    pub std_per_recording: Vec<f64>,
}

impl Histogram {
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_midpoints(&self) -> Vec<f64> {
        self.edges.windows(2).map(|e| (e[0] + e[1]) / 2.0).collect()
    }

    /// Probability mass per bin; `None` when the histogram is empty.
    pub fn pdf(&self) -> Option<Vec<f64>> {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return None;
        }
        Some(
            self.counts
                .iter()
                .map(|c| *c as f64 / total as f64)
                .collect(),
        )
    }
}

/// Build result: either a usable histogram or a typed "insufficient data"
/// marker, never misleading bins over a handful of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureHistogram {
    Binned(Histogram),
    Insufficient {
        feature: Feature,
        circular: bool,
        num_samples: u64,
    },
}

impl FeatureHistogram {
    pub fn feature(&self) -> Feature {
        match self {
            FeatureHistogram::Binned(h) => h.feature,
            FeatureHistogram::Insufficient { feature, .. } => *feature,
        }
    }

    pub fn circular(&self) -> bool {
        match self {
            FeatureHistogram::Binned(h) => h.circular,
            FeatureHistogram::Insufficient { circular, .. } => *circular,
        }
    }

    pub fn num_samples(&self) -> u64 {
        match self {
            FeatureHistogram::Binned(h) => h.num_samples,
            FeatureHistogram::Insufficient { num_samples, .. } => *num_samples,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        matches!(self, FeatureHistogram::Binned(_))
    }
}

/// Pools the valid samples of `feature` across `sets` and bins them.
///
/// Linear features get `config.num_bins` equal bins spanning the observed
/// min/max; circular features get `config.num_bins` equal bins over the
/// full circle with the first bin straddling the +-180 wrap. Fewer than
/// `config.min_samples` pooled samples yields the insufficient-data
/// marker.
pub fn build_histogram(
    sets: &[FeatureSet],
    feature: Feature,
    config: &AnalysisConfig,
) -> FeatureHistogram {
    let circular = feature.is_circular();
    let per_recording: Vec<Vec<f64>> = sets.iter().map(|s| s.valid_samples(feature)).collect();
    let samples: Vec<f64> = per_recording.iter().flatten().copied().collect();

    if samples.len() < config.min_samples {
        return FeatureHistogram::Insufficient {
            feature,
            circular,
            num_samples: samples.len() as u64,
        };
    }

    let (edges, counts) = if circular {
        bin_circular(&samples, config.num_bins)
    } else {
        bin_linear(&samples, config.num_bins)
    };

    let mut mean_per_recording = Vec::with_capacity(per_recording.len());
    let mut std_per_recording = Vec::with_capacity(per_recording.len());
    for recording in &per_recording {
        let (mean, std) = recording_moments(recording, circular);
        mean_per_recording.push(mean);
        std_per_recording.push(std);
    }

    FeatureHistogram::Binned(Histogram {
        feature,
        circular,
        edges,
        counts,
        num_samples: samples.len() as u64,
        mean_per_recording,
        std_per_recording,
    })
}

fn bin_linear(samples: &[f64], num_bins: usize) -> (Vec<f64>, Vec<u64>) {
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A span below a few ulps of the sample magnitude cannot yield
    // distinct edges once divided into bins; widen the upper boundary,
    // never the lower one.
    let span_floor = min.abs().max(1.0) * f64::EPSILON * 4.0 * num_bins as f64;
    if max - min < span_floor {
        max = min + span_floor.max(1.0);
    }
    let width = (max - min) / num_bins as f64;
    let edges: Vec<f64> = (0..=num_bins).map(|k| min + k as f64 * width).collect();
    let mut counts = vec![0u64; num_bins];
    for &x in samples {
        let idx = (((x - min) / width) as usize).min(num_bins - 1);
        counts[idx] += 1;
    }
    (edges, counts)
}

/// Circular binning: bin *centers* sit at -180 + k * width, so the first
/// bin straddles the wrap point. Samples are wrapped onto the circle and
/// indexed modulo the bin count; none is dropped or double-counted at
/// +-180.
fn bin_circular(samples: &[f64], num_bins: usize) -> (Vec<f64>, Vec<u64>) {
    let width = 360.0 / num_bins as f64;
    let first_edge = -180.0 - width / 2.0;
    let edges: Vec<f64> = (0..=num_bins)
        .map(|k| first_edge + k as f64 * width)
        .collect();
    let mut counts = vec![0u64; num_bins];
    for &x in samples {
        let shifted = (x - first_edge).rem_euclid(360.0);
        let idx = ((shifted / width) as usize).min(num_bins - 1);
        counts[idx] += 1;
    }
    (edges, counts)
}

fn recording_moments(samples: &[f64], circular: bool) -> (f64, f64) {
    if samples.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    if circular {
        match geometry::circular_mean(samples) {
            Some(mean) => {
                // sample standard deviation, matching the linear branch
                let variance = if samples.len() < 2 {
                    0.0
                } else {
                    samples
                        .iter()
                        .map(|&s| geometry::angular_difference(s, mean).powi(2))
                        .sum::<f64>()
                        / (samples.len() - 1) as f64
                };
                (mean, variance.sqrt())
            }
            None => (f64::NAN, f64::NAN),
        }
    } else {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance = if samples.len() < 2 {
            0.0
        } else {
            samples.iter().map(|&s| (s - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64
        };
        (mean, variance.sqrt())
    }
}

#[cfg(test)]
mod histogram_tests {
    use super::*;
    use crate::features::extract_features;
    use crate::utils::test_utils::sine_worm_recording;
    use crate::worm::normalize::normalize;
    use approx::assert_relative_eq;

    fn sine_sets(count: usize) -> Vec<FeatureSet> {
        let config = AnalysisConfig::default();
        (0..count)
            .map(|i| {
                let raw = sine_worm_recording(&format!("rec{i}"), 80, 10.0, 25, 25.0, 1.0);
                extract_features(&normalize(&raw, &config), &config)
            })
            .collect()
    }

    #[test]
    fn counts_sum_to_the_pooled_valid_samples() {
        let sets = sine_sets(3);
        let config = AnalysisConfig::default();
        for feature in [Feature::Length, Feature::BendMidbody, Feature::Speed] {
            let pooled: usize = sets.iter().map(|s| s.valid_samples(feature).len()).sum();
            match build_histogram(&sets, feature, &config) {
                FeatureHistogram::Binned(h) => {
                    assert_eq!(h.counts.iter().sum::<u64>(), pooled as u64, "{:?}", feature);
                    assert_eq!(h.num_samples, pooled as u64);
                    assert_eq!(h.edges.len(), h.counts.len() + 1);
                    assert!(h.edges.windows(2).all(|e| e[1] > e[0]));
                }
                FeatureHistogram::Insufficient { .. } => {
                    panic!("{:?}: expected enough samples, got {}", feature, pooled)
                }
            }
        }
    }

    #[test]
    fn too_few_samples_is_marked_insufficient() {
        let sets = sine_sets(1);
        let mut config = AnalysisConfig::default();
        config.min_samples = 10_000;
        let built = build_histogram(&sets, Feature::Length, &config);
        assert!(!built.is_sufficient());
        assert!(built.num_samples() > 0);
    }

    #[test]
    fn empty_sets_are_insufficient() {
        let config = AnalysisConfig::default();
        let built = build_histogram(&[], Feature::Length, &config);
        assert!(!built.is_sufficient());
        assert_eq!(built.num_samples(), 0);
    }

    #[test]
    fn wrap_straddling_samples_share_the_first_bin() {
        let width = 360.0 / 16.0;
        let (edges, counts) = bin_circular(&[179.9, -179.9, 180.0, -180.0], 16);
        assert_eq!(edges.len(), 17);
        assert_relative_eq!(edges[0], -180.0 - width / 2.0, epsilon = 1e-12);
        // all four samples sit within half a bin of the wrap point
        assert_eq!(counts[0], 4);
        assert_eq!(counts.iter().sum::<u64>(), 4);
    }

    #[test]
    fn degenerate_span_widens_upward() {
        let (edges, counts) = bin_linear(&[5.0, 5.0, 5.0], 4);
        assert_relative_eq!(edges[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(*edges.last().unwrap(), 6.0, epsilon = 1e-12);
        assert_eq!(counts.iter().sum::<u64>(), 3);
        assert_eq!(counts[0], 3);
    }

    #[test]
    fn sub_ulp_span_still_yields_strictly_increasing_edges() {
        // near-constant samples whose span is smaller than one ulp of
        // their magnitude, as body length produces on a rigid worm
        let samples = [23.999999999999996, 24.0, 24.0, 23.999999999999996];
        let (edges, counts) = bin_linear(&samples, 16);
        assert!(edges.windows(2).all(|e| e[1] > e[0]));
        assert_relative_eq!(edges[0], samples[0], epsilon = 1e-12);
        assert!(*edges.last().unwrap() > 24.0, "widened upward past max");
        assert_eq!(counts.iter().sum::<u64>(), 4);
    }

    #[test]
    fn per_recording_std_uses_the_sample_convention_for_both_kinds() {
        let (linear_mean, linear_std) = recording_moments(&[10.0, 20.0], false);
        let (circular_mean, circular_std) = recording_moments(&[10.0, 20.0], true);
        assert_relative_eq!(linear_mean, 15.0, epsilon = 1e-9);
        assert_relative_eq!(circular_mean, 15.0, epsilon = 1e-9);
        assert_relative_eq!(linear_std, 50.0f64.sqrt(), epsilon = 1e-9);
        assert_relative_eq!(circular_std, linear_std, epsilon = 1e-9);
    }

    #[test]
    fn max_sample_lands_in_the_closed_last_bin() {
        let (_, counts) = bin_linear(&[0.0, 1.0, 2.0, 3.0, 4.0], 5);
        assert_eq!(counts.iter().sum::<u64>(), 5);
        assert_eq!(*counts.last().unwrap(), 1);
    }

    #[test]
    fn pdf_sums_to_one() {
        let sets = sine_sets(2);
        let config = AnalysisConfig::default();
        if let FeatureHistogram::Binned(h) = build_histogram(&sets, Feature::BendMidbody, &config) {
            let pdf = h.pdf().unwrap();
            assert_relative_eq!(pdf.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        } else {
            panic!("expected binned histogram");
        }
    }
}
