//! Cross-group comparison of two feature histograms: a bounded distance
//! between the normalized distributions plus a significance
//! classification.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::features::Feature;
use crate::stats::{FeatureHistogram, Histogram};

const EDGE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Same,
    Different,
    /// Either side had insufficient data; the distance is absent, never a
    /// numeric value masquerading as meaningful.
    NotComputable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub feature: Feature,
    pub distance: Option<f64>,
    pub classification: Classification,
    pub experiment_samples: u64,
    pub control_samples: u64,
}

/// The distance statistic is a domain-science decision, so it is a
/// strategy: implementations receive the two probability-mass vectors
/// already resampled onto a common bin grid.
pub trait DistanceMetric: Sync {
    fn name(&self) -> &'static str;
    fn distance(&self, mass_a: &[f64], mass_b: &[f64]) -> f64;
}

/// Summed absolute difference of probability masses, in [0, 2]: 0 for
/// identical distributions, 2 for disjoint supports.
pub struct BoundedAbsDiff;

impl DistanceMetric for BoundedAbsDiff {
    fn name(&self) -> &'static str {
        "bounded_abs_diff"
    }

    fn distance(&self, mass_a: &[f64], mass_b: &[f64]) -> f64 {
        mass_a
            .iter()
            .zip(mass_b.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

/// Kolmogorov-Smirnov style statistic: the largest absolute difference of
/// the cumulative distributions, in [0, 1].
pub struct KolmogorovSmirnov;

impl DistanceMetric for KolmogorovSmirnov {
    fn name(&self) -> &'static str {
        "kolmogorov_smirnov"
    }

    fn distance(&self, mass_a: &[f64], mass_b: &[f64]) -> f64 {
        let mut cum_a = 0.0;
        let mut cum_b = 0.0;
        let mut max_gap: f64 = 0.0;
        for (a, b) in mass_a.iter().zip(mass_b.iter()) {
            cum_a += a;
            cum_b += b;
            max_gap = max_gap.max((cum_a - cum_b).abs());
        }
        max_gap
    }
}

/// Compares an experiment histogram against a control histogram with the
/// default metric ([`BoundedAbsDiff`]).
///
/// Histograms built under different policies (different feature or
/// circularity) are a caller bug and fail loudly.
pub fn compare(
    experiment: &FeatureHistogram,
    control: &FeatureHistogram,
    config: &AnalysisConfig,
) -> Result<ComparisonResult, AnalysisError> {
    compare_with(&BoundedAbsDiff, experiment, control, config)
}

pub fn compare_with(
    metric: &dyn DistanceMetric,
    experiment: &FeatureHistogram,
    control: &FeatureHistogram,
    config: &AnalysisConfig,
) -> Result<ComparisonResult, AnalysisError> {
    check_policy(experiment, control)?;

    let (FeatureHistogram::Binned(exp), FeatureHistogram::Binned(ctl)) = (experiment, control)
    else {
        return Ok(ComparisonResult {
            feature: experiment.feature(),
            distance: None,
            classification: Classification::NotComputable,
            experiment_samples: experiment.num_samples(),
            control_samples: control.num_samples(),
        });
    };

    let edges = union_edges(&exp.edges, &ctl.edges);
    let mass_exp = resample_mass(exp, &edges);
    let mass_ctl = resample_mass(ctl, &edges);
    let distance = metric.distance(&mass_exp, &mass_ctl);

    let classification = if distance < config.same_threshold {
        Classification::Same
    } else {
        Classification::Different
    };

    Ok(ComparisonResult {
        feature: exp.feature,
        distance: Some(distance),
        classification,
        experiment_samples: exp.num_samples,
        control_samples: ctl.num_samples,
    })
}

fn check_policy(a: &FeatureHistogram, b: &FeatureHistogram) -> Result<(), AnalysisError> {
    if a.feature() != b.feature() {
        return Err(AnalysisError::PolicyMismatch(format!(
            "cannot compare {} against {}",
            a.feature().name(),
            b.feature().name()
        )));
    }
    if a.circular() != b.circular() {
        return Err(AnalysisError::PolicyMismatch(format!(
            "{}: circularity flags disagree",
            a.feature().name()
        )));
    }
    Ok(())
}

/// Merged, deduplicated edge grid of both histograms. Every cell of the
/// union grid lies entirely within at most one bin of each input, which
/// makes the mass resampling below exact.
fn union_edges(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut edges: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    edges.sort_by(|x, y| x.partial_cmp(y).expect("histogram edges are finite"));
    edges.dedup_by(|x, y| (*x - *y).abs() <= EDGE_TOLERANCE);
    edges
}

/// Redistributes a histogram's probability mass onto the union grid,
/// treating mass as uniform within each source bin.
fn resample_mass(histogram: &Histogram, union: &[f64]) -> Vec<f64> {
    let pdf = histogram.pdf().unwrap_or_else(|| vec![0.0; histogram.num_bins()]);
    let edges = &histogram.edges;
    let mut mass = Vec::with_capacity(union.len().saturating_sub(1));
    for cell in union.windows(2) {
        let mid = (cell[0] + cell[1]) / 2.0;
        let contribution = if mid < edges[0] || mid > *edges.last().unwrap() {
            0.0
        } else {
            // the union grid refines this histogram's grid, so the cell
            // sits inside exactly the bin containing its midpoint
            let bin = match edges.binary_search_by(|e| e.partial_cmp(&mid).unwrap()) {
                Ok(i) => i.min(edges.len() - 2),
                Err(i) => i.saturating_sub(1).min(edges.len() - 2),
            };
            let bin_width = edges[bin + 1] - edges[bin];
            pdf[bin] * (cell[1] - cell[0]) / bin_width
        };
        mass.push(contribution);
    }
    mass
}
