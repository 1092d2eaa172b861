//! The feature taxonomy and the aggregator that runs every extractor
//! against one normalized time series.
//!
//! The taxonomy is a closed set: one enum variant per feature, carrying
//! its category and circularity as attributes (never inferred from the
//! name). Angular features are in degrees and flagged circular so the
//! histogram layer bins them wrap-aware.

pub mod locomotion;
pub mod morphology;
pub mod path;
pub mod posture;

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::worm::WormTimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Morphology,
    Posture,
    Locomotion,
    Path,
}

/// Every feature this crate computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    Length,
    Area,
    WidthHead,
    WidthMidbody,
    WidthTail,
    BendHead,
    BendNeck,
    BendMidbody,
    BendHips,
    BendTail,
    Amplitude,
    Wavelength,
    Eccentricity,
    Speed,
    MotionDirection,
    ForagingSpeed,
    PathRange,
    PathCurvature,
    Dwelling,
}

impl Feature {
    pub const ALL: [Feature; 19] = [
        Feature::Length,
        Feature::Area,
        Feature::WidthHead,
        Feature::WidthMidbody,
        Feature::WidthTail,
        Feature::BendHead,
        Feature::BendNeck,
        Feature::BendMidbody,
        Feature::BendHips,
        Feature::BendTail,
        Feature::Amplitude,
        Feature::Wavelength,
        Feature::Eccentricity,
        Feature::Speed,
        Feature::MotionDirection,
        Feature::ForagingSpeed,
        Feature::PathRange,
        Feature::PathCurvature,
        Feature::Dwelling,
    ];

    pub fn kind(self) -> FeatureKind {
        use Feature::*;
        match self {
            Length | Area | WidthHead | WidthMidbody | WidthTail => FeatureKind::Morphology,
            BendHead | BendNeck | BendMidbody | BendHips | BendTail | Amplitude | Wavelength
            | Eccentricity => FeatureKind::Posture,
            Speed | MotionDirection | ForagingSpeed => FeatureKind::Locomotion,
            PathRange | PathCurvature | Dwelling => FeatureKind::Path,
        }
    }

    /// Circular features wrap at +-180 degrees and need vector-sum
    /// averaging and wrap-aware binning.
    pub fn is_circular(self) -> bool {
        use Feature::*;
        matches!(
            self,
            BendHead | BendNeck | BendMidbody | BendHips | BendTail | MotionDirection
        )
    }

    pub fn name(self) -> &'static str {
        use Feature::*;
        match self {
            Length => "morphology.length",
            Area => "morphology.area",
            WidthHead => "morphology.width.head",
            WidthMidbody => "morphology.width.midbody",
            WidthTail => "morphology.width.tail",
            BendHead => "posture.bend.head",
            BendNeck => "posture.bend.neck",
            BendMidbody => "posture.bend.midbody",
            BendHips => "posture.bend.hips",
            BendTail => "posture.bend.tail",
            Amplitude => "posture.amplitude",
            Wavelength => "posture.wavelength",
            Eccentricity => "posture.eccentricity",
            Speed => "locomotion.speed",
            MotionDirection => "locomotion.motion_direction",
            ForagingSpeed => "locomotion.foraging_speed",
            PathRange => "path.range",
            PathCurvature => "path.curvature",
            Dwelling => "path.dwelling",
        }
    }
}

/// Five-region split of the body, as fractions of the point count so any
/// skeleton resolution works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRegion {
    Head,
    Neck,
    Midbody,
    Hips,
    Tail,
}

impl BodyRegion {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            BodyRegion::Head => (0.0, 1.0 / 6.0),
            BodyRegion::Neck => (1.0 / 6.0, 1.0 / 3.0),
            BodyRegion::Midbody => (1.0 / 3.0, 2.0 / 3.0),
            BodyRegion::Hips => (2.0 / 3.0, 5.0 / 6.0),
            BodyRegion::Tail => (5.0 / 6.0, 1.0),
        }
    }

    /// Index range of this region over a sequence of `n` samples.
    pub fn index_range(self, n: usize) -> Range<usize> {
        let (lo, hi) = self.bounds();
        let start = (lo * n as f64).floor() as usize;
        let end = ((hi * n as f64).ceil() as usize).min(n);
        start..end.max(start)
    }
}

/// One feature's per-frame values with a validity mask parallel to the
/// source time series. Invalid slots hold NaN and are never read through
/// the mask-aware accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSeries {
    pub feature: Feature,
    pub values: Vec<f64>,
    pub valid: Vec<bool>,
}

impl FeatureSeries {
    /// Builds a series from per-frame optional values.
    pub fn from_options(feature: Feature, per_frame: Vec<Option<f64>>) -> Self {
        let valid: Vec<bool> = per_frame.iter().map(|v| v.is_some()).collect();
        let values: Vec<f64> = per_frame
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        FeatureSeries {
            feature,
            values,
            valid,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }

    /// The defined samples, in frame order.
    pub fn valid_samples(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(self.valid.iter())
            .filter(|(_, ok)| **ok)
            .map(|(v, _)| *v)
            .collect()
    }

    /// Drops validity on frames outside `mask` (a feature cannot be valid
    /// where its geometric input was missing).
    fn restrict_to(&mut self, mask: &[bool]) {
        for (i, ok) in self.valid.iter_mut().enumerate() {
            if *ok && !mask[i] {
                *ok = false;
                self.values[i] = f64::NAN;
            }
        }
    }
}

/// All features of one recording, keyed by feature. Derived once per
/// [`WormTimeSeries`] and immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub label: String,
    pub num_frames: usize,
    series: BTreeMap<Feature, FeatureSeries>,
}

impl FeatureSet {
    pub fn get(&self, feature: Feature) -> Option<&FeatureSeries> {
        self.series.get(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Feature, &FeatureSeries)> {
        self.series.iter()
    }

    pub fn valid_samples(&self, feature: Feature) -> Vec<f64> {
        self.get(feature)
            .map(|s| s.valid_samples())
            .unwrap_or_default()
    }
}

/// Runs every extractor against `ts` and assembles the feature set.
///
/// Extractors are independent pure functions; their order is irrelevant
/// and the time series is never mutated. The aggregator clamps every
/// validity mask to the source validity mask, so the subset invariant
/// holds regardless of what an extractor returns.
pub fn extract_features(ts: &WormTimeSeries, config: &AnalysisConfig) -> FeatureSet {
    let mask = ts.valid_mask();
    let mut series = BTreeMap::new();

    let batches = [
        morphology::extract(ts),
        posture::extract(ts, config),
        locomotion::extract(ts, config),
        path::extract(ts, config),
    ];
    for batch in batches {
        for mut one in batch {
            debug_assert_eq!(one.len(), ts.num_frames());
            one.restrict_to(&mask);
            series.insert(one.feature, one);
        }
    }

    FeatureSet {
        label: ts.label.clone(),
        num_frames: ts.num_frames(),
        series,
    }
}
