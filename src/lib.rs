//! Standardized locomotion/behavior features from worm skeleton and
//! contour time series, and histogram-based statistical comparison of
//! feature distributions between experimental groups.
//!
//! The pipeline runs raw per-frame data through normalization
//! (orientation resolution, gap filling), a fixed taxonomy of feature
//! extractors, per-group histogram pooling and a pairwise distance
//! statistic:
//!
//! ```
//! use wormetrics::{compare_groups, AnalysisConfig};
//! use wormetrics::utils::test_utils::{sine_worm_recording, straight_worm_recording};
//!
//! let experiment = vec![sine_worm_recording("mutant", 100, 10.0, 49, 30.0, 1.0)];
//! let control = vec![straight_worm_recording("wild-type", 100, 10.0, 49)];
//! let results = compare_groups(&experiment, &control, &AnalysisConfig::default()).unwrap();
//! assert_eq!(results.len(), wormetrics::Feature::ALL.len());
//! ```

mod entry;

pub mod config;
pub mod error;
pub mod features;
pub mod geometry;
pub mod stats;
pub mod utils;
pub mod worm;

pub use config::AnalysisConfig;
pub use entry::{compare_feature_sets, compare_groups, extract_group};
pub use error::AnalysisError;
pub use features::{extract_features, Feature, FeatureKind, FeatureSeries, FeatureSet};
pub use stats::comparison::{
    compare, compare_with, BoundedAbsDiff, Classification, ComparisonResult, DistanceMetric,
    KolmogorovSmirnov,
};
pub use stats::{build_histogram, FeatureHistogram, Histogram};
pub use worm::normalize::normalize;
pub use worm::{ContourFrame, Frame, Point, RawRecording, WormTimeSeries};
