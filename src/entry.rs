use anyhow::{anyhow, Context, Result};
use crossbeam::thread;
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::features::{extract_features, Feature, FeatureSet};
use crate::stats::comparison::{compare, ComparisonResult};
use crate::stats::build_histogram;
use crate::worm::normalize::normalize;
use crate::worm::RawRecording;

/// Normalizes and feature-extracts every recording of one group.
/// Recordings are independent, so this runs across them in parallel; each
/// feature set is computed exactly once and reused from then on.
pub fn extract_group(recordings: &[RawRecording], config: &AnalysisConfig) -> Vec<FeatureSet> {
    recordings
        .par_iter()
        .map(|raw| {
            let ts = normalize(raw, config);
            extract_features(&ts, config)
        })
        .collect()
}

/// Full two-group pipeline: raw recordings in, one [`ComparisonResult`]
/// per feature out, ordered by feature.
///
/// The experiment and control groups are processed concurrently (scoped
/// threads); the per-feature histogram/comparison stage is parallel
/// across features. One feature with insufficient data never blocks the
/// others.
pub fn compare_groups(
    experiment: &[RawRecording],
    control: &[RawRecording],
    config: &AnalysisConfig,
) -> Result<Vec<ComparisonResult>> {
    config.validate().context("rejecting analysis config")?;

    let (experiment_sets, control_sets) = thread::scope(|s| {
        let experiment_handle = s.spawn(|_| extract_group(experiment, config));
        let control_handle = s.spawn(|_| extract_group(control, config));
        let experiment_sets = experiment_handle.join();
        let control_sets = control_handle.join();
        (experiment_sets, control_sets)
    })
    .map_err(|_| anyhow!("group extraction scope panicked"))?;
    let experiment_sets =
        experiment_sets.map_err(|_| anyhow!("experiment extraction thread panicked"))?;
    let control_sets = control_sets.map_err(|_| anyhow!("control extraction thread panicked"))?;

    println!(
        "Extracted features: {} experiment and {} control recordings",
        experiment_sets.len(),
        control_sets.len()
    );

    compare_feature_sets(&experiment_sets, &control_sets, config)
}

/// Histogram-and-compare stage over already-extracted feature sets.
pub fn compare_feature_sets(
    experiment_sets: &[FeatureSet],
    control_sets: &[FeatureSet],
    config: &AnalysisConfig,
) -> Result<Vec<ComparisonResult>> {
    let results = Feature::ALL
        .par_iter()
        .map(|&feature| {
            let experiment_hist = build_histogram(experiment_sets, feature, config);
            let control_hist = build_histogram(control_sets, feature, config);
            compare(&experiment_hist, &control_hist, config)
                .with_context(|| format!("comparing {}", feature.name()))
        })
        .collect::<Result<Vec<_>>>()?;

    println!("Compared {} features", results.len());
    Ok(results)
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::stats::comparison::Classification;
    use crate::utils::test_utils::{sine_worm_recording, straight_worm_recording};
    use approx::assert_relative_eq;

    fn result_for(results: &[ComparisonResult], feature: Feature) -> &ComparisonResult {
        results.iter().find(|r| r.feature == feature).unwrap()
    }

    #[test]
    fn sine_versus_flat_bend_is_near_maximally_different() {
        // 10 Hz, 100 frames, 1 s bending period, 30 degree drive
        let experiment = vec![sine_worm_recording("sine", 100, 10.0, 49, 30.0, 1.0)];
        let control = vec![straight_worm_recording("flat", 100, 10.0, 49)];
        let config = AnalysisConfig::default();
        let results = compare_groups(&experiment, &control, &config).unwrap();

        let bend = result_for(&results, Feature::BendMidbody);
        assert_eq!(bend.classification, Classification::Different);
        let distance = bend.distance.unwrap();
        assert!(
            distance > 1.0,
            "sine vs flat bend should be near-maximal, got {}",
            distance
        );
    }

    #[test]
    fn sine_versus_itself_is_the_same_everywhere() {
        let group_a = vec![sine_worm_recording("sine", 100, 10.0, 49, 30.0, 1.0)];
        let group_b = vec![sine_worm_recording("sine-copy", 100, 10.0, 49, 30.0, 1.0)];
        let config = AnalysisConfig::default();
        let results = compare_groups(&group_a, &group_b, &config).unwrap();

        for result in &results {
            if result.classification == Classification::NotComputable {
                continue;
            }
            assert_eq!(
                result.classification,
                Classification::Same,
                "{:?}",
                result.feature
            );
            assert_relative_eq!(result.distance.unwrap(), 0.0, epsilon = 1e-12);
        }
        // the defining posture feature must actually be computable
        let bend = result_for(&results, Feature::BendMidbody);
        assert_eq!(bend.classification, Classification::Same);
    }

    #[test]
    fn empty_groups_yield_not_computable_everywhere() {
        let config = AnalysisConfig::default();
        let results = compare_groups(&[], &[], &config).unwrap();
        assert_eq!(results.len(), Feature::ALL.len());
        for result in results {
            assert_eq!(result.classification, Classification::NotComputable);
            assert!(result.distance.is_none());
        }
    }

    #[test]
    fn invalid_config_fails_before_touching_data() {
        let config = AnalysisConfig {
            num_bins: 0,
            ..Default::default()
        };
        assert!(compare_groups(&[], &[], &config).is_err());
    }
}
