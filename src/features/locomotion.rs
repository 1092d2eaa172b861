//! Locomotion features: differences between consecutive valid frames.
//! A sample is only defined when both frames are valid and the frame gap
//! does not exceed the configured maximum; nothing is extrapolated
//! across larger gaps.

use crate::config::AnalysisConfig;
use crate::features::{BodyRegion, Feature, FeatureSeries};
use crate::geometry;
use crate::worm::{Point, WormTimeSeries};

const STATIONARY_EPS: f64 = 1e-12;

pub fn extract(ts: &WormTimeSeries, config: &AnalysisConfig) -> Vec<FeatureSeries> {
    let n = ts.num_frames();
    let mut speed = vec![None; n];
    let mut direction = vec![None; n];
    let mut foraging = vec![None; n];

    let head_bend: Vec<Option<f64>> = (0..n)
        .map(|frame| {
            ts.skeleton(frame)
                .and_then(|skel| head_bend_angle(skel))
        })
        .collect();

    let mut previous_valid: Option<usize> = None;
    for frame in 0..n {
        if !ts.is_valid(frame) {
            continue;
        }
        if let Some(prev) = previous_valid {
            let gap = frame - prev;
            if gap <= config.max_locomotion_gap {
                let dt = gap as f64 / ts.fps;
                if let (Some(c0), Some(c1)) = (ts.skeleton_centroid(prev), ts.skeleton_centroid(frame)) {
                    let dx = c1.x - c0.x;
                    let dy = c1.y - c0.y;
                    let displacement = (dx * dx + dy * dy).sqrt();

                    speed[frame] = signed_speed(ts, frame, dx, dy, displacement, dt);
                    // the direction of a stationary worm is undefined
                    if displacement > STATIONARY_EPS {
                        direction[frame] = Some(geometry::wrap_degrees(dy.atan2(dx).to_degrees()));
                    }
                }
                if let (Some(b0), Some(b1)) = (head_bend[prev], head_bend[frame]) {
                    foraging[frame] = Some(geometry::angular_difference(b1, b0) / dt);
                }
            }
        }
        previous_valid = Some(frame);
    }

    vec![
        FeatureSeries::from_options(Feature::Speed, speed),
        FeatureSeries::from_options(Feature::MotionDirection, direction),
        FeatureSeries::from_options(Feature::ForagingSpeed, foraging),
    ]
}

/// Centroid speed signed by the head-ward body axis: positive when the
/// worm moves toward where its head points, negative when it backs up.
fn signed_speed(
    ts: &WormTimeSeries,
    frame: usize,
    dx: f64,
    dy: f64,
    displacement: f64,
    dt: f64,
) -> Option<f64> {
    let skeleton = ts.skeleton(frame)?;
    let centroid = ts.skeleton_centroid(frame)?;
    let head = skeleton.first()?;
    let axis = (head.x - centroid.x, head.y - centroid.y);
    let axis_norm = (axis.0 * axis.0 + axis.1 * axis.1).sqrt();
    let magnitude = displacement / dt;
    if displacement <= STATIONARY_EPS {
        return Some(0.0);
    }
    if axis_norm < STATIONARY_EPS {
        // fully coiled, no body axis to sign against
        return None;
    }
    let sign = if dx * axis.0 + dy * axis.1 >= 0.0 {
        1.0
    } else {
        -1.0
    };
    Some(sign * magnitude)
}

/// Mean bend of the head region in one frame, the quantity whose angular
/// rate is the foraging speed.
fn head_bend_angle(skeleton: &[Point]) -> Option<f64> {
    if skeleton.len() < 3 {
        return None;
    }
    let joints: Vec<Option<f64>> = (1..skeleton.len() - 1)
        .map(|i| geometry::angle_between(&skeleton[i - 1], &skeleton[i], &skeleton[i + 1]))
        .collect();
    let range = BodyRegion::Head.index_range(joints.len());
    let angles: Vec<f64> = joints[range].iter().flatten().copied().collect();
    if angles.is_empty() {
        return None;
    }
    geometry::circular_mean(&angles)
}

#[cfg(test)]
mod locomotion_tests {
    use super::*;
    use crate::utils::test_utils::{straight_worm_recording, translated};
    use crate::worm::normalize::normalize;
    use crate::worm::Frame;
    use approx::assert_relative_eq;

    fn series_for(series: &[FeatureSeries], feature: Feature) -> FeatureSeries {
        series.iter().find(|s| s.feature == feature).unwrap().clone()
    }

    #[test]
    fn forward_translation_gives_positive_speed_and_direction() {
        // the synthetic worm's head sits at x = 0 with the body along +x,
        // so head-ward motion is the -x direction
        let mut raw = straight_worm_recording("fwd", 6, 10.0, 13);
        for (t, frame) in raw.frames.iter_mut().enumerate() {
            *frame = translated(frame, -2.0 * t as f64, 0.0);
        }
        let ts = normalize(&raw, &AnalysisConfig::default());
        let series = extract(&ts, &AnalysisConfig::default());
        let speed = series_for(&series, Feature::Speed);
        assert!(!speed.valid[0], "first frame has no predecessor");
        for sample in speed.valid_samples() {
            assert_relative_eq!(sample, 20.0, epsilon = 1e-9);
        }
        let direction = series_for(&series, Feature::MotionDirection);
        for sample in direction.valid_samples() {
            assert_relative_eq!(sample, 180.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn tail_ward_translation_gives_negative_speed() {
        let mut raw = straight_worm_recording("bwd", 6, 10.0, 13);
        for (t, frame) in raw.frames.iter_mut().enumerate() {
            *frame = translated(frame, 1.0 * t as f64, 0.0);
        }
        let ts = normalize(&raw, &AnalysisConfig::default());
        let series = extract(&ts, &AnalysisConfig::default());
        for sample in series_for(&series, Feature::Speed).valid_samples() {
            assert_relative_eq!(sample, -10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn no_sample_across_a_large_gap() {
        let mut raw = straight_worm_recording("gap", 8, 10.0, 13);
        for (t, frame) in raw.frames.iter_mut().enumerate() {
            *frame = translated(frame, t as f64, 0.0);
        }
        for idx in [2, 3, 4] {
            raw.frames[idx] = Frame::missing();
        }
        let mut config = AnalysisConfig::default();
        config.max_gap_frames = 0; // keep the hole open
        config.max_locomotion_gap = 2;
        let ts = normalize(&raw, &config);
        let series = extract(&ts, &config);
        let speed = series_for(&series, Feature::Speed);
        // frame 5 is 4 frames after the last valid frame 1: too far
        assert!(!speed.valid[5]);
        assert!(speed.valid[6]);
    }

    #[test]
    fn stationary_worm_has_zero_speed_and_no_direction() {
        let raw = straight_worm_recording("still", 5, 10.0, 13);
        let ts = normalize(&raw, &AnalysisConfig::default());
        let series = extract(&ts, &AnalysisConfig::default());
        for sample in series_for(&series, Feature::Speed).valid_samples() {
            assert_relative_eq!(sample, 0.0, epsilon = 1e-12);
        }
        assert_eq!(series_for(&series, Feature::MotionDirection).valid_count(), 0);
    }
}
