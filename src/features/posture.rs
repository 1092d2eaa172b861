//! Posture features: derived from the skeleton shape within one frame.
//! Region bends are circular (degrees); amplitude, wavelength and
//! eccentricity are linear.

use nalgebra::Matrix2;

use crate::config::AnalysisConfig;
use crate::features::{BodyRegion, Feature, FeatureSeries};
use crate::geometry;
use crate::worm::{Point, WormTimeSeries};

const BEND_REGIONS: [(Feature, BodyRegion); 5] = [
    (Feature::BendHead, BodyRegion::Head),
    (Feature::BendNeck, BodyRegion::Neck),
    (Feature::BendMidbody, BodyRegion::Midbody),
    (Feature::BendHips, BodyRegion::Hips),
    (Feature::BendTail, BodyRegion::Tail),
];

pub fn extract(ts: &WormTimeSeries, _config: &AnalysisConfig) -> Vec<FeatureSeries> {
    let n = ts.num_frames();
    let mut bends: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(n); BEND_REGIONS.len()];
    let mut amplitude = Vec::with_capacity(n);
    let mut wavelength = Vec::with_capacity(n);
    let mut eccentricity = Vec::with_capacity(n);

    for frame in 0..n {
        let skeleton = ts.skeleton(frame);
        let joints = skeleton.map(joint_angles);

        for (slot, (_, region)) in bends.iter_mut().zip(BEND_REGIONS.iter()) {
            slot.push(joints.as_deref().and_then(|j| region_bend(j, *region)));
        }
        amplitude.push(skeleton.and_then(amplitude_ratio));
        wavelength.push(skeleton.and_then(bend_wavelength));
        // prefer the contour outline for the shape ellipse; fall back to
        // the skeleton when the contour is missing
        let shape_points: Option<Vec<Point>> = match (ts.contour(frame), skeleton) {
            (Some(sides), Some(_)) => {
                let mut pts = sides.dorsal.clone();
                pts.extend(sides.ventral.iter().copied());
                Some(pts)
            }
            (None, Some(skel)) => Some(skel.to_vec()),
            _ => None,
        };
        eccentricity.push(shape_points.as_deref().and_then(shape_eccentricity));
    }

    let mut out: Vec<FeatureSeries> = bends
        .into_iter()
        .zip(BEND_REGIONS.iter())
        .map(|(values, (feature, _))| FeatureSeries::from_options(*feature, values))
        .collect();
    out.push(FeatureSeries::from_options(Feature::Amplitude, amplitude));
    out.push(FeatureSeries::from_options(Feature::Wavelength, wavelength));
    out.push(FeatureSeries::from_options(
        Feature::Eccentricity,
        eccentricity,
    ));
    out
}

/// Signed turning angle at each interior skeleton point (degrees), the
/// elementary bend between adjacent body segments. Length is
/// `skeleton.len() - 2`; degenerate joints are `None`.
fn joint_angles(skeleton: &[Point]) -> Vec<Option<f64>> {
    if skeleton.len() < 3 {
        return Vec::new();
    }
    (1..skeleton.len() - 1)
        .map(|i| geometry::angle_between(&skeleton[i - 1], &skeleton[i], &skeleton[i + 1]))
        .collect()
}

/// Circular mean of the joint angles inside one body region.
fn region_bend(joints: &[Option<f64>], region: BodyRegion) -> Option<f64> {
    let range = region.index_range(joints.len());
    let angles: Vec<f64> = joints[range].iter().flatten().copied().collect();
    if angles.is_empty() {
        return None;
    }
    geometry::circular_mean(&angles)
}

/// Largest perpendicular excursion from the head-tail axis, normalized by
/// body length. Invalid when the worm is coiled onto itself (degenerate
/// axis) or has near-zero length.
fn amplitude_ratio(skeleton: &[Point]) -> Option<f64> {
    let length = *geometry::arc_length(skeleton).last()?;
    if length < 1e-12 {
        return None;
    }
    let head = skeleton.first()?;
    let tail = skeleton.last()?;
    let mut max_excursion: f64 = 0.0;
    for p in skeleton {
        let d = geometry::perpendicular_distance(p, head, tail)?;
        max_excursion = max_excursion.max(d.abs());
    }
    Some(max_excursion / length)
}

/// Bend wavelength from the zero crossings of the perpendicular deviation
/// profile: twice the mean arc-length spacing between consecutive
/// crossings. Needs at least two crossings, else invalid (a straight or
/// C-shaped worm has no wavelength).
fn bend_wavelength(skeleton: &[Point]) -> Option<f64> {
    let head = skeleton.first()?;
    let tail = skeleton.last()?;
    let lengths = geometry::arc_length(skeleton);
    let deviations: Vec<f64> = skeleton
        .iter()
        .map(|p| geometry::perpendicular_distance(p, head, tail))
        .collect::<Option<Vec<_>>>()?;

    let mut crossings = Vec::new();
    for i in 1..deviations.len() {
        let a = deviations[i - 1];
        let b = deviations[i];
        if a == 0.0 && b == 0.0 {
            continue;
        }
        if a.signum() != b.signum() {
            // linear interpolation of the crossing position along the body
            let t = a.abs() / (a.abs() + b.abs());
            crossings.push(lengths[i - 1] + t * (lengths[i] - lengths[i - 1]));
        }
    }
    if crossings.len() < 2 {
        return None;
    }
    let spacing: f64 = crossings
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .sum::<f64>()
        / (crossings.len() - 1) as f64;
    Some(2.0 * spacing)
}

/// Eccentricity of the shape's point cloud from the covariance
/// eigenvalues: sqrt(1 - lambda_min / lambda_max).
fn shape_eccentricity(points: &[Point]) -> Option<f64> {
    if points.len() < 3 {
        return None;
    }
    let center = geometry::centroid(points)?;
    let n = points.len() as f64;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x - center.x;
        let dy = p.y - center.y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let covariance = Matrix2::new(sxx / n, sxy / n, sxy / n, syy / n);
    let eigen = covariance.symmetric_eigen();
    let a = eigen.eigenvalues[0];
    let b = eigen.eigenvalues[1];
    let (max, min) = if a >= b { (a, b) } else { (b, a) };
    if max < 1e-12 {
        return None;
    }
    Some((1.0 - (min / max).clamp(0.0, 1.0)).sqrt())
}

#[cfg(test)]
mod posture_tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::utils::test_utils::{sine_worm_recording, straight_worm_recording};
    use crate::worm::normalize::normalize;
    use approx::assert_relative_eq;

    fn series_for(series: &[FeatureSeries], feature: Feature) -> &FeatureSeries {
        series.iter().find(|s| s.feature == feature).unwrap()
    }

    #[test]
    fn sine_worm_bend_tracks_the_drive_amplitude() {
        // 8 fps with a 1 s period puts frame 2 exactly on the sine peak
        let amplitude = 20.0;
        let raw = sine_worm_recording("sine", 40, 8.0, 25, amplitude, 1.0);
        let ts = normalize(&raw, &AnalysisConfig::default());
        let series = extract(&ts, &AnalysisConfig::default());
        let bend = series_for(&series, Feature::BendMidbody);
        let samples = bend.valid_samples();
        assert!(!samples.is_empty());
        let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
        // every joint turns by the same driven angle, so the regional
        // circular mean must reach the drive amplitude at the sine peaks
        assert_relative_eq!(peak, amplitude, epsilon = 0.5);
    }

    #[test]
    fn straight_worm_amplitude_and_wavelength() {
        let raw = straight_worm_recording("s", 5, 10.0, 25);
        let ts = normalize(&raw, &AnalysisConfig::default());
        let series = extract(&ts, &AnalysisConfig::default());
        for sample in series_for(&series, Feature::Amplitude).valid_samples() {
            assert_relative_eq!(sample, 0.0, epsilon = 1e-9);
        }
        // no zero crossings on a straight body: wavelength undefined
        assert_eq!(series_for(&series, Feature::Wavelength).valid_count(), 0);
    }

    #[test]
    fn elongated_shape_is_highly_eccentric() {
        let raw = straight_worm_recording("e", 2, 10.0, 25);
        let ts = normalize(&raw, &AnalysisConfig::default());
        let series = extract(&ts, &AnalysisConfig::default());
        for sample in series_for(&series, Feature::Eccentricity).valid_samples() {
            assert!(sample > 0.9, "straight worm should be near-linear, got {}", sample);
        }
    }

    #[test]
    fn joint_angles_of_a_right_angle_bend() {
        let skeleton = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 1.0, y: 0.0 },
            Point { x: 1.0, y: 1.0 },
        ];
        let joints = joint_angles(&skeleton);
        assert_eq!(joints.len(), 1);
        assert_relative_eq!(joints[0].unwrap(), 90.0, epsilon = 1e-9);
    }
}
