//! Turns a [`RawRecording`] into a [`WormTimeSeries`]: malformed frames
//! are marked missing, head/tail orientation is resolved by continuity,
//! and short missing spans are bridged by linear interpolation.

use crate::config::AnalysisConfig;
use crate::geometry;
use crate::worm::{ContourFrame, Frame, Point, RawRecording, WormTimeSeries};

/// Normalizes one recording. Pure and deterministic: the same raw input
/// always produces a bitwise-identical time series.
///
/// A recording with zero resolvable frames yields an empty series, not an
/// error; downstream consumers treat it as "no data".
pub fn normalize(raw: &RawRecording, config: &AnalysisConfig) -> WormTimeSeries {
    let mut frames: Vec<Frame> = raw
        .frames
        .iter()
        .map(|frame| sanitize_frame(frame, raw.skeleton_points))
        .collect();

    resolve_orientation(&mut frames);
    fill_skeleton_gaps(&mut frames, raw.skeleton_points, config.max_gap_frames);
    fill_contour_gaps(&mut frames, config.max_gap_frames);

    WormTimeSeries {
        label: raw.label.clone(),
        fps: raw.fps,
        skeleton_points: raw.skeleton_points,
        frames,
    }
}

/// A frame with the wrong skeleton point count or any non-finite
/// coordinate is marked missing. Skeleton and contour are judged
/// independently.
fn sanitize_frame(frame: &Frame, expected_points: usize) -> Frame {
    let skeleton = frame.skeleton.as_ref().and_then(|points| {
        if !points.is_empty() && points.len() == expected_points && points.iter().all(Point::is_finite)
        {
            Some(points.clone())
        } else {
            None
        }
    });
    let contour = frame.contour.as_ref().and_then(|sides| {
        let finite = sides.dorsal.iter().chain(sides.ventral.iter()).all(Point::is_finite);
        if finite && !sides.dorsal.is_empty() && !sides.ventral.is_empty() {
            Some(sides.clone())
        } else {
            None
        }
    });
    Frame { skeleton, contour }
}

/// Resolves the per-frame head/tail ambiguity as a fold over frames,
/// carrying the previously resolved head position: the orientation whose
/// head end moves less against the previous frame wins. The first
/// resolvable frame's orientation is taken as given.
fn resolve_orientation(frames: &mut [Frame]) {
    let mut previous_head: Option<Point> = None;
    for frame in frames.iter_mut() {
        let Some(skeleton) = frame.skeleton.as_mut() else {
            continue;
        };
        if let Some(prev) = previous_head {
            let head = skeleton[0];
            let tail = skeleton[skeleton.len() - 1];
            if tail.distance_to(&prev) < head.distance_to(&prev) {
                skeleton.reverse();
                if let Some(sides) = frame.contour.as_mut() {
                    flip_contour(sides);
                }
            }
        }
        previous_head = Some(skeleton[0]);
    }
}

/// A head/tail flip reverses traversal order and swaps which boundary is
/// dorsal and which ventral.
fn flip_contour(sides: &mut ContourFrame) {
    std::mem::swap(&mut sides.dorsal, &mut sides.ventral);
    sides.dorsal.reverse();
    sides.ventral.reverse();
}

/// Bridges missing skeleton spans up to `max_gap` frames long by linear
/// interpolation, independently per skeleton point and coordinate.
fn fill_skeleton_gaps(frames: &mut [Frame], num_points: usize, max_gap: usize) {
    if max_gap == 0 || num_points == 0 {
        return;
    }
    let missing_before: Vec<bool> = frames.iter().map(|f| f.skeleton.is_none()).collect();

    // One series per coordinate: xs then ys, point-major.
    let mut filled: Vec<Vec<Option<f64>>> = Vec::with_capacity(num_points * 2);
    for point_idx in 0..num_points {
        for coord in 0..2 {
            let series: Vec<Option<f64>> = frames
                .iter()
                .map(|f| {
                    f.skeleton.as_ref().map(|skel| {
                        let p = skel[point_idx];
                        if coord == 0 {
                            p.x
                        } else {
                            p.y
                        }
                    })
                })
                .collect();
            filled.push(geometry::fill_short_gaps(&series, max_gap));
        }
    }

    for (frame_idx, frame) in frames.iter_mut().enumerate() {
        if !missing_before[frame_idx] {
            continue;
        }
        let complete = (0..num_points * 2).all(|s| filled[s][frame_idx].is_some());
        if !complete {
            continue;
        }
        let skeleton: Vec<Point> = (0..num_points)
            .map(|point_idx| Point {
                x: filled[point_idx * 2][frame_idx].unwrap(),
                y: filled[point_idx * 2 + 1][frame_idx].unwrap(),
            })
            .collect();
        frame.skeleton = Some(skeleton);
    }
}

/// Same idea for contours. A missing contour run is only bridged when the
/// flanking frames agree on point counts (otherwise there is no pointwise
/// correspondence to interpolate along).
fn fill_contour_gaps(frames: &mut [Frame], max_gap: usize) {
    if max_gap == 0 {
        return;
    }
    let n = frames.len();
    let mut i = 0;
    while i < n {
        if frames[i].contour.is_some() {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i;
        while j < n && frames[j].contour.is_none() {
            j += 1;
        }
        let run = j - start;
        if start > 0 && j < n && run <= max_gap {
            let left = frames[start - 1].contour.clone().unwrap();
            let right = frames[j].contour.clone().unwrap();
            if left.dorsal.len() == right.dorsal.len() && left.ventral.len() == right.ventral.len()
            {
                let span = (run + 1) as f64;
                for k in 0..run {
                    let t = (k + 1) as f64 / span;
                    frames[start + k].contour = Some(ContourFrame {
                        dorsal: lerp_points(&left.dorsal, &right.dorsal, t),
                        ventral: lerp_points(&left.ventral, &right.ventral, t),
                    });
                }
            }
        }
        i = j;
    }
}

fn lerp_points(a: &[Point], b: &[Point], t: f64) -> Vec<Point> {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| Point {
            x: p.x * (1.0 - t) + q.x * t,
            y: p.y * (1.0 - t) + q.y * t,
        })
        .collect()
}

#[cfg(test)]
mod normalize_tests {
    use super::*;
    use crate::utils::test_utils::{straight_skeleton, straight_worm_recording};

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn malformed_frames_become_missing() {
        let mut raw = straight_worm_recording("bad", 5, 10.0, 9);
        // wrong point count
        raw.frames[1].skeleton = Some(vec![Point { x: 0.0, y: 0.0 }; 3]);
        // non-finite coordinate
        if let Some(skel) = raw.frames[3].skeleton.as_mut() {
            skel[0].x = f64::NAN;
        }
        let mut config = config();
        config.max_gap_frames = 0;
        let ts = normalize(&raw, &config);
        assert!(!ts.is_valid(1));
        assert!(!ts.is_valid(3));
        assert!(ts.is_valid(0));
        assert_eq!(ts.valid_frame_count(), 3);
    }

    #[test]
    fn flipped_frames_are_reoriented_by_continuity() {
        let mut raw = straight_worm_recording("flip", 4, 10.0, 9);
        // hand the tracker output with frames 1 and 3 head/tail swapped
        for idx in [1, 3] {
            raw.frames[idx].skeleton.as_mut().unwrap().reverse();
        }
        let ts = normalize(&raw, &config());
        let head0 = ts.skeleton(0).unwrap()[0];
        for frame in 1..4 {
            let head = ts.skeleton(frame).unwrap()[0];
            assert!(head.distance_to(&head0) < 1e-9);
        }
    }

    #[test]
    fn short_gaps_are_interpolated_long_gaps_stay_missing() {
        let mut raw = straight_worm_recording("gaps", 12, 10.0, 9);
        for idx in [2, 5, 6, 7, 8, 9] {
            raw.frames[idx] = Frame::missing();
        }
        let mut config = config();
        config.max_gap_frames = 2;
        let ts = normalize(&raw, &config);
        assert!(ts.is_valid(2), "single-frame gap should be bridged");
        for idx in 5..=9 {
            assert!(!ts.is_valid(idx), "5-frame gap must stay missing");
        }
    }

    #[test]
    fn interpolated_frame_lies_between_neighbors() {
        let raw = RawRecording {
            label: "lerp".into(),
            fps: 10.0,
            skeleton_points: 9,
            frames: vec![
                Frame {
                    skeleton: Some(straight_skeleton(9, 0.0)),
                    contour: None,
                },
                Frame::missing(),
                Frame {
                    skeleton: Some(straight_skeleton(9, 2.0)),
                    contour: None,
                },
            ],
        };
        let ts = normalize(&raw, &config());
        let mid = ts.skeleton(1).unwrap();
        for (k, p) in mid.iter().enumerate() {
            let left = ts.skeleton(0).unwrap()[k];
            let right = ts.skeleton(2).unwrap()[k];
            approx::assert_relative_eq!(p.y, (left.y + right.y) / 2.0, epsilon = 1e-12);
            approx::assert_relative_eq!(p.x, (left.x + right.x) / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_point_skeletons_are_treated_as_missing() {
        let raw = RawRecording {
            label: "pointless".into(),
            fps: 10.0,
            skeleton_points: 0,
            frames: vec![
                Frame {
                    skeleton: Some(vec![]),
                    contour: None,
                },
                Frame {
                    skeleton: Some(vec![]),
                    contour: None,
                },
            ],
        };
        let ts = normalize(&raw, &config());
        assert!(ts.is_empty());
        assert_eq!(ts.valid_frame_count(), 0);
    }

    #[test]
    fn normalization_is_deterministic() {
        let mut raw = straight_worm_recording("det", 20, 10.0, 9);
        raw.frames[7] = Frame::missing();
        raw.frames[13].skeleton.as_mut().unwrap().reverse();
        let a = normalize(&raw, &config());
        let b = normalize(&raw, &config());
        assert_eq!(a, b);
    }

    #[test]
    fn unresolvable_recording_yields_empty_series() {
        let raw = RawRecording {
            label: "empty".into(),
            fps: 10.0,
            skeleton_points: 9,
            frames: vec![Frame::missing(); 10],
        };
        let ts = normalize(&raw, &config());
        assert!(ts.is_empty());
        assert_eq!(ts.num_frames(), 10);
    }
}
