//! Synthetic recordings for tests: straight worms, sine-bending worms,
//! and small frame manipulation helpers.

use crate::worm::{ContourFrame, Frame, Point, RawRecording};

/// Straight skeleton along +x, head first at x = 0, unit point spacing.
pub fn straight_skeleton(num_points: usize, y: f64) -> Vec<Point> {
    (0..num_points)
        .map(|i| Point { x: i as f64, y })
        .collect()
}

/// Skeleton of a worm whose every joint turns by `joint_bend_deg`
/// (degrees), head first at the origin, unit segment length.
pub fn bent_skeleton(num_points: usize, joint_bend_deg: f64) -> Vec<Point> {
    let mut points = Vec::with_capacity(num_points);
    let mut heading: f64 = 0.0;
    let mut current = Point { x: 0.0, y: 0.0 };
    points.push(current);
    for _ in 1..num_points {
        current = Point {
            x: current.x + heading.to_radians().cos(),
            y: current.y + heading.to_radians().sin(),
        };
        points.push(current);
        heading += joint_bend_deg;
    }
    points
}

/// Contour for a skeleton: both sides offset along the local normal with
/// a half-sine width profile (tapered to zero at head and tail), so the
/// closed outline has positive area.
pub fn contour_for(skeleton: &[Point], max_width: f64) -> ContourFrame {
    let n = skeleton.len();
    let mut dorsal = Vec::with_capacity(n);
    let mut ventral = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &skeleton[i.saturating_sub(1)];
        let next = &skeleton[(i + 1).min(n - 1)];
        let (mut tx, mut ty) = (next.x - prev.x, next.y - prev.y);
        let norm = (tx * tx + ty * ty).sqrt();
        if norm > 1e-12 {
            tx /= norm;
            ty /= norm;
        }
        let fraction = i as f64 / (n - 1) as f64;
        let half_width = max_width / 2.0 * (std::f64::consts::PI * fraction).sin();
        dorsal.push(Point {
            x: skeleton[i].x - ty * half_width,
            y: skeleton[i].y + tx * half_width,
        });
        ventral.push(Point {
            x: skeleton[i].x + ty * half_width,
            y: skeleton[i].y - tx * half_width,
        });
    }
    ContourFrame { dorsal, ventral }
}

/// A static straight worm with contour, identical in every frame.
pub fn straight_worm_recording(
    label: &str,
    num_frames: usize,
    fps: f64,
    num_points: usize,
) -> RawRecording {
    let skeleton = straight_skeleton(num_points, 0.0);
    let contour = contour_for(&skeleton, 2.0);
    RawRecording {
        label: label.to_string(),
        fps,
        skeleton_points: num_points,
        frames: vec![
            Frame {
                skeleton: Some(skeleton),
                contour: Some(contour),
            };
            num_frames
        ],
    }
}

/// A worm whose per-joint bend follows a sine wave over time:
/// `joint_bend(t) = amplitude_deg * sin(2 pi t / (period_s * fps))`.
pub fn sine_worm_recording(
    label: &str,
    num_frames: usize,
    fps: f64,
    num_points: usize,
    amplitude_deg: f64,
    period_s: f64,
) -> RawRecording {
    let frames = (0..num_frames)
        .map(|t| {
            let phase = 2.0 * std::f64::consts::PI * t as f64 / (period_s * fps);
            let skeleton = bent_skeleton(num_points, amplitude_deg * phase.sin());
            let contour = contour_for(&skeleton, 2.0);
            Frame {
                skeleton: Some(skeleton),
                contour: Some(contour),
            }
        })
        .collect();
    RawRecording {
        label: label.to_string(),
        fps,
        skeleton_points: num_points,
        frames,
    }
}

/// Copy of a frame with skeleton and contour translated by (dx, dy).
pub fn translated(frame: &Frame, dx: f64, dy: f64) -> Frame {
    let shift = |points: &[Point]| -> Vec<Point> {
        points
            .iter()
            .map(|p| Point {
                x: p.x + dx,
                y: p.y + dy,
            })
            .collect()
    };
    Frame {
        skeleton: frame.skeleton.as_ref().map(|s| shift(s)),
        contour: frame.contour.as_ref().map(|c| ContourFrame {
            dorsal: shift(&c.dorsal),
            ventral: shift(&c.ventral),
        }),
    }
}
