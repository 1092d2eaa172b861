//! Primitive operations on ordered 2-D point sequences and on angles.
//!
//! Everything here is a pure function. Angles are in degrees and always
//! wrapped into (-180, 180]; degenerate geometry (coincident points, zero
//! spans) yields `None` instead of NaN or infinity.

use crate::worm::Point;

const DEGENERATE_NORM: f64 = 1e-12;

/// Cumulative Euclidean distance along an ordered point sequence.
///
/// Same length as the input, first element 0. Non-decreasing by
/// construction.
pub fn arc_length(points: &[Point]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len());
    let mut total = 0.0;
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            total += p.distance_to(&points[i - 1]);
        }
        lengths.push(total);
    }
    lengths
}

/// Wraps an angle in degrees into (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Shortest signed angular difference `a - b`, in (-180, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    wrap_degrees(a - b)
}

/// Signed turning angle at `p2`, in degrees in (-180, 180]: how far the
/// direction p1->p2 rotates to become p2->p3 (positive = counterclockwise).
///
/// Returns `None` when either segment is degenerate (coincident points)
/// rather than producing NaN.
pub fn angle_between(p1: &Point, p2: &Point, p3: &Point) -> Option<f64> {
    let v1 = (p2.x - p1.x, p2.y - p1.y);
    let v2 = (p3.x - p2.x, p3.y - p2.y);
    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if !n1.is_finite() || !n2.is_finite() || n1 < DEGENERATE_NORM || n2 < DEGENERATE_NORM {
        return None;
    }
    let cross = v1.0 * v2.1 - v1.1 * v2.0;
    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    Some(wrap_degrees(cross.atan2(dot).to_degrees()))
}

/// Local curvature estimate along an ordered point sequence: for each
/// interior point the turning angle subtended by the points `window` apart,
/// per unit of arc length between them (degrees per length unit).
///
/// Points within `window` of either end are `None`, never extrapolated.
pub fn curvature(points: &[Point], window: usize) -> Vec<Option<f64>> {
    let n = points.len();
    let mut out = vec![None; n];
    if window == 0 || n < 2 * window + 1 {
        return out;
    }
    let lengths = arc_length(points);
    for i in window..n - window {
        let span = lengths[i + window] - lengths[i - window];
        if span < DEGENERATE_NORM {
            continue;
        }
        out[i] = angle_between(&points[i - window], &points[i], &points[i + window])
            .map(|angle| angle / span);
    }
    out
}

/// Mean of a set of angles (degrees) by vector-sum averaging: each angle
/// becomes a unit vector, the vectors are summed and the mean is the
/// `atan2` of the resultant. The arithmetic mean is wrong for angles that
/// cross the +-180 boundary; this is not.
///
/// `None` for an empty set or when the resultant vanishes (e.g. two
/// opposite angles), where no mean direction exists.
pub fn circular_mean(angles_deg: &[f64]) -> Option<f64> {
    if angles_deg.is_empty() {
        return None;
    }
    let (sum_sin, sum_cos) = angles_deg.iter().fold((0.0, 0.0), |(s, c), a| {
        let r = a.to_radians();
        (s + r.sin(), c + r.cos())
    });
    let magnitude = (sum_sin * sum_sin + sum_cos * sum_cos).sqrt();
    if magnitude < DEGENERATE_NORM * angles_deg.len() as f64 {
        return None;
    }
    Some(wrap_degrees(sum_sin.atan2(sum_cos).to_degrees()))
}

/// Linear interpolation across missing spans of at most `max_gap` samples.
///
/// Only interior gaps with a present value on both sides are filled;
/// leading gaps, trailing gaps and longer spans stay missing. Pure
/// function, the input is untouched.
pub fn fill_short_gaps(series: &[Option<f64>], max_gap: usize) -> Vec<Option<f64>> {
    let mut out = series.to_vec();
    let mut i = 0;
    while i < out.len() {
        if out[i].is_some() {
            i += 1;
            continue;
        }
        // [i, j) is a missing run
        let start = i;
        let mut j = i;
        while j < out.len() && out[j].is_none() {
            j += 1;
        }
        let run = j - start;
        if start > 0 && j < out.len() && run <= max_gap {
            let left = series[start - 1].unwrap();
            let right = series[j].unwrap();
            let span = (run + 1) as f64;
            for (k, slot) in out[start..j].iter_mut().enumerate() {
                let t = (k + 1) as f64 / span;
                *slot = Some(left * (1.0 - t) + right * t);
            }
        }
        i = j;
    }
    out
}

/// Arithmetic centroid of a point set, `None` when empty.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Some(Point {
        x: sum_x / n,
        y: sum_y / n,
    })
}

/// Area of a closed polygon by the shoelace formula (the closing edge from
/// last back to first point is implicit).
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x * q.y - q.x * p.y;
    }
    twice_area.abs() / 2.0
}

/// Signed perpendicular distance of `p` from the infinite line through `a`
/// and `b` (positive on the counterclockwise side). `None` when `a` and
/// `b` coincide.
pub fn perpendicular_distance(p: &Point, a: &Point, b: &Point) -> Option<f64> {
    let axis = (b.x - a.x, b.y - a.y);
    let norm = (axis.0 * axis.0 + axis.1 * axis.1).sqrt();
    if norm < DEGENERATE_NORM {
        return None;
    }
    Some((axis.0 * (p.y - a.y) - axis.1 * (p.x - a.x)) / norm)
}
