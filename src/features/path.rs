//! Path features: quantities of the centroid trajectory across the whole
//! recording. The trajectory is smoothed by short-gap interpolation
//! before use, but output validity always follows the input centroid
//! validity.

use crate::config::AnalysisConfig;
use crate::features::{Feature, FeatureSeries};
use crate::geometry;
use crate::worm::{Point, WormTimeSeries};

pub fn extract(ts: &WormTimeSeries, config: &AnalysisConfig) -> Vec<FeatureSeries> {
    let n = ts.num_frames();
    let centroids = smoothed_centroids(ts, config);

    let mut range = vec![None; n];
    let mut curvature = vec![None; n];
    let mut dwelling = vec![None; n];

    // center of the whole path
    let on_path: Vec<Point> = centroids.iter().flatten().copied().collect();
    if let Some(center) = geometry::centroid(&on_path) {
        for (frame, c) in centroids.iter().enumerate() {
            if let Some(p) = c {
                range[frame] = Some(p.distance_to(&center));
            }
        }
    }

    curvature_along_path(&centroids, config.curvature_window, &mut curvature);

    if let Some(body_length) = ts.mean_body_length() {
        let radius = config.dwell_radius_fraction * body_length;
        dwell_times(&centroids, radius, ts.fps, &mut dwelling);
    }

    // restrict to frames whose own centroid existed (not interpolated)
    for frame in 0..n {
        if !ts.is_valid(frame) {
            range[frame] = None;
            curvature[frame] = None;
            dwelling[frame] = None;
        }
    }

    vec![
        FeatureSeries::from_options(Feature::PathRange, range),
        FeatureSeries::from_options(Feature::PathCurvature, curvature),
        FeatureSeries::from_options(Feature::Dwelling, dwelling),
    ]
}

/// Per-frame skeleton centroids with short missing spans bridged, x and y
/// interpolated independently.
fn smoothed_centroids(ts: &WormTimeSeries, config: &AnalysisConfig) -> Vec<Option<Point>> {
    let xs: Vec<Option<f64>> = (0..ts.num_frames())
        .map(|f| ts.skeleton_centroid(f).map(|p| p.x))
        .collect();
    let ys: Vec<Option<f64>> = (0..ts.num_frames())
        .map(|f| ts.skeleton_centroid(f).map(|p| p.y))
        .collect();
    let xs = geometry::fill_short_gaps(&xs, config.max_gap_frames);
    let ys = geometry::fill_short_gaps(&ys, config.max_gap_frames);
    xs.into_iter()
        .zip(ys)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        })
        .collect()
}

/// Curvature of the trajectory: the turning angle per unit of travelled
/// distance over a window of frames, evaluated on the longest contiguous
/// runs of known centroids.
fn curvature_along_path(centroids: &[Option<Point>], window: usize, out: &mut [Option<f64>]) {
    let n = centroids.len();
    let mut start = 0;
    while start < n {
        if centroids[start].is_none() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < n && centroids[end].is_some() {
            end += 1;
        }
        let run: Vec<Point> = centroids[start..end].iter().flatten().copied().collect();
        for (offset, value) in geometry::curvature(&run, window).into_iter().enumerate() {
            out[start + offset] = value;
        }
        start = end;
    }
}

/// Dwell time per frame: how long (seconds) the centroid stays within
/// `radius` of this frame's position, as the maximal contiguous run of
/// frames around it.
fn dwell_times(centroids: &[Option<Point>], radius: f64, fps: f64, out: &mut [Option<f64>]) {
    let n = centroids.len();
    // The window is centered on each frame's own position, so its bounds
    // are not monotone across frames and must be rescanned per center. A
    // frame whose centroid equals the previous frame's shares its window,
    // which keeps a fully stationary recording linear.
    let mut previous: Option<(Point, usize, usize)> = None;
    for i in 0..n {
        let Some(here) = centroids[i] else {
            previous = None;
            continue;
        };
        if let Some((prev, lo, hi)) = previous {
            if prev.x == here.x && prev.y == here.y {
                out[i] = Some((hi - lo + 1) as f64 / fps);
                continue;
            }
        }
        let mut lo = i;
        while lo > 0 {
            match centroids[lo - 1] {
                Some(p) if p.distance_to(&here) <= radius => lo -= 1,
                _ => break,
            }
        }
        let mut hi = i;
        while hi + 1 < n {
            match centroids[hi + 1] {
                Some(p) if p.distance_to(&here) <= radius => hi += 1,
                _ => break,
            }
        }
        out[i] = Some((hi - lo + 1) as f64 / fps);
        previous = Some((here, lo, hi));
    }
}
