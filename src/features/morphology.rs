//! Morphology features: quantities of a single frame's skeleton and
//! contour. Invalid wherever the frame is missing (and, for contour-based
//! features, wherever the contour is missing).

use crate::features::{BodyRegion, Feature, FeatureSeries};
use crate::geometry;
use crate::worm::{ContourFrame, Point, WormTimeSeries};

pub fn extract(ts: &WormTimeSeries) -> Vec<FeatureSeries> {
    let n = ts.num_frames();
    let mut length = Vec::with_capacity(n);
    let mut area = Vec::with_capacity(n);
    let mut width_head = Vec::with_capacity(n);
    let mut width_midbody = Vec::with_capacity(n);
    let mut width_tail = Vec::with_capacity(n);

    for frame in 0..n {
        let skeleton = ts.skeleton(frame);
        length.push(skeleton.and_then(|s| geometry::arc_length(s).last().copied()));

        // contour-based features additionally need the contour
        let contour = if skeleton.is_some() {
            ts.contour(frame)
        } else {
            None
        };
        area.push(contour.map(contour_area));
        width_head.push(contour.and_then(|c| region_width(c, BodyRegion::Head)));
        width_midbody.push(contour.and_then(|c| region_width(c, BodyRegion::Midbody)));
        width_tail.push(contour.and_then(|c| region_width(c, BodyRegion::Tail)));
    }

    vec![
        FeatureSeries::from_options(Feature::Length, length),
        FeatureSeries::from_options(Feature::Area, area),
        FeatureSeries::from_options(Feature::WidthHead, width_head),
        FeatureSeries::from_options(Feature::WidthMidbody, width_midbody),
        FeatureSeries::from_options(Feature::WidthTail, width_tail),
    ]
}

/// Enclosed area of the closed boundary: dorsal side head-to-tail, then
/// the ventral side walked back.
fn contour_area(sides: &ContourFrame) -> f64 {
    let mut polygon: Vec<Point> = sides.dorsal.clone();
    polygon.extend(sides.ventral.iter().rev().copied());
    geometry::polygon_area(&polygon)
}

/// Mean dorsal-to-ventral distance over one body region. The two sides
/// may be sampled at different resolutions, so the ventral partner of a
/// dorsal point is looked up by body fraction.
fn region_width(sides: &ContourFrame, region: BodyRegion) -> Option<f64> {
    let dorsal = &sides.dorsal;
    let ventral = &sides.ventral;
    if dorsal.len() < 2 || ventral.len() < 2 {
        return None;
    }
    let range = region.index_range(dorsal.len());
    if range.is_empty() {
        return None;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for i in range {
        let fraction = i as f64 / (dorsal.len() - 1) as f64;
        let j = (fraction * (ventral.len() - 1) as f64).round() as usize;
        total += dorsal[i].distance_to(&ventral[j]);
        count += 1;
    }
    Some(total / count as f64)
}
