//! Core data model: per-frame skeleton/contour data and the normalized,
//! orientation-resolved time series every extractor consumes.

pub mod normalize;

use serde::{Deserialize, Serialize};

use crate::geometry;

/// A 2-D point in the recording's spatial units (typically microns).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Closed boundary of the worm in one frame, split into the two sides
/// running head to tail. The closed polygon is dorsal followed by the
/// reversed ventral side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourFrame {
    pub dorsal: Vec<Point>,
    pub ventral: Vec<Point>,
}

/// One time instant. Skeleton and contour can be missing independently;
/// a missing part is an explicit `None`, never a dropped frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Ordered midline points, head first. `None` when the worm was not
    /// segmented in this frame.
    pub skeleton: Option<Vec<Point>>,
    pub contour: Option<ContourFrame>,
}

impl Frame {
    pub fn missing() -> Self {
        Frame {
            skeleton: None,
            contour: None,
        }
    }
}

/// Raw per-recording data as handed over by the segmentation stage,
/// before orientation resolution and gap filling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecording {
    pub label: String,
    /// Frames per second.
    pub fps: f64,
    /// Expected number of skeleton points per frame (49 for the usual
    /// tracker output). Frames with a different count are malformed.
    pub skeleton_points: usize,
    pub frames: Vec<Frame>,
}

/// Normalized, orientation-resolved, gap-filled time series. Constructed
/// once per recording by [`normalize::normalize`] and immutable after.
///
/// Frame indices are contiguous; the validity mask is the set of frames
/// with a usable skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WormTimeSeries {
    pub label: String,
    pub fps: f64,
    pub skeleton_points: usize,
    pub frames: Vec<Frame>,
}

impl WormTimeSeries {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn skeleton(&self, frame: usize) -> Option<&[Point]> {
        self.frames.get(frame)?.skeleton.as_deref()
    }

    pub fn contour(&self, frame: usize) -> Option<&ContourFrame> {
        self.frames.get(frame)?.contour.as_ref()
    }

    pub fn is_valid(&self, frame: usize) -> bool {
        self.skeleton(frame).is_some()
    }

    pub fn valid_mask(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.skeleton.is_some()).collect()
    }

    pub fn valid_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.skeleton.is_some()).count()
    }

    /// True when not a single frame has a usable skeleton.
    pub fn is_empty(&self) -> bool {
        self.valid_frame_count() == 0
    }

    /// Centroid of the skeleton in one frame.
    pub fn skeleton_centroid(&self, frame: usize) -> Option<Point> {
        geometry::centroid(self.skeleton(frame)?)
    }

    /// Mean skeleton arc length over all valid frames. `None` for an
    /// empty series.
    pub fn mean_body_length(&self) -> Option<f64> {
        let mut total = 0.0;
        let mut count = 0usize;
        for frame in &self.frames {
            if let Some(skeleton) = &frame.skeleton {
                if let Some(last) = geometry::arc_length(skeleton).last() {
                    total += last;
                    count += 1;
                }
            }
        }
        if count == 0 {
            None
        } else {
            Some(total / count as f64)
        }
    }
}
