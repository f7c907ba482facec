//! Landmark frame type and canonical FaceMesh indices

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// FaceMesh indices for the left eye contour, ordered
/// (corner, upper, upper, corner, lower, lower).
pub const LEFT_EYE_IDX: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// FaceMesh indices for the right eye contour, same ordering.
pub const RIGHT_EYE_IDX: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// FaceMesh indices for the six mouth landmarks.
pub mod mouth {
    pub const LEFT_CORNER: usize = 61;
    pub const RIGHT_CORNER: usize = 291;
    pub const TOP_OUTER: usize = 13;
    pub const BOTTOM_OUTER: usize = 14;
    pub const TOP_INNER: usize = 81;
    pub const BOTTOM_INNER: usize = 178;
}

/// FaceMesh indices for the six head-pose reference landmarks.
pub mod pose_points {
    pub const NOSE_TIP: usize = 1;
    pub const CHIN: usize = 199;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_MOUTH: usize = 61;
    pub const RIGHT_MOUTH: usize = 291;
}

/// Highest landmark index the pipeline reads. A frame shorter than this
/// cannot be processed.
pub const MIN_LANDMARKS: usize = 388;

/// One detector frame: normalized landmark positions plus the source
/// image dimensions used to convert them to pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Normalized (x, y) positions, one per tracked landmark.
    pub points: Vec<[f32; 2]>,
    /// Source image width in pixels
    pub width: u32,
    /// Source image height in pixels
    pub height: u32,
}

impl LandmarkFrame {
    /// Create a frame from normalized points and image dimensions.
    pub fn new(points: Vec<[f32; 2]>, width: u32, height: u32) -> Self {
        Self {
            points,
            width,
            height,
        }
    }

    /// Number of landmarks in the frame
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the frame holds no landmarks
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Landmark position in pixel space.
    pub fn point_px(&self, index: usize) -> Result<Vector2<f64>, GeometryError> {
        let p = self
            .points
            .get(index)
            .ok_or(GeometryError::TooFewLandmarks {
                got: self.points.len(),
                need: MIN_LANDMARKS,
            })?;
        Ok(Vector2::new(
            p[0] as f64 * self.width as f64,
            p[1] as f64 * self.height as f64,
        ))
    }

    /// Pixel positions for a fixed set of indices.
    pub fn points_px<const N: usize>(
        &self,
        indices: &[usize; N],
    ) -> Result<[Vector2<f64>; N], GeometryError> {
        let mut out = [Vector2::zeros(); N];
        for (slot, &idx) in out.iter_mut().zip(indices.iter()) {
            *slot = self.point_px(idx)?;
        }
        Ok(out)
    }
}
