//! Eye and mouth aspect ratios

use nalgebra::Vector2;

use crate::landmarks::{mouth, LandmarkFrame, LEFT_EYE_IDX, RIGHT_EYE_IDX};
use crate::GeometryError;

/// Eye aspect ratio for a six-point eye contour ordered
/// [p1, p2, p3, p4, p5, p6] with p1/p4 the horizontal corners.
///
/// EAR = (|p2 - p6| + |p3 - p5|) / (2 * |p1 - p4|)
///
/// Returns 0.0 when the corner distance is zero.
pub fn eye_aspect_ratio(pts: &[Vector2<f64>; 6]) -> f64 {
    let a = (pts[1] - pts[5]).norm();
    let b = (pts[2] - pts[4]).norm();
    let c = (pts[0] - pts[3]).norm();
    if c == 0.0 {
        return 0.0;
    }
    (a + b) / (2.0 * c)
}

/// Mean EAR over both eyes of a landmark frame.
pub fn mean_eye_aspect_ratio(frame: &LandmarkFrame) -> Result<f64, GeometryError> {
    let left = frame.points_px(&LEFT_EYE_IDX)?;
    let right = frame.points_px(&RIGHT_EYE_IDX)?;
    Ok((eye_aspect_ratio(&left) + eye_aspect_ratio(&right)) / 2.0)
}

/// Mouth aspect ratio: mean of the outer and inner lip gaps over the
/// corner-to-corner width.
pub fn mouth_aspect_ratio(frame: &LandmarkFrame) -> Result<f64, GeometryError> {
    let left = frame.point_px(mouth::LEFT_CORNER)?;
    let right = frame.point_px(mouth::RIGHT_CORNER)?;
    let top_outer = frame.point_px(mouth::TOP_OUTER)?;
    let bottom_outer = frame.point_px(mouth::BOTTOM_OUTER)?;
    let top_inner = frame.point_px(mouth::TOP_INNER)?;
    let bottom_inner = frame.point_px(mouth::BOTTOM_INNER)?;

    let vertical = ((top_outer - bottom_outer).norm() + (top_inner - bottom_inner).norm()) / 2.0;
    let horizontal = (left - right).norm();
    if horizontal == 0.0 {
        return Err(GeometryError::ZeroMouthWidth);
    }
    Ok(vertical / horizontal)
}
