//! Facial Landmark Geometry
//!
//! Turns a single frame of normalized 2D face landmarks into the scalar
//! signals the drowsiness pipeline consumes:
//! - Eye aspect ratio (EAR) - drops sharply when the eyes close
//! - Mouth aspect ratio (MAR) - rises during yawns
//! - Head pose (pitch, yaw, roll) via an iterative PnP solve

pub mod landmarks;
pub mod pose;
pub mod ratios;

pub use landmarks::{LandmarkFrame, LEFT_EYE_IDX, RIGHT_EYE_IDX};
pub use pose::HeadPose;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geometry error types
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("frame has {got} landmarks, need at least {need}")]
    TooFewLandmarks { got: usize, need: usize },

    #[error("mouth corner distance is zero")]
    ZeroMouthWidth,

    #[error("head pose solve did not converge")]
    PoseSolveFailed,
}

/// One frame's worth of derived facial features.
///
/// Angles are in degrees, normalized into [-180, 180). The timestamp is
/// the capture time in seconds, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSample {
    pub ear: f64,
    pub mar: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
    pub timestamp: f64,
}

/// Derive a [`FeatureSample`] from one landmark frame.
///
/// Pure function: no state is carried between frames. A frame whose
/// mouth width is degenerate or whose pose solve fails is reported as
/// an error so the caller can skip it.
pub fn extract_features(
    frame: &LandmarkFrame,
    timestamp: f64,
) -> Result<FeatureSample, GeometryError> {
    let ear = ratios::mean_eye_aspect_ratio(frame)?;
    let mar = ratios::mouth_aspect_ratio(frame)?;
    let pose = pose::head_pose_angles(frame)?;

    Ok(FeatureSample {
        ear,
        mar,
        pitch: pose.pitch,
        yaw: pose.yaw,
        roll: pose.roll,
        timestamp,
    })
}
