//! Per-frame session output

use calibration::ThresholdSet;
use face_geometry::FeatureSample;
use feature_buffer::FeatureMeans;
use serde::{Deserialize, Serialize};

use crate::classifier::Alertness;

/// Which stage of the session the frame was processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingFace,
    Calibrating,
    Tracking,
}

/// Everything the surrounding application (HUD, audio glue) needs
/// about one processed frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    /// Session phase after processing this frame
    pub phase: Phase,

    /// Whether the detector found a face in this frame
    pub face_detected: bool,

    /// Raw features for this frame, when extraction succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureSample>,

    /// Smoothed means the classification was computed from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub means: Option<FeatureMeans>,

    /// Classification, present only while tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Alertness>,

    /// Active thresholds, present only while tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdSet>,

    /// Calibration progress in [0, 1], present only while calibrating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration_progress: Option<f64>,

    /// Instantaneous head rotation beyond threshold on this frame,
    /// independent of the smoothed classification (HUD indicator)
    pub head_off_axis: bool,

    /// Whether the alarm fired on this frame
    pub alarm_fired: bool,
}

impl FrameReport {
    /// Bare report for a frame that produced no usable features.
    pub(crate) fn empty(phase: Phase, face_detected: bool) -> Self {
        Self {
            phase,
            face_detected,
            features: None,
            means: None,
            state: None,
            thresholds: None,
            calibration_progress: None,
            head_off_axis: false,
            alarm_fired: false,
        }
    }
}
