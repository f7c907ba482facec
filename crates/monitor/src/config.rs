//! Session configuration

use calibration::DEFAULT_DURATION_SECS;
use feature_buffer::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Session-level configuration, fixed at session start and immutable
/// for the life of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Requested capture width (consumed by the capture glue)
    pub camera_width: u32,

    /// Requested capture height (consumed by the capture glue)
    pub camera_height: u32,

    /// Smoothing window capacity in frames
    pub buffer_capacity: usize,

    /// Calibration window length (seconds)
    pub calibration_secs: f64,

    /// Consecutive no-face frames before the session resets and waits
    /// for a new face
    pub no_face_reset_frames: u32,

    /// Whether the audible alert is enabled
    pub sound_enabled: bool,

    /// Alert sound asset (consumed by the audio glue)
    pub alert_asset: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera_width: 960,
            camera_height: 540,
            buffer_capacity: DEFAULT_CAPACITY,
            calibration_secs: DEFAULT_DURATION_SECS,
            no_face_reset_frames: 30,
            sound_enabled: true,
            alert_asset: PathBuf::from("assets/alarm.wav"),
        }
    }
}
