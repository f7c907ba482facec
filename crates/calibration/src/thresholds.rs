//! Threshold set value type

use serde::{Deserialize, Serialize};

/// Subject-specific classification thresholds.
///
/// Produced wholesale by calibration and replaced wholesale on
/// recalibration; never mutated field-by-field in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    /// Mean EAR below this reads as eye closure (ratio in (0, 1))
    pub ear: f64,
    /// Mean MAR above this reads as yawning
    pub mar: f64,
    /// Absolute mean pitch beyond this reads as head off axis (degrees)
    pub pitch: f64,
    /// Absolute mean roll beyond this reads as head off axis (degrees)
    pub roll: f64,
    /// Absolute mean yaw beyond this reads as head off axis (degrees)
    pub yaw: f64,
}

impl ThresholdSet {
    /// Fixed fallback used when calibration gathers too little data.
    pub fn fallback() -> Self {
        Self {
            ear: 0.3,
            mar: 0.6,
            pitch: 12.0,
            roll: 15.0,
            yaw: 20.0,
        }
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self::fallback()
    }
}
