//! Threshold Calibration
//!
//! Derives subject-specific classification thresholds from a short
//! observation window at session start. EAR/MAR thresholds anchor to
//! the subject's resting eye and mouth geometry (medians, robust to
//! blinks); rotational thresholds anchor to natural head-motion
//! variance, capped so a jittery calibration cannot loosen them into
//! uselessness.

mod session;
mod statistics;
mod thresholds;

pub use session::{CalibrationSession, DEFAULT_DURATION_SECS, MIN_SAMPLES};
pub use statistics::{median, std_dev};
pub use thresholds::ThresholdSet;
