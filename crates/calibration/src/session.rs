//! Frame-driven calibration window

use face_geometry::FeatureSample;
use tracing::{info, warn};

use crate::statistics::{median, std_dev};
use crate::thresholds::ThresholdSet;

/// Default calibration window (seconds)
pub const DEFAULT_DURATION_SECS: f64 = 15.0;

/// Minimum valid samples for a computed (non-fallback) threshold set
pub const MIN_SAMPLES: usize = 10;

const EAR_MEDIAN_SCALE: f64 = 0.85;
const MAR_MEDIAN_SCALE: f64 = 1.5;

/// (cap, bias) pairs for the rotational axes: threshold is
/// min(cap, std * 1.5 + bias).
const PITCH_CAP_BIAS: (f64, f64) = (15.0, 5.0);
const ROLL_CAP_BIAS: (f64, f64) = (20.0, 8.0);
const YAW_CAP_BIAS: (f64, f64) = (25.0, 10.0);

/// One calibration attempt: collects valid feature samples for a fixed
/// wall-clock window, then derives a [`ThresholdSet`] from their
/// statistics. Frames without a face or without a pose solution are
/// simply never pushed.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    started_at: f64,
    duration: f64,
    ears: Vec<f64>,
    mars: Vec<f64>,
    pitches: Vec<f64>,
    rolls: Vec<f64>,
    yaws: Vec<f64>,
}

impl CalibrationSession {
    /// Start a calibration window at `now` lasting `duration` seconds.
    pub fn new(now: f64, duration: f64) -> Self {
        info!(duration_secs = duration, "calibrating thresholds");
        Self {
            started_at: now,
            duration,
            ears: Vec::new(),
            mars: Vec::new(),
            pitches: Vec::new(),
            rolls: Vec::new(),
            yaws: Vec::new(),
        }
    }

    /// Record one valid feature sample.
    pub fn push(&mut self, sample: &FeatureSample) {
        self.ears.push(sample.ear);
        self.mars.push(sample.mar);
        self.pitches.push(sample.pitch);
        self.rolls.push(sample.roll);
        self.yaws.push(sample.yaw);
    }

    /// Number of samples collected so far
    pub fn sample_count(&self) -> usize {
        self.ears.len()
    }

    /// Fraction of the window elapsed, clamped to [0, 1].
    pub fn progress(&self, now: f64) -> f64 {
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0)
    }

    /// Whether the wall-clock window has elapsed.
    pub fn is_complete(&self, now: f64) -> bool {
        now - self.started_at >= self.duration
    }

    /// Consume the session and derive thresholds.
    ///
    /// Falls back to the fixed default set when fewer than
    /// [`MIN_SAMPLES`] valid samples were collected; the fallback is
    /// logged as a warning, never surfaced as an error.
    pub fn finish(self) -> ThresholdSet {
        if self.ears.len() < MIN_SAMPLES {
            warn!(
                samples = self.ears.len(),
                "not enough calibration data, using default thresholds"
            );
            return ThresholdSet::fallback();
        }

        let thresholds = ThresholdSet {
            ear: median(&self.ears) * EAR_MEDIAN_SCALE,
            mar: median(&self.mars) * MAR_MEDIAN_SCALE,
            pitch: axis_threshold(&self.pitches, PITCH_CAP_BIAS),
            roll: axis_threshold(&self.rolls, ROLL_CAP_BIAS),
            yaw: axis_threshold(&self.yaws, YAW_CAP_BIAS),
        };

        info!(
            ear = format_args!("{:.3}", thresholds.ear),
            mar = format_args!("{:.3}", thresholds.mar),
            pitch = format_args!("{:.1}", thresholds.pitch),
            roll = format_args!("{:.1}", thresholds.roll),
            yaw = format_args!("{:.1}", thresholds.yaw),
            "calibration complete"
        );
        thresholds
    }
}

fn axis_threshold(values: &[f64], (cap, bias): (f64, f64)) -> f64 {
    (std_dev(values) * 1.5 + bias).min(cap)
}
