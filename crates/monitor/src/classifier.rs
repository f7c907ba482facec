//! Threshold classification

use calibration::ThresholdSet;
use feature_buffer::FeatureMeans;
use serde::{Deserialize, Serialize};

/// Widening factor for the EAR early-warning band. Eye closure between
/// the calibrated threshold and 1.1x of it reads as slightly drowsy
/// before any pose check; pose deviation has no equivalent band since
/// eyelid closure is the primary signal and pose only corroborates.
pub const EAR_WARNING_BAND: f64 = 1.1;

/// Alertness classification, recomputed every frame from the smoothed
/// features. Carries no memory beyond the smoothing window itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alertness {
    #[default]
    Alert,
    SlightlyDrowsy,
    Drowsy,
}

impl std::fmt::Display for Alertness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Alertness::Alert => "alert",
            Alertness::SlightlyDrowsy => "slightly_drowsy",
            Alertness::Drowsy => "drowsy",
        };
        f.write_str(s)
    }
}

/// Classify smoothed features against a threshold set.
///
/// Eye/mouth closure dominates: it is checked before any head-pose
/// deviation, so a closed eye reads as drowsy even with the head held
/// perfectly straight.
pub fn classify(means: &FeatureMeans, thresholds: &ThresholdSet) -> Alertness {
    if means.ear < thresholds.ear || means.mar > thresholds.mar {
        return Alertness::Drowsy;
    }
    if means.ear < thresholds.ear * EAR_WARNING_BAND
        || means.pitch.abs() > thresholds.pitch
        || means.roll.abs() > thresholds.roll
        || means.yaw.abs() > thresholds.yaw
    {
        return Alertness::SlightlyDrowsy;
    }
    Alertness::Alert
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ThresholdSet {
        ThresholdSet {
            ear: 0.25,
            mar: 0.6,
            pitch: 10.0,
            roll: 12.0,
            yaw: 15.0,
        }
    }

    fn alert_means() -> FeatureMeans {
        FeatureMeans {
            ear: 0.35,
            mar: 0.3,
            pitch: 2.0,
            roll: 1.0,
            yaw: -3.0,
        }
    }

    #[test]
    fn test_alert_in_range() {
        assert_eq!(classify(&alert_means(), &thresholds()), Alertness::Alert);
    }

    #[test]
    fn test_low_ear_is_drowsy() {
        let means = FeatureMeans {
            ear: 0.2,
            ..alert_means()
        };
        assert_eq!(classify(&means, &thresholds()), Alertness::Drowsy);
    }

    #[test]
    fn test_high_mar_is_drowsy() {
        let means = FeatureMeans {
            mar: 0.7,
            ..alert_means()
        };
        assert_eq!(classify(&means, &thresholds()), Alertness::Drowsy);
    }

    #[test]
    fn test_ear_warning_band() {
        // Between ear_thresh and ear_thresh * 1.1
        let means = FeatureMeans {
            ear: 0.26,
            ..alert_means()
        };
        assert_eq!(classify(&means, &thresholds()), Alertness::SlightlyDrowsy);
    }

    #[test]
    fn test_pose_deviation_is_slightly_drowsy() {
        for means in [
            FeatureMeans {
                pitch: -11.0,
                ..alert_means()
            },
            FeatureMeans {
                roll: 13.0,
                ..alert_means()
            },
            FeatureMeans {
                yaw: -16.0,
                ..alert_means()
            },
        ] {
            assert_eq!(classify(&means, &thresholds()), Alertness::SlightlyDrowsy);
        }
    }

    #[test]
    fn test_eye_closure_dominates_pose() {
        // Drowsy EAR with wild pose still classifies as drowsy
        let means = FeatureMeans {
            ear: 0.1,
            pitch: 50.0,
            ..alert_means()
        };
        assert_eq!(classify(&means, &thresholds()), Alertness::Drowsy);
    }

    #[test]
    fn test_monotonic_in_ear() {
        let th = thresholds();
        let mut ear = 0.5;
        let mut last = classify(
            &FeatureMeans {
                ear,
                ..alert_means()
            },
            &th,
        );
        while ear > 0.0 {
            ear -= 0.01;
            let state = classify(
                &FeatureMeans {
                    ear,
                    ..alert_means()
                },
                &th,
            );
            // Decreasing EAR never moves the state back toward alert
            let rank = |s: Alertness| match s {
                Alertness::Alert => 0,
                Alertness::SlightlyDrowsy => 1,
                Alertness::Drowsy => 2,
            };
            assert!(rank(state) >= rank(last));
            last = state;
        }
        assert_eq!(last, Alertness::Drowsy);
    }
}
