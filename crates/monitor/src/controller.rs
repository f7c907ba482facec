//! Per-frame session orchestration
//!
//! State machine with three phases: waiting for a face, calibrating
//! thresholds, and tracking. Recalibration triggers (degenerate
//! geometry, prolonged face loss) discard the smoothing window and the
//! threshold set together - stale history must never bleed into a new
//! calibration.

use alerting::{AlarmGate, AlertSound};
use calibration::{CalibrationSession, ThresholdSet};
use face_geometry::{extract_features, FeatureSample};
use feature_buffer::FeatureBuffer;
use tracing::{debug, info, warn};

use crate::classifier::{classify, Alertness};
use crate::config::MonitorConfig;
use crate::detector::LandmarkDetector;
use crate::report::{FrameReport, Phase};

/// EAR and MAR both below this on a single frame signals a broken
/// detector lock rather than a real eyes-closed state.
const DEGENERATE_EPSILON: f64 = 0.01;

enum SessionPhase {
    AwaitingFace,
    Calibrating(CalibrationSession),
    Tracking(ThresholdSet),
}

impl SessionPhase {
    fn kind(&self) -> Phase {
        match self {
            SessionPhase::AwaitingFace => Phase::AwaitingFace,
            SessionPhase::Calibrating(_) => Phase::Calibrating,
            SessionPhase::Tracking(_) => Phase::Tracking,
        }
    }
}

/// Owns the smoothing buffer, the active threshold set, and the alarm
/// gate; everything is touched from one processing stream only.
pub struct SessionController<D, S> {
    config: MonitorConfig,
    detector: D,
    sound: S,
    phase: SessionPhase,
    buffer: FeatureBuffer,
    gate: AlarmGate,
    no_face_streak: u32,
}

impl<D: LandmarkDetector, S: AlertSound> SessionController<D, S> {
    /// Create a session in the awaiting-face phase.
    pub fn new(config: MonitorConfig, detector: D, sound: S) -> Self {
        let buffer = FeatureBuffer::new(config.buffer_capacity);
        Self {
            config,
            detector,
            sound,
            phase: SessionPhase::AwaitingFace,
            buffer,
            gate: AlarmGate::default(),
            no_face_streak: 0,
        }
    }

    /// Session configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Current session phase
    pub fn phase(&self) -> Phase {
        self.phase.kind()
    }

    /// Active thresholds while tracking
    pub fn thresholds(&self) -> Option<ThresholdSet> {
        match &self.phase {
            SessionPhase::Tracking(th) => Some(*th),
            _ => None,
        }
    }

    /// Consume one camera frame: detect, extract, smooth, classify,
    /// and drive the alarm gate. `now` is the capture time in seconds.
    pub fn process_frame(&mut self, image: &D::Image, now: f64) -> FrameReport {
        match self.detector.detect(image) {
            None => self.observe_no_face(now),
            Some(frame) => match extract_features(&frame, now) {
                Ok(sample) => self.observe_sample(sample, now),
                Err(err) => {
                    // Face was found but its geometry is unusable;
                    // skip the frame without touching any history.
                    self.no_face_streak = 0;
                    debug!(%err, "skipping frame");
                    self.maybe_finish_calibration(now);
                    FrameReport::empty(self.phase.kind(), true)
                }
            },
        }
    }

    /// Advance the session with a frame that produced no face.
    ///
    /// Misses only count while tracking; calibration skips face-less
    /// frames without counting them, so a freshly promoted tracking
    /// phase always starts from a zero streak.
    pub fn observe_no_face(&mut self, now: f64) -> FrameReport {
        self.maybe_finish_calibration(now);
        if matches!(self.phase, SessionPhase::Tracking(_)) {
            self.no_face_streak += 1;
            if self.no_face_streak > self.config.no_face_reset_frames {
                info!(
                    frames = self.no_face_streak,
                    "face lost, discarding calibration"
                );
                self.reset_to_awaiting();
            }
        }
        FrameReport::empty(self.phase.kind(), false)
    }

    /// Advance the session with one valid feature sample.
    pub fn observe_sample(&mut self, sample: FeatureSample, now: f64) -> FrameReport {
        self.no_face_streak = 0;
        self.maybe_finish_calibration(now);

        if matches!(self.phase, SessionPhase::Tracking(_))
            && sample.ear < DEGENERATE_EPSILON
            && sample.mar < DEGENERATE_EPSILON
        {
            warn!(
                ear = sample.ear,
                mar = sample.mar,
                "degenerate features, recalibrating"
            );
            self.buffer.reset();
            self.phase = SessionPhase::Calibrating(CalibrationSession::new(
                now,
                self.config.calibration_secs,
            ));
            return Self::calibrating_report(sample, 0.0);
        }

        let thresholds = match &mut self.phase {
            SessionPhase::AwaitingFace => {
                info!("face acquired, starting calibration");
                let mut session = CalibrationSession::new(now, self.config.calibration_secs);
                session.push(&sample);
                let progress = session.progress(now);
                self.phase = SessionPhase::Calibrating(session);
                return Self::calibrating_report(sample, progress);
            }
            SessionPhase::Calibrating(session) => {
                session.push(&sample);
                let progress = session.progress(now);
                return Self::calibrating_report(sample, progress);
            }
            SessionPhase::Tracking(thresholds) => *thresholds,
        };

        self.buffer.push(sample);
        let means = self.buffer.means();
        let state = classify(&means, &thresholds);

        let mut alarm_fired = false;
        if state == Alertness::Drowsy && self.config.sound_enabled && self.gate.try_fire(now) {
            info!(t = now, "sustained drowsiness, firing alert");
            self.sound.play();
            alarm_fired = true;
        }

        let head_off_axis = sample.pitch.abs() > thresholds.pitch
            || sample.roll.abs() > thresholds.roll
            || sample.yaw.abs() > thresholds.yaw;

        FrameReport {
            phase: Phase::Tracking,
            face_detected: true,
            features: Some(sample),
            means: Some(means),
            state: Some(state),
            thresholds: Some(thresholds),
            calibration_progress: None,
            head_off_axis,
            alarm_fired,
        }
    }

    /// Promote a completed calibration window to tracking. Calibration
    /// samples are not reused as live classification history.
    fn maybe_finish_calibration(&mut self, now: f64) {
        let complete = matches!(&self.phase, SessionPhase::Calibrating(s) if s.is_complete(now));
        if !complete {
            return;
        }
        if let SessionPhase::Calibrating(session) =
            std::mem::replace(&mut self.phase, SessionPhase::AwaitingFace)
        {
            let thresholds = session.finish();
            self.buffer.reset();
            self.phase = SessionPhase::Tracking(thresholds);
            info!("tracking started");
        }
    }

    fn reset_to_awaiting(&mut self) {
        self.buffer.reset();
        self.no_face_streak = 0;
        self.phase = SessionPhase::AwaitingFace;
    }

    fn calibrating_report(sample: FeatureSample, progress: f64) -> FrameReport {
        FrameReport {
            phase: Phase::Calibrating,
            face_detected: true,
            features: Some(sample),
            means: None,
            state: None,
            thresholds: None,
            calibration_progress: Some(progress),
            head_off_axis: false,
            alarm_fired: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::ReplayDetector;
    use face_geometry::LandmarkFrame;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct CountingSound(Rc<Cell<u32>>);

    impl AlertSound for CountingSound {
        fn play(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn sample(ear: f64, mar: f64, t: f64) -> FeatureSample {
        FeatureSample {
            ear,
            mar,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            timestamp: t,
        }
    }

    fn controller() -> (SessionController<ReplayDetector, CountingSound>, Rc<Cell<u32>>) {
        let sound = CountingSound::default();
        let fired = sound.0.clone();
        let session = SessionController::new(MonitorConfig::default(), ReplayDetector, sound);
        (session, fired)
    }

    /// Run a full calibration window of resting samples, then one
    /// sample past the window to land in tracking.
    fn calibrate(session: &mut SessionController<ReplayDetector, CountingSound>) {
        for i in 0..20 {
            let report = session.observe_sample(sample(0.32, 0.4, i as f64 * 0.5), i as f64 * 0.5);
            assert_eq!(report.phase, Phase::Calibrating);
        }
        let report = session.observe_sample(sample(0.32, 0.4, 15.0), 15.0);
        assert_eq!(report.phase, Phase::Tracking);
    }

    #[test]
    fn test_first_face_starts_calibration() {
        let (mut session, _) = controller();
        assert_eq!(session.phase(), Phase::AwaitingFace);

        let report = session.observe_sample(sample(0.3, 0.4, 0.0), 0.0);
        assert_eq!(report.phase, Phase::Calibrating);
        assert_eq!(report.calibration_progress, Some(0.0));
        assert_eq!(session.phase(), Phase::Calibrating);
    }

    #[test]
    fn test_sparse_calibration_falls_back_to_defaults() {
        let (mut session, _) = controller();
        for i in 0..5 {
            session.observe_sample(sample(0.3, 0.4, i as f64), i as f64);
        }
        let report = session.observe_sample(sample(0.3, 0.4, 15.2), 15.2);
        assert_eq!(report.phase, Phase::Tracking);
        assert_eq!(report.thresholds, Some(ThresholdSet::fallback()));
    }

    #[test]
    fn test_calibration_derives_subject_thresholds() {
        let (mut session, _) = controller();
        calibrate(&mut session);
        let th = session.thresholds().unwrap();
        assert!((th.ear - 0.32 * 0.85).abs() < 1e-9);
        assert!((th.mar - 0.4 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_completes_on_no_face_frame() {
        let (mut session, _) = controller();
        for i in 0..15 {
            session.observe_sample(sample(0.3, 0.4, i as f64), i as f64);
        }
        let report = session.observe_no_face(16.0);
        assert_eq!(report.phase, Phase::Tracking);
        assert!(!report.face_detected);
    }

    #[test]
    fn test_degenerate_features_force_recalibration() {
        let (mut session, _) = controller();
        calibrate(&mut session);

        let report = session.observe_sample(sample(0.005, 0.004, 16.0), 16.0);
        assert_eq!(report.phase, Phase::Calibrating);
        assert!(session.thresholds().is_none());
    }

    #[test]
    fn test_single_low_signal_does_not_trigger_recalibration() {
        let (mut session, _) = controller();
        calibrate(&mut session);

        // Only both-below-epsilon counts as a broken lock
        let report = session.observe_sample(sample(0.005, 0.4, 16.0), 16.0);
        assert_eq!(report.phase, Phase::Tracking);
    }

    #[test]
    fn test_face_loss_streak_resets_session() {
        let (mut session, _) = controller();
        calibrate(&mut session);

        for _ in 0..30 {
            let report = session.observe_no_face(16.0);
            assert_eq!(report.phase, Phase::Tracking);
        }
        let report = session.observe_no_face(16.1);
        assert_eq!(report.phase, Phase::AwaitingFace);
        assert!(session.thresholds().is_none());
    }

    #[test]
    fn test_calibration_misses_do_not_carry_into_tracking() {
        let (mut session, _) = controller();
        for i in 0..12 {
            session.observe_sample(sample(0.32, 0.4, i as f64), i as f64);
        }
        // A long face-less tail inside the calibration window
        for _ in 0..40 {
            let report = session.observe_no_face(12.5);
            assert_eq!(report.phase, Phase::Calibrating);
        }

        // Window elapses: tracking starts with a fresh streak, so the
        // reset still needs the full run of consecutive misses.
        let report = session.observe_no_face(15.1);
        assert_eq!(report.phase, Phase::Tracking);
        for _ in 0..29 {
            assert_eq!(session.observe_no_face(15.2).phase, Phase::Tracking);
        }
        assert_eq!(session.observe_no_face(15.3).phase, Phase::AwaitingFace);
    }

    #[test]
    fn test_streak_resets_on_detection() {
        let (mut session, _) = controller();
        calibrate(&mut session);

        for _ in 0..25 {
            session.observe_no_face(16.0);
        }
        session.observe_sample(sample(0.32, 0.4, 16.5), 16.5);
        for _ in 0..30 {
            session.observe_no_face(17.0);
        }
        assert_eq!(session.phase(), Phase::Tracking);
    }

    #[test]
    fn test_alarm_fires_and_debounces() {
        let (mut session, fired) = controller();
        calibrate(&mut session);
        // Calibrated thresholds: ear 0.272, mar 0.6

        let report = session.observe_sample(sample(0.1, 0.4, 16.0), 16.0);
        assert_eq!(report.state, Some(Alertness::Drowsy));
        assert!(report.alarm_fired);
        assert_eq!(fired.get(), 1);

        let report = session.observe_sample(sample(0.1, 0.4, 17.5), 17.5);
        assert_eq!(report.state, Some(Alertness::Drowsy));
        assert!(!report.alarm_fired);
        assert_eq!(fired.get(), 1);

        let report = session.observe_sample(sample(0.1, 0.4, 18.1), 18.1);
        assert!(report.alarm_fired);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_muted_session_never_fires() {
        let sound = CountingSound::default();
        let fired = sound.0.clone();
        let config = MonitorConfig {
            sound_enabled: false,
            ..MonitorConfig::default()
        };
        let mut session = SessionController::new(config, ReplayDetector, sound);
        calibrate(&mut session);

        let report = session.observe_sample(sample(0.05, 0.4, 16.0), 16.0);
        assert_eq!(report.state, Some(Alertness::Drowsy));
        assert!(!report.alarm_fired);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn test_head_off_axis_flag_tracks_instantaneous_pose() {
        let (mut session, _) = controller();
        calibrate(&mut session);
        let th = session.thresholds().unwrap();

        let mut turned = sample(0.32, 0.4, 16.0);
        turned.yaw = th.yaw + 1.0;
        let report = session.observe_sample(turned, 16.0);
        assert!(report.head_off_axis);
        // A single turned frame barely moves the smoothed mean
        assert_eq!(report.state, Some(Alertness::Alert));
    }

    #[test]
    fn test_process_frame_no_face_path() {
        let (mut session, _) = controller();
        let report = session.process_frame(&None, 0.0);
        assert!(!report.face_detected);
        assert_eq!(report.phase, Phase::AwaitingFace);
    }

    #[test]
    fn test_process_frame_skips_unusable_geometry() {
        let (mut session, _) = controller();
        // A face with too few landmarks to read any feature from
        let stub = LandmarkFrame::new(vec![[0.5, 0.5]; 10], 640, 480);
        let report = session.process_frame(&Some(stub), 0.0);
        assert!(report.face_detected);
        assert!(report.features.is_none());
        assert_eq!(report.phase, Phase::AwaitingFace);
    }
}
