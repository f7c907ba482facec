//! Landmark detector seam
//!
//! The face-landmark detector is an external capability: the core only
//! depends on this trait. A detector returns at most one face's
//! landmarks per frame (single-subject system) or `None` when no face
//! is found - an expected outcome, not an error.

use face_geometry::LandmarkFrame;

/// Per-frame landmark detection over some image type.
pub trait LandmarkDetector {
    /// The image type the detector consumes.
    type Image;

    /// Detect the subject's landmarks in one frame, or `None` when no
    /// face is visible.
    fn detect(&mut self, image: &Self::Image) -> Option<LandmarkFrame>;
}

/// Detector over pre-computed landmark frames, used for recorded
/// replays and tests where detection already happened upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayDetector;

impl LandmarkDetector for ReplayDetector {
    type Image = Option<LandmarkFrame>;

    fn detect(&mut self, image: &Self::Image) -> Option<LandmarkFrame> {
        image.clone()
    }
}
