//! Drowsiness Monitor Core
//!
//! Per-frame orchestration of the feature-to-state pipeline:
//! landmark detection (external seam) -> feature extraction ->
//! temporal smoothing -> threshold classification -> alarm debounce.
//! One frame is fully consumed before the next is accepted; the only
//! work that escapes the stream is the fire-and-forget alert sound.

pub mod classifier;
pub mod config;
pub mod controller;
pub mod detector;
pub mod report;

pub use classifier::{classify, Alertness};
pub use config::MonitorConfig;
pub use controller::SessionController;
pub use detector::{LandmarkDetector, ReplayDetector};
pub use report::{FrameReport, Phase};
