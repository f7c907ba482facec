//! Temporal Feature Buffer
//!
//! Fixed-capacity FIFO window over recent feature samples. Smoothing
//! the per-frame signals over this window is what keeps a single blink
//! or head twitch from flipping the classification.

mod buffer;

pub use buffer::{FeatureBuffer, FeatureMeans, DEFAULT_CAPACITY};
