//! FIFO feature window implementation

use face_geometry::FeatureSample;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default window size (150 frames, ~5s at 30fps)
pub const DEFAULT_CAPACITY: usize = 150;

/// Per-channel arithmetic means over the current window contents.
///
/// Every channel is 0.0 while the window is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMeans {
    pub ear: f64,
    pub mar: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// Fixed-capacity FIFO buffer of feature samples.
///
/// Samples stay time-ordered by insertion; once full, the oldest is
/// evicted on every push. Owned and mutated by a single processing
/// stream, so no interior synchronisation is needed.
#[derive(Debug, Clone)]
pub struct FeatureBuffer {
    samples: VecDeque<FeatureSample>,
    capacity: usize,
}

impl FeatureBuffer {
    /// Create a buffer with the given capacity (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Create a buffer with the default capacity (150 samples).
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append a sample, evicting the oldest when at capacity.
    pub fn push(&mut self, sample: FeatureSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drop all history. Used on recalibration and prolonged face loss.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.samples.len() as f64 / self.capacity as f64
    }

    /// Arithmetic mean of each feature channel over the window.
    pub fn means(&self) -> FeatureMeans {
        if self.samples.is_empty() {
            return FeatureMeans::default();
        }

        let n = self.samples.len() as f64;
        let mut sums = FeatureMeans::default();
        for s in &self.samples {
            sums.ear += s.ear;
            sums.mar += s.mar;
            sums.pitch += s.pitch;
            sums.roll += s.roll;
            sums.yaw += s.yaw;
        }

        FeatureMeans {
            ear: sums.ear / n,
            mar: sums.mar / n,
            pitch: sums.pitch / n,
            roll: sums.roll / n,
            yaw: sums.yaw / n,
        }
    }
}

impl Default for FeatureBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
