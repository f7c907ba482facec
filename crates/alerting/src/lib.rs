//! Alerting
//!
//! Provides the alarm debounce gate and the isolated audio side effect.
//! Playback is fire-and-forget: the processing stream never waits on
//! it, and a playback failure never feeds back into classification.

mod gate;
mod sound;

pub use gate::{AlarmGate, DEFAULT_COOLDOWN_SECS};
pub use sound::{AlertSound, AudioError, MutedAlert, WavAlert};
