//! Alarm debounce gate

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum interval between alert firings (seconds)
pub const DEFAULT_COOLDOWN_SECS: f64 = 2.0;

/// Two-state debounce gate: `armed` until a fire, then `cooling_down`
/// until strictly more than the cooldown interval has elapsed.
///
/// The fire time advances on every granted fire attempt, regardless of
/// whether the downstream sound actually played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmGate {
    last_fired_at: f64,
    cooldown_secs: f64,
}

impl AlarmGate {
    /// Create a gate with the given cooldown interval.
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            last_fired_at: f64::NEG_INFINITY,
            cooldown_secs,
        }
    }

    /// Whether the gate would grant a fire at `now`.
    pub fn is_armed(&self, now: f64) -> bool {
        now - self.last_fired_at > self.cooldown_secs
    }

    /// Request a fire at `now`. Returns true and starts the cooldown
    /// when armed; returns false while cooling down.
    pub fn try_fire(&mut self, now: f64) -> bool {
        if !self.is_armed(now) {
            debug!(
                elapsed = now - self.last_fired_at,
                "alert suppressed: cooling down"
            );
            return false;
        }
        self.last_fired_at = now;
        true
    }

    /// Time of the last granted fire, negative infinity if never fired.
    pub fn last_fired_at(&self) -> f64 {
        self.last_fired_at
    }
}

impl Default for AlarmGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fire_always_granted() {
        let mut gate = AlarmGate::default();
        assert!(gate.is_armed(0.0));
        assert!(gate.try_fire(0.0));
    }

    #[test]
    fn test_debounce_timeline() {
        // Fires at t=0 and t=2.1; the t=1.5 attempt is suppressed.
        let mut gate = AlarmGate::default();
        assert!(gate.try_fire(0.0));
        assert!(!gate.try_fire(1.5));
        assert!(gate.try_fire(2.1));
        assert_eq!(gate.last_fired_at(), 2.1);
    }

    #[test]
    fn test_cooldown_boundary_is_strict() {
        let mut gate = AlarmGate::default();
        assert!(gate.try_fire(0.0));
        // Exactly 2.0s elapsed is still cooling down
        assert!(!gate.try_fire(2.0));
        assert!(gate.try_fire(2.0 + 1e-9));
    }

    #[test]
    fn test_suppressed_attempt_does_not_extend_cooldown() {
        let mut gate = AlarmGate::default();
        assert!(gate.try_fire(0.0));
        assert!(!gate.try_fire(1.9));
        assert!(gate.try_fire(2.5));
    }
}
