//! The shared simulation clock multiplier.
//!
//! Pausing the game freezes every time-dependent system at once. Instead of
//! a hidden engine-wide variable, the multiplier is an explicit value owned by
//! the level and folded into the [`FrameTime`] every component receives.

use serde::{Deserialize, Serialize};

/// Scale applied to raw frame time. `0.0` freezes the simulation, `1.0` runs
/// it at normal speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockMultiplier(f32);

impl ClockMultiplier {
    /// Normal speed.
    pub const NORMAL: ClockMultiplier = ClockMultiplier(1.0);
    /// Frozen.
    pub const FROZEN: ClockMultiplier = ClockMultiplier(0.0);

    /// Current scale factor.
    pub fn scale(self) -> f32 {
        self.0
    }

    /// Set the scale. Negative or non-finite values are treated as frozen.
    pub fn set(&mut self, scale: f32) {
        self.0 = if scale.is_finite() && scale > 0.0 { scale } else { 0.0 };
    }

    /// Whether the clock is currently frozen.
    pub fn is_frozen(self) -> bool {
        self.0 == 0.0
    }
}

impl Default for ClockMultiplier {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Time information handed to every system for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Unscaled wall-clock step in seconds.
    pub raw_dt: f32,
    /// Clock multiplier in effect for this tick.
    pub scale: f32,
}

impl FrameTime {
    /// Build a frame time from a raw step and the current multiplier.
    pub fn new(raw_dt: f32, clock: ClockMultiplier) -> Self {
        Self {
            raw_dt,
            scale: clock.scale(),
        }
    }

    /// The step gameplay components should advance by.
    pub fn scaled(self) -> f32 {
        self.raw_dt * self.scale
    }

    /// Whether time stands still this tick.
    pub fn is_frozen(self) -> bool {
        self.scaled() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frozen_clock_yields_zero_step() {
        let frame = FrameTime::new(0.016, ClockMultiplier::FROZEN);
        assert_eq!(frame.scaled(), 0.0);
        assert!(frame.is_frozen());
    }

    #[test]
    fn set_rejects_negative_scale() {
        let mut clock = ClockMultiplier::NORMAL;
        clock.set(-2.0);
        assert!(clock.is_frozen());
        clock.set(f32::NAN);
        assert!(clock.is_frozen());
        clock.set(0.5);
        assert_eq!(FrameTime::new(0.2, clock).scaled(), 0.1);
    }
}
