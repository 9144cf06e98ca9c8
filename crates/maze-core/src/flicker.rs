//! Torch and lamp flicker.
//!
//! Two modes are supported. `Random` holds a random intensity drawn from
//! `[min, max]` for `duration` seconds at a time. `Curve` plays a looping
//! piecewise-linear keyframe curve. Random draws come from a seeded
//! [`Pcg32`] so replays see the same flicker.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::MazeError;

/// Emission brightness per unit of light intensity.
pub const INTENSITY_TO_EMISSION: f32 = 2.0 / 3.0;

/// One keyframe of an intensity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Seconds from the start of the loop.
    pub time: f32,
    /// Intensity at that time.
    pub value: f32,
}

/// How a light picks its intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlickerMode {
    /// Random intensity, re-drawn every `duration` seconds.
    Random {
        /// Lowest intensity.
        min: f32,
        /// Highest intensity.
        max: f32,
        /// Seconds each draw is held.
        duration: f32,
    },
    /// Looping keyframe curve. Keys must be sorted by time.
    Curve {
        /// Keyframes.
        keys: Vec<CurveKey>,
    },
}

impl Default for FlickerMode {
    fn default() -> Self {
        FlickerMode::Random {
            min: 1.25,
            max: 2.25,
            duration: 0.075,
        }
    }
}

impl FlickerMode {
    /// Check ranges and key ordering.
    pub fn validate(&self) -> Result<(), MazeError> {
        let invalid = |reason: &str| MazeError::InvalidConfig {
            field: "flicker.mode".to_owned(),
            reason: reason.to_owned(),
        };
        match self {
            FlickerMode::Random { min, max, duration } => {
                if !(min.is_finite() && max.is_finite() && min <= max) {
                    return Err(invalid("min must not exceed max"));
                }
                if !(duration.is_finite() && *duration > 0.0) {
                    return Err(invalid("duration must be positive"));
                }
            }
            FlickerMode::Curve { keys } => {
                if keys.is_empty() {
                    return Err(invalid("curve needs at least one key"));
                }
                if keys.windows(2).any(|w| !(w[0].time <= w[1].time)) {
                    return Err(invalid("curve keys must be sorted by time"));
                }
            }
        }
        Ok(())
    }
}

/// Evaluate a sorted curve at `t`, holding the end values outside its range.
fn evaluate(keys: &[CurveKey], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }
    for w in keys.windows(2) {
        let (a, b) = (w[0], w[1]);
        if t <= b.time {
            let span = b.time - a.time;
            if span <= 0.0 {
                return b.value;
            }
            return a.value + (b.value - a.value) * (t - a.time) / span;
        }
    }
    last.value
}

/// A single flickering light.
#[derive(Debug, Clone)]
pub struct LightFlicker {
    mode: FlickerMode,
    rng: Pcg32,
    timer: f32,
    intensity: f32,
}

impl LightFlicker {
    /// A light driven by `mode` and seeded with `seed`.
    pub fn new(mode: FlickerMode, seed: u64) -> Self {
        let intensity = match &mode {
            FlickerMode::Random { min, .. } => *min,
            FlickerMode::Curve { keys } => evaluate(keys, keys.first().map_or(0.0, |k| k.time)),
        };
        Self {
            mode,
            rng: Pcg32::seed_from_u64(seed),
            timer: 0.0,
            intensity,
        }
    }

    /// Advance by `dt` and return the new intensity.
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.timer += dt.max(0.0);
        match &self.mode {
            FlickerMode::Random { min, max, duration } => {
                if self.timer >= *duration {
                    self.intensity = self.rng.gen_range(*min..=*max);
                    self.timer = 0.0;
                }
            }
            FlickerMode::Curve { keys } => {
                self.intensity = evaluate(keys, self.timer);
                if let (Some(first), Some(last)) = (keys.first(), keys.last()) {
                    if self.timer >= last.time {
                        self.timer = first.time;
                    }
                }
            }
        }
        self.intensity
    }

    /// Current light intensity.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Emission scale matching the current intensity.
    pub fn emission(&self) -> f32 {
        self.intensity * INTENSITY_TO_EMISSION
    }
}
