//! Time bonus pickup.

use serde::Serialize;

use crate::timer::CountdownTimer;

/// Adds its bonus to the countdown the first time the player touches it.
#[derive(Debug, Clone, Serialize)]
pub struct TimeCollectible {
    bonus: f32,
    consumed: bool,
}

impl TimeCollectible {
    /// A pickup worth `bonus` seconds.
    pub fn new(bonus: f32) -> Self {
        Self {
            bonus,
            consumed: false,
        }
    }

    /// Apply the bonus to `timer`. Returns `false` if already consumed.
    pub fn collect(&mut self, timer: &mut CountdownTimer) -> bool {
        if self.consumed {
            return false;
        }
        self.consumed = true;
        timer.add_time(self.bonus);
        tracing::debug!(bonus = self.bonus, remaining = timer.remaining(), "time collected");
        true
    }

    /// Whether the pickup is gone.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Seconds granted.
    pub fn bonus(&self) -> f32 {
        self.bonus
    }
}

impl Default for TimeCollectible {
    fn default() -> Self {
        Self::new(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimerConfig;

    #[test]
    fn collect_once() {
        let mut timer = CountdownTimer::new(TimerConfig::default());
        let mut pickup = TimeCollectible::default();
        assert!(pickup.collect(&mut timer));
        assert!(!pickup.collect(&mut timer));
        assert_eq!(timer.remaining(), 200.0);
        assert!(pickup.is_consumed());
    }
}
