//! Countdown timer with threshold effects.
//!
//! The timer counts down from [`TimerConfig::total_time`]. While it runs it
//! drives three one-way effects off the remaining time:
//!
//! * crossing the warning threshold plays the warning cue once and starts the
//!   text blinking every [`TimerConfig::blink_period`] seconds;
//! * the first time remaining drops to the reveal threshold the map overlay is
//!   hidden and [`TimerSignals::menu_revealed`] is raised;
//! * reaching zero stops the timer and raises [`TimerSignals::expired`].
//!
//! The displayed text and colour are re-emitted only when they change.

use serde::Serialize;

use crate::command::{AudioCue, Cause, CommandBuffer, HostCommand, SystemId, TimerColor, UiElement};
use crate::config::TimerConfig;

/// Format seconds as `MM:SS`, each field floored and zero-padded.
///
/// ```
/// use maze_core::timer::format_clock;
///
/// assert_eq!(format_clock(190.0), "03:10");
/// assert_eq!(format_clock(59.99), "00:59");
/// assert_eq!(format_clock(0.0), "00:00");
/// ```
pub fn format_clock(seconds: f32) -> String {
    let s = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (s / 60.0).floor() as u32;
    let secs = (s % 60.0).floor() as u32;
    format!("{minutes:02}:{secs:02}")
}

/// Threshold events raised by a single [`CountdownTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSignals {
    /// Remaining time reached zero this tick.
    pub expired: bool,
    /// The warning threshold was crossed this tick.
    pub warning: bool,
    /// The reveal threshold was reached for the first time this tick.
    pub menu_revealed: bool,
}

/// Level countdown.
#[derive(Debug, Clone, Serialize)]
pub struct CountdownTimer {
    config: TimerConfig,
    remaining: f32,
    previous_remaining: f32,
    running: bool,
    warning_fired: bool,
    blinking: bool,
    blink_phase: bool,
    blink_elapsed: f32,
    text_visible: bool,
    menu_revealed: bool,
    displayed: Option<(String, TimerColor)>,
}

impl CountdownTimer {
    /// A running timer at [`TimerConfig::total_time`].
    pub fn new(config: TimerConfig) -> Self {
        let total = config.total_time.max(0.0);
        Self {
            config,
            remaining: total,
            previous_remaining: total,
            running: true,
            warning_fired: false,
            blinking: false,
            blink_phase: false,
            blink_elapsed: 0.0,
            text_visible: true,
            menu_revealed: false,
            displayed: None,
        }
    }

    /// Publish the initial display.
    pub fn begin(&mut self, cmds: &mut CommandBuffer) {
        self.previous_remaining = self.remaining;
        self.refresh_display(cmds);
        tracing::debug!(total = self.remaining, "countdown started");
    }

    /// Advance by `dt` seconds of scaled time.
    ///
    /// Does nothing to the countdown when stopped or when `dt` is not
    /// positive. Display and blink state still resync so that a `set_time`
    /// made while paused shows up immediately.
    pub fn tick(&mut self, dt: f32, cmds: &mut CommandBuffer) -> TimerSignals {
        let mut signals = TimerSignals::default();
        if self.running && dt > 0.0 {
            self.advance(dt, cmds, &mut signals);
        }
        if self.blinking && (self.remaining > self.config.warning_threshold || self.remaining <= 0.0)
        {
            self.stop_blinking(cmds);
        }
        self.refresh_display(cmds);
        signals
    }

    fn advance(&mut self, dt: f32, cmds: &mut CommandBuffer, signals: &mut TimerSignals) {
        let warn_at = self.config.warning_threshold;
        self.remaining = (self.remaining - dt).max(0.0);

        if self.remaining <= 0.0 {
            self.running = false;
            signals.expired = true;
            tracing::debug!("countdown expired");
        }

        if !self.warning_fired && self.previous_remaining > warn_at && self.remaining <= warn_at {
            self.warning_fired = true;
            signals.warning = true;
            cmds.push(
                HostCommand::PlayAudio(AudioCue::Warning),
                SystemId::TIMER,
                Cause::Timer("low_time_warning".to_owned()),
            );
        }

        if self.remaining > 0.0 && self.remaining <= warn_at {
            self.blink(dt, cmds);
        }

        if !self.menu_revealed && self.remaining <= self.config.reveal_threshold {
            self.menu_revealed = true;
            signals.menu_revealed = true;
            cmds.push(
                HostCommand::SetVisible(UiElement::MapOverlay, false),
                SystemId::TIMER,
                Cause::Timer("map_reveal".to_owned()),
            );
        }

        self.previous_remaining = self.remaining;
    }

    fn blink(&mut self, dt: f32, cmds: &mut CommandBuffer) {
        self.blinking = true;
        self.blink_elapsed += dt;
        if self.blink_elapsed >= self.config.blink_period {
            self.blink_elapsed = 0.0;
            self.blink_phase = !self.blink_phase;
            self.set_text_visible(self.blink_phase, "blink", cmds);
        }
    }

    fn stop_blinking(&mut self, cmds: &mut CommandBuffer) {
        self.blinking = false;
        self.blink_phase = false;
        self.blink_elapsed = 0.0;
        if !self.text_visible {
            self.set_text_visible(true, "blink_stopped", cmds);
        }
    }

    fn set_text_visible(&mut self, visible: bool, why: &str, cmds: &mut CommandBuffer) {
        self.text_visible = visible;
        cmds.push(
            HostCommand::SetVisible(UiElement::TimerText, visible),
            SystemId::TIMER,
            Cause::Timer(why.to_owned()),
        );
    }

    fn refresh_display(&mut self, cmds: &mut CommandBuffer) {
        let text = format_clock(self.remaining);
        let color = TimerColor::for_remaining(self.remaining);
        let changed = match &self.displayed {
            Some((t, c)) => *t != text || *c != color,
            None => true,
        };
        if changed {
            self.displayed = Some((text.clone(), color));
            cmds.push(
                HostCommand::SetTimerText { text, color },
                SystemId::TIMER,
                Cause::Timer("display".to_owned()),
            );
        }
    }

    /// Add bonus time. Negative amounts are ignored.
    pub fn add_time(&mut self, seconds: f32) {
        if !(seconds.is_finite() && seconds >= 0.0) {
            tracing::warn!(seconds, "ignoring negative time bonus");
            return;
        }
        self.remaining += seconds;
        self.rearm_warning();
    }

    /// Overwrite the remaining time. Clamped at zero.
    pub fn set_time(&mut self, seconds: f32) {
        if !seconds.is_finite() {
            tracing::warn!(seconds, "ignoring non-finite time");
            return;
        }
        self.remaining = seconds.max(0.0);
        self.rearm_warning();
    }

    // `previous_remaining` is left alone so the next tick still sees a jump
    // across the warning threshold.
    fn rearm_warning(&mut self) {
        if self.remaining > self.config.warning_threshold {
            self.warning_fired = false;
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Freeze the countdown.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Resume the countdown.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Whether the countdown is advancing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the reveal threshold has been reached.
    pub fn menu_revealed(&self) -> bool {
        self.menu_revealed
    }

    /// Whether the low-time blink is active.
    pub fn is_blinking(&self) -> bool {
        self.blinking
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn timer_at(total: f32) -> (CountdownTimer, CommandBuffer) {
        let mut timer = CountdownTimer::new(TimerConfig {
            total_time: total,
            ..TimerConfig::default()
        });
        let mut cmds = CommandBuffer::new();
        timer.begin(&mut cmds);
        cmds.clear();
        (timer, cmds)
    }

    fn count(cmds: &CommandBuffer, wanted: &HostCommand) -> usize {
        cmds.kinds().filter(|k| *k == wanted).count()
    }

    // -- 1. Countdown --------------------------------------------------------

    #[test]
    fn tick_subtracts_and_clamps() {
        let (mut timer, mut cmds) = timer_at(1.0);
        timer.tick(0.4, &mut cmds);
        assert!((timer.remaining() - 0.6).abs() < 1e-6);
        let signals = timer.tick(5.0, &mut cmds);
        assert_eq!(timer.remaining(), 0.0);
        assert!(signals.expired);
        assert!(!timer.is_running());

        let again = timer.tick(1.0, &mut cmds);
        assert!(!again.expired);
    }

    #[test]
    fn zero_or_negative_dt_is_ignored() {
        let (mut timer, mut cmds) = timer_at(50.0);
        timer.tick(0.0, &mut cmds);
        timer.tick(-3.0, &mut cmds);
        assert_eq!(timer.remaining(), 50.0);
    }

    #[test]
    fn stopped_timer_holds() {
        let (mut timer, mut cmds) = timer_at(50.0);
        timer.stop();
        timer.tick(1.0, &mut cmds);
        assert_eq!(timer.remaining(), 50.0);
        timer.start();
        timer.tick(1.0, &mut cmds);
        assert_eq!(timer.remaining(), 49.0);
    }

    // -- 2. Warning ----------------------------------------------------------

    #[test]
    fn warning_plays_once_per_crossing() {
        let (mut timer, mut cmds) = timer_at(10.5);
        let first = timer.tick(1.0, &mut cmds);
        assert!(first.warning);
        for _ in 0..5 {
            assert!(!timer.tick(1.0, &mut cmds).warning);
        }
        assert_eq!(count(&cmds, &HostCommand::PlayAudio(AudioCue::Warning)), 1);
    }

    #[test]
    fn raising_time_rearms_warning() {
        let (mut timer, mut cmds) = timer_at(10.5);
        assert!(timer.tick(1.0, &mut cmds).warning);
        timer.add_time(5.0);
        assert!(!timer.tick(1.0, &mut cmds).warning);
        assert!(timer.tick(4.0, &mut cmds).warning);
    }

    #[test]
    fn set_time_below_threshold_warns_on_next_tick() {
        let (mut timer, mut cmds) = timer_at(190.0);
        timer.tick(1.0, &mut cmds);
        timer.set_time(5.0);
        assert!(timer.tick(0.5, &mut cmds).warning);
        for _ in 0..4 {
            assert!(!timer.tick(0.5, &mut cmds).warning);
        }
        assert_eq!(timer.remaining(), 2.5);
        assert!(timer.is_blinking());
        assert_eq!(count(&cmds, &HostCommand::PlayAudio(AudioCue::Warning)), 1);
    }

    #[test]
    fn set_time_within_warned_range_does_not_repeat_warning() {
        let (mut timer, mut cmds) = timer_at(10.5);
        assert!(timer.tick(1.0, &mut cmds).warning);
        timer.set_time(8.0);
        assert!(!timer.tick(1.0, &mut cmds).warning);
    }

    // -- 3. Blink ------------------------------------------------------------

    #[test]
    fn blink_toggles_every_half_second() {
        let (mut timer, mut cmds) = timer_at(9.0);
        let mut toggles = Vec::new();
        for _ in 0..8 {
            timer.tick(0.25, &mut cmds);
            for k in cmds.take() {
                if let HostCommand::SetVisible(UiElement::TimerText, v) = k.kind {
                    toggles.push(v);
                }
            }
        }
        assert_eq!(toggles, vec![true, false, true, false]);
        assert!(timer.is_blinking());
    }

    #[test]
    fn set_time_above_threshold_stops_blink_and_shows_text() {
        let (mut timer, mut cmds) = timer_at(9.0);
        timer.tick(0.5, &mut cmds);
        timer.tick(0.5, &mut cmds);
        cmds.clear();

        timer.set_time(60.0);
        timer.tick(0.0, &mut cmds);
        assert!(!timer.is_blinking());
        assert_eq!(count(&cmds, &HostCommand::SetVisible(UiElement::TimerText, true)), 1);
    }

    #[test]
    fn blink_stops_at_zero() {
        let (mut timer, mut cmds) = timer_at(1.2);
        timer.tick(0.5, &mut cmds);
        timer.tick(0.5, &mut cmds);
        timer.tick(0.5, &mut cmds);
        assert!(!timer.is_blinking());
        assert_eq!(timer.remaining(), 0.0);
    }

    // -- 4. Reveal -----------------------------------------------------------

    #[test]
    fn reveal_fires_exactly_once() {
        let (mut timer, mut cmds) = timer_at(181.0);
        assert!(!timer.tick(0.5, &mut cmds).menu_revealed);
        assert!(timer.tick(0.5, &mut cmds).menu_revealed);
        timer.add_time(30.0);
        for _ in 0..40 {
            assert!(!timer.tick(1.0, &mut cmds).menu_revealed);
        }
        assert_eq!(count(&cmds, &HostCommand::SetVisible(UiElement::MapOverlay, false)), 1);
    }

    // -- 5. Display ----------------------------------------------------------

    #[test]
    fn display_only_emitted_on_change() {
        let (mut timer, mut cmds) = timer_at(100.0);
        timer.tick(0.1, &mut cmds);
        timer.tick(0.1, &mut cmds);
        let texts: Vec<_> = cmds
            .kinds()
            .filter(|k| matches!(k, HostCommand::SetTimerText { .. }))
            .collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(
            texts[0],
            &HostCommand::SetTimerText {
                text: "01:39".to_owned(),
                color: TimerColor::White,
            }
        );
    }

    #[test]
    fn begin_publishes_green_display() {
        let mut timer = CountdownTimer::new(TimerConfig::default());
        let mut cmds = CommandBuffer::new();
        timer.begin(&mut cmds);
        assert_eq!(
            cmds.commands()[0].kind,
            HostCommand::SetTimerText {
                text: "03:10".to_owned(),
                color: TimerColor::Green,
            }
        );
    }

    // -- 6. add_time / set_time ----------------------------------------------

    #[test]
    fn add_time_ignores_negative() {
        let (mut timer, _) = timer_at(20.0);
        timer.add_time(-5.0);
        assert_eq!(timer.remaining(), 20.0);
        timer.add_time(5.0);
        assert_eq!(timer.remaining(), 25.0);
    }

    #[test]
    fn set_time_clamps_at_zero() {
        let (mut timer, _) = timer_at(20.0);
        timer.set_time(-1.0);
        assert_eq!(timer.remaining(), 0.0);
        timer.set_time(42.5);
        assert_eq!(timer.remaining(), 42.5);
    }
}
