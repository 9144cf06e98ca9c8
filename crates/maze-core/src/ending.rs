//! End-of-level coordinator.
//!
//! ```text
//! Playing ──exit──▶ AtExit ─┐
//!    │                      ├─▶ Transitioning(outcome) ──fade + display──▶ scene load
//!    └──caught──▶ Caught ───┘
//! ```
//!
//! The exit and caught flags latch and are never cleared. Both are resolved
//! on the next [`EndOfLevel::tick`], exit first, so a player who reaches the
//! exit on the same frame an observer spots them still escapes. Once the
//! transition starts, further signals are ignored.

use serde::Serialize;

use crate::command::{
    AudioCue, Cause, CommandBuffer, FadeImage, HostCommand, SceneRequest, SystemId, UiElement,
};
use crate::config::EndingConfig;
use crate::entity::EntityId;

/// How a level ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The player reached the exit.
    Exit,
    /// An observer spotted the player.
    Caught,
}

impl Outcome {
    fn cue(self) -> AudioCue {
        match self {
            Outcome::Exit => AudioCue::Exit,
            Outcome::Caught => AudioCue::Caught,
        }
    }

    fn image(self) -> FadeImage {
        match self {
            Outcome::Exit => FadeImage::Exit,
            Outcome::Caught => FadeImage::Caught,
        }
    }
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndState {
    /// Nothing has happened yet.
    Playing,
    /// The exit was reached; resolved on the next tick.
    AtExit,
    /// The player was caught; resolved on the next tick.
    Caught,
    /// Fading out toward the scene change.
    Transitioning(Outcome),
}

/// Drives the fade and scene change once the level is decided.
#[derive(Debug, Clone, Serialize)]
pub struct EndOfLevel {
    config: EndingConfig,
    player: EntityId,
    level_index: usize,
    main_menu: String,
    at_exit: bool,
    caught: bool,
    state: EndState,
    elapsed: f32,
    hud_hidden: bool,
    cue_played: bool,
    scene_requested: bool,
}

impl EndOfLevel {
    /// A coordinator for the level at build index `level_index`.
    pub fn new(
        config: EndingConfig,
        player: EntityId,
        level_index: usize,
        main_menu: impl Into<String>,
    ) -> Self {
        Self {
            config,
            player,
            level_index,
            main_menu: main_menu.into(),
            at_exit: false,
            caught: false,
            state: EndState::Playing,
            elapsed: 0.0,
            hud_hidden: false,
            cue_played: false,
            scene_requested: false,
        }
    }

    /// Exit volume entered by `other`. Only the player counts.
    pub fn on_zone_enter(&mut self, other: EntityId) {
        if other != self.player || self.at_exit {
            return;
        }
        self.at_exit = true;
        if self.state == EndState::Playing || self.state == EndState::Caught {
            self.state = EndState::AtExit;
        }
        tracing::debug!("player reached the exit");
    }

    /// An observer spotted the player.
    pub fn caught(&mut self) {
        if self.caught {
            return;
        }
        self.caught = true;
        if self.state == EndState::Playing {
            self.state = EndState::Caught;
        }
        tracing::debug!("player caught");
    }

    /// Advance the transition by `dt` scaled seconds.
    ///
    /// Returns the scene to load on the single tick the transition completes.
    pub fn tick(&mut self, dt: f32, cmds: &mut CommandBuffer) -> Option<SceneRequest> {
        let outcome = match self.state {
            EndState::Playing => return None,
            EndState::Transitioning(outcome) => outcome,
            EndState::AtExit | EndState::Caught => {
                let outcome = if self.at_exit {
                    Outcome::Exit
                } else {
                    Outcome::Caught
                };
                let from = format!("{:?}", self.state);
                self.state = EndState::Transitioning(outcome);
                tracing::debug!(from = %from, outcome = ?outcome, "level ending");
                outcome
            }
        };

        self.hide_hud(cmds);
        if !self.cue_played || self.config.replay_cue_every_tick {
            self.cue_played = true;
            cmds.push(
                HostCommand::PlayAudio(outcome.cue()),
                SystemId::ENDING,
                Cause::GameRule(format!("{outcome:?}_cue").to_lowercase()),
            );
        }

        self.elapsed += dt.max(0.0);
        cmds.push(
            HostCommand::SetFadeAlpha(outcome.image(), self.fade_alpha()),
            SystemId::ENDING,
            Cause::Timer("fade".to_owned()),
        );

        if self.scene_requested || self.elapsed <= self.config.fade_duration + self.config.display_duration {
            return None;
        }
        self.scene_requested = true;
        let request = match outcome {
            Outcome::Caught => SceneRequest::Index(self.level_index),
            Outcome::Exit => SceneRequest::Named(self.main_menu.clone()),
        };
        cmds.push(
            HostCommand::LoadScene(request.clone()),
            SystemId::ENDING,
            Cause::StateTransition {
                from: format!("{outcome:?}"),
                to: "SceneLoad".to_owned(),
            },
        );
        tracing::info!(outcome = ?outcome, scene = ?request, "end of level scene change");
        Some(request)
    }

    fn hide_hud(&mut self, cmds: &mut CommandBuffer) {
        if self.hud_hidden {
            return;
        }
        self.hud_hidden = true;
        for element in [
            UiElement::MapOverlay,
            UiElement::MenuPanel,
            UiElement::TimerText,
            UiElement::TimerBackground,
        ] {
            cmds.push(
                HostCommand::SetVisible(element, false),
                SystemId::ENDING,
                Cause::GameRule("hide_hud_on_end".to_owned()),
            );
        }
    }

    /// Fade image opacity, clamped to `[0, 1]`.
    pub fn fade_alpha(&self) -> f32 {
        (self.elapsed / self.config.fade_duration).clamp(0.0, 1.0)
    }

    /// Current state.
    pub fn state(&self) -> EndState {
        self.state
    }

    /// Whether the level has been decided.
    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, EndState::Transitioning(_))
    }

    /// Seconds since the transition began.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: EntityId = EntityId::new(0, 0);

    fn coordinator(config: EndingConfig) -> EndOfLevel {
        EndOfLevel::new(config, PLAYER, 1, "MainMenu")
    }

    fn cues(cmds: &CommandBuffer) -> Vec<AudioCue> {
        cmds.kinds()
            .filter_map(|k| match k {
                HostCommand::PlayAudio(cue) => Some(*cue),
                _ => None,
            })
            .collect()
    }

    // -- 1. Signals ----------------------------------------------------------

    #[test]
    fn playing_tick_is_silent() {
        let mut end = coordinator(EndingConfig::default());
        let mut cmds = CommandBuffer::new();
        assert_eq!(end.tick(0.1, &mut cmds), None);
        assert!(cmds.is_empty());
    }

    #[test]
    fn non_player_does_not_trigger_exit() {
        let mut end = coordinator(EndingConfig::default());
        end.on_zone_enter(EntityId::new(5, 0));
        assert_eq!(end.state(), EndState::Playing);
    }

    #[test]
    fn exit_wins_over_caught_in_same_tick() {
        let mut end = coordinator(EndingConfig::default());
        end.caught();
        end.on_zone_enter(PLAYER);
        let mut cmds = CommandBuffer::new();
        end.tick(0.1, &mut cmds);
        assert_eq!(end.state(), EndState::Transitioning(Outcome::Exit));
        assert_eq!(cues(&cmds), vec![AudioCue::Exit]);
    }

    #[test]
    fn signals_after_transition_are_ignored() {
        let mut end = coordinator(EndingConfig::default());
        end.caught();
        let mut cmds = CommandBuffer::new();
        end.tick(0.1, &mut cmds);
        end.on_zone_enter(PLAYER);
        end.tick(0.1, &mut cmds);
        assert_eq!(end.state(), EndState::Transitioning(Outcome::Caught));
    }

    // -- 2. Transition effects -----------------------------------------------

    #[test]
    fn hud_hidden_once_and_cue_played_once() {
        let mut end = coordinator(EndingConfig::default());
        end.caught();
        let mut cmds = CommandBuffer::new();
        for _ in 0..10 {
            end.tick(0.1, &mut cmds);
        }
        let hides = cmds
            .kinds()
            .filter(|k| matches!(k, HostCommand::SetVisible(_, false)))
            .count();
        assert_eq!(hides, 4);
        assert_eq!(cues(&cmds), vec![AudioCue::Caught]);
    }

    #[test]
    fn legacy_flag_replays_cue_every_tick() {
        let mut end = coordinator(EndingConfig {
            replay_cue_every_tick: true,
            ..EndingConfig::default()
        });
        end.caught();
        let mut cmds = CommandBuffer::new();
        for _ in 0..3 {
            end.tick(0.1, &mut cmds);
        }
        assert_eq!(cues(&cmds).len(), 3);
    }

    #[test]
    fn fade_alpha_ramps_and_clamps() {
        let mut end = coordinator(EndingConfig::default());
        end.on_zone_enter(PLAYER);
        let mut cmds = CommandBuffer::new();
        end.tick(0.25, &mut cmds);
        assert!((end.fade_alpha() - 0.25).abs() < 1e-6);
        end.tick(1.0, &mut cmds);
        assert_eq!(end.fade_alpha(), 1.0);
    }

    // -- 3. Scene change -----------------------------------------------------

    #[test]
    fn caught_reloads_level_after_fade_and_display() {
        let mut end = coordinator(EndingConfig::default());
        end.caught();
        let mut cmds = CommandBuffer::new();
        let mut requests = Vec::new();
        for _ in 0..25 {
            if let Some(r) = end.tick(0.1, &mut cmds) {
                requests.push((r, end.elapsed()));
            }
        }
        assert_eq!(requests.len(), 1);
        let (request, elapsed) = &requests[0];
        assert_eq!(*request, SceneRequest::Index(1));
        assert!(*elapsed > 2.0);
    }

    #[test]
    fn exit_loads_main_menu_by_name() {
        let mut end = coordinator(EndingConfig::default());
        end.on_zone_enter(PLAYER);
        let mut cmds = CommandBuffer::new();
        assert_eq!(end.tick(1.5, &mut cmds), None);
        assert_eq!(
            end.tick(0.6, &mut cmds),
            Some(SceneRequest::Named("MainMenu".to_owned()))
        );
        assert_eq!(end.tick(0.6, &mut cmds), None);
    }

    #[test]
    fn frozen_clock_holds_the_fade() {
        let mut end = coordinator(EndingConfig::default());
        end.caught();
        let mut cmds = CommandBuffer::new();
        for _ in 0..100 {
            assert_eq!(end.tick(0.0, &mut cmds), None);
        }
        assert_eq!(end.fade_alpha(), 0.0);
    }
}
