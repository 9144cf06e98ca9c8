//! In-game pause menu.
//!
//! Pausing freezes the shared [`ClockMultiplier`] and pauses every playing
//! audio source; resuming reverses both. Restart and exit always put the
//! clock back to normal speed before asking for a scene load, so the next
//! scene never starts frozen.

use serde::Serialize;

use crate::clock::ClockMultiplier;
use crate::command::{Cause, CommandBuffer, HostCommand, SceneRequest, SystemId, UiElement};

/// Pause/resume toggle plus restart and exit actions.
#[derive(Debug, Clone, Serialize)]
pub struct PauseMenu {
    paused: bool,
    main_menu: String,
}

impl PauseMenu {
    /// A menu whose exit action loads `main_menu`.
    pub fn new(main_menu: impl Into<String>) -> Self {
        Self {
            paused: false,
            main_menu: main_menu.into(),
        }
    }

    /// Initial HUD state: pause button only, clock running.
    pub fn begin(&mut self, clock: &mut ClockMultiplier, cmds: &mut CommandBuffer) {
        self.paused = false;
        clock.set(1.0);
        let reason = || Cause::GameRule("menu_init".to_owned());
        cmds.push(HostCommand::SetVisible(UiElement::ResumeButton, false), SystemId::MENU, reason());
        cmds.push(HostCommand::SetVisible(UiElement::PauseButton, true), SystemId::MENU, reason());
        cmds.push(HostCommand::SetVisible(UiElement::MenuPanel, false), SystemId::MENU, reason());
    }

    /// Freeze the game. No-op when already paused.
    pub fn pause(&mut self, clock: &mut ClockMultiplier, cmds: &mut CommandBuffer) {
        if self.paused {
            return;
        }
        self.paused = true;
        clock.set(0.0);
        let reason = || Cause::PlayerInput("pause".to_owned());
        cmds.push(HostCommand::SetVisible(UiElement::PauseButton, false), SystemId::MENU, reason());
        cmds.push(HostCommand::SetVisible(UiElement::ResumeButton, true), SystemId::MENU, reason());
        cmds.push(HostCommand::PauseAllAudio, SystemId::MENU, reason());
        tracing::debug!("game paused");
    }

    /// Unfreeze the game. No-op when not paused.
    pub fn resume(&mut self, clock: &mut ClockMultiplier, cmds: &mut CommandBuffer) {
        if !self.paused {
            return;
        }
        self.paused = false;
        clock.set(1.0);
        let reason = || Cause::PlayerInput("resume".to_owned());
        cmds.push(HostCommand::SetVisible(UiElement::PauseButton, true), SystemId::MENU, reason());
        cmds.push(HostCommand::SetVisible(UiElement::ResumeButton, false), SystemId::MENU, reason());
        cmds.push(HostCommand::ResumeAllAudio, SystemId::MENU, reason());
        tracing::debug!("game resumed");
    }

    /// Pause when running, resume when paused.
    pub fn toggle(&mut self, clock: &mut ClockMultiplier, cmds: &mut CommandBuffer) {
        if self.paused {
            self.resume(clock, cmds);
        } else {
            self.pause(clock, cmds);
        }
    }

    /// Reload the active scene at normal speed.
    pub fn restart(&mut self, clock: &mut ClockMultiplier, cmds: &mut CommandBuffer) {
        clock.set(1.0);
        cmds.push(
            HostCommand::LoadScene(SceneRequest::ReloadActive),
            SystemId::MENU,
            Cause::PlayerInput("restart".to_owned()),
        );
        tracing::info!("restart requested");
    }

    /// Go back to the main menu at normal speed.
    pub fn exit_to_menu(&mut self, clock: &mut ClockMultiplier, cmds: &mut CommandBuffer) {
        clock.set(1.0);
        cmds.push(
            HostCommand::LoadScene(SceneRequest::Named(self.main_menu.clone())),
            SystemId::MENU,
            Cause::PlayerInput("exit_to_menu".to_owned()),
        );
        tracing::info!(scene = %self.main_menu, "exit to menu requested");
    }

    /// Reveal the menu panel without pausing.
    pub fn show_menu(&mut self, cmds: &mut CommandBuffer) {
        let reason = || Cause::Timer("menu_reveal".to_owned());
        cmds.push(HostCommand::SetVisible(UiElement::MenuPanel, true), SystemId::MENU, reason());
        cmds.push(HostCommand::SetVisible(UiElement::PauseButton, true), SystemId::MENU, reason());
        cmds.push(HostCommand::SetVisible(UiElement::ResumeButton, false), SystemId::MENU, reason());
    }

    /// Whether the game is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> (PauseMenu, ClockMultiplier, CommandBuffer) {
        let mut menu = PauseMenu::new("MainMenu");
        let mut clock = ClockMultiplier::default();
        let mut cmds = CommandBuffer::new();
        menu.begin(&mut clock, &mut cmds);
        cmds.clear();
        (menu, clock, cmds)
    }

    #[test]
    fn pause_freezes_clock_and_audio() {
        let (mut menu, mut clock, mut cmds) = menu();
        menu.pause(&mut clock, &mut cmds);
        assert!(clock.is_frozen());
        assert!(menu.is_paused());
        assert!(cmds.kinds().any(|k| *k == HostCommand::PauseAllAudio));
        assert!(cmds
            .kinds()
            .any(|k| *k == HostCommand::SetVisible(UiElement::ResumeButton, true)));
    }

    #[test]
    fn double_pause_is_noop() {
        let (mut menu, mut clock, mut cmds) = menu();
        menu.pause(&mut clock, &mut cmds);
        let before = cmds.len();
        menu.pause(&mut clock, &mut cmds);
        assert_eq!(cmds.len(), before);
    }

    #[test]
    fn toggle_round_trip_restores_clock() {
        let (mut menu, mut clock, mut cmds) = menu();
        menu.toggle(&mut clock, &mut cmds);
        menu.toggle(&mut clock, &mut cmds);
        assert_eq!(clock.scale(), 1.0);
        assert!(!menu.is_paused());
        assert!(cmds.kinds().any(|k| *k == HostCommand::ResumeAllAudio));
    }

    #[test]
    fn restart_unfreezes_and_reloads_active() {
        let (mut menu, mut clock, mut cmds) = menu();
        menu.pause(&mut clock, &mut cmds);
        cmds.clear();
        menu.restart(&mut clock, &mut cmds);
        assert_eq!(clock.scale(), 1.0);
        assert_eq!(
            cmds.commands()[0].kind,
            HostCommand::LoadScene(SceneRequest::ReloadActive)
        );
    }

    #[test]
    fn exit_to_menu_loads_by_name() {
        let (mut menu, mut clock, mut cmds) = menu();
        menu.exit_to_menu(&mut clock, &mut cmds);
        assert_eq!(
            cmds.commands()[0].kind,
            HostCommand::LoadScene(SceneRequest::Named("MainMenu".to_owned()))
        );
    }

    #[test]
    fn show_menu_does_not_pause() {
        let (mut menu, clock, mut cmds) = menu();
        menu.show_menu(&mut cmds);
        assert!(!menu.is_paused());
        assert_eq!(clock.scale(), 1.0);
        assert!(cmds
            .kinds()
            .any(|k| *k == HostCommand::SetVisible(UiElement::MenuPanel, true)));
    }
}
