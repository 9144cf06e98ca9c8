//! Title screen actions.

use crate::command::{AudioCue, Cause, CommandBuffer, HostCommand, SceneRequest, SystemId};

/// The main menu: start the game or quit.
#[derive(Debug, Clone)]
pub struct MainMenu {
    main_game: String,
}

impl MainMenu {
    /// A menu whose start action loads `main_game`.
    pub fn new(main_game: impl Into<String>) -> Self {
        Self {
            main_game: main_game.into(),
        }
    }

    /// Start the menu music.
    pub fn begin(&mut self, cmds: &mut CommandBuffer) {
        cmds.push(
            HostCommand::PlayAudio(AudioCue::MenuMusic),
            SystemId::MENU,
            Cause::GameRule("menu_music".to_owned()),
        );
    }

    /// Stop the music and load the game scene.
    pub fn start_game(&mut self, cmds: &mut CommandBuffer) {
        let reason = || Cause::PlayerInput("start_game".to_owned());
        cmds.push(HostCommand::StopAudio(AudioCue::MenuMusic), SystemId::MENU, reason());
        cmds.push(
            HostCommand::LoadScene(SceneRequest::Named(self.main_game.clone())),
            SystemId::MENU,
            reason(),
        );
        tracing::info!(scene = %self.main_game, "game started");
    }

    /// Ask the host to exit.
    pub fn quit(&mut self, cmds: &mut CommandBuffer) {
        cmds.push(HostCommand::Quit, SystemId::MENU, Cause::PlayerInput("quit".to_owned()));
        tracing::info!("quit requested");
    }
}
