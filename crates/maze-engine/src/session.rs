//! Process-level scene management.
//!
//! A [`Session`] is what survives scene loads: the configuration, the scene
//! registry and the persistent checkpoint slot. It owns exactly one active
//! scene at a time, either the [`TitleScreen`] or a [`Level`], each in its
//! own [`TickLoop`] with its own [`Host`](crate::host::Host). When a tick
//! ends with a scene request, the session tears the active scene down and
//! builds the requested one.
//!
//! ```
//! use maze_core::prelude::*;
//! use maze_engine::session::Session;
//! use maze_engine::tick::{InputFrame, MenuButton};
//!
//! let mut session = Session::new(GameConfig::default()).unwrap();
//! assert_eq!(session.active_scene_name(), "MainMenu");
//!
//! let change = session.advance(InputFrame::press(MenuButton::StartGame)).unwrap();
//! assert_eq!(change.map(|c| c.index), Some(1));
//! assert!(session.level().is_some());
//! ```

use maze_core::checkpoint::CheckpointStore;
use maze_core::clock::ClockMultiplier;
use maze_core::command::{CommandBuffer, SceneRequest};
use maze_core::config::GameConfig;
use maze_core::menu::MainMenu;
use maze_core::persistent::{Claim, PersistentSlot, Shared};
use maze_core::MazeError;

use crate::host::Host;
use crate::level::Level;
use crate::tick::{InputFrame, MenuButton, Simulation, TickConfig, TickContext, TickLoop};

// ---------------------------------------------------------------------------
// Title screen
// ---------------------------------------------------------------------------

/// The main menu scene.
#[derive(Debug)]
pub struct TitleScreen {
    menu: MainMenu,
}

impl TitleScreen {
    /// A title screen whose start button loads `main_game`.
    pub fn new(main_game: impl Into<String>) -> Self {
        Self {
            menu: MainMenu::new(main_game),
        }
    }

    /// Wrapped in a tick loop with its input system registered.
    pub fn build(config: &GameConfig) -> TickLoop<TitleScreen> {
        let mut tick_loop = TickLoop::new(
            TitleScreen::new(config.scenes.main_game.clone()),
            TickConfig {
                fixed_dt: config.tick.fixed_dt,
            },
        );
        tick_loop.add_system("title_input", title_input_system);
        tick_loop
    }
}

impl Simulation for TitleScreen {
    fn clock(&self) -> ClockMultiplier {
        ClockMultiplier::NORMAL
    }

    fn begin(&mut self, cmds: &mut CommandBuffer) {
        self.menu.begin(cmds);
    }
}

fn title_input_system(title: &mut TitleScreen, ctx: &TickContext<'_>, cmds: &mut CommandBuffer) {
    for button in &ctx.input.buttons {
        match button {
            MenuButton::StartGame => title.menu.start_game(cmds),
            MenuButton::Quit => title.menu.quit(cmds),
            other => tracing::debug!(button = ?other, "button ignored on title screen"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The scene currently running.
pub enum ActiveScene {
    /// Main menu.
    Title(Box<TickLoop<TitleScreen>>),
    /// The maze.
    Level(Box<TickLoop<Level>>),
}

/// A completed scene load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneChange {
    /// Scene that was unloaded.
    pub from: String,
    /// Scene that is now active.
    pub to: String,
    /// Build index of the new scene.
    pub index: usize,
}

/// Owns the active scene and everything that outlives it.
pub struct Session {
    config: GameConfig,
    checkpoints: PersistentSlot<CheckpointStore>,
    active: ActiveScene,
    active_index: usize,
    loads: u64,
    quit: bool,
}

impl Session {
    /// Validate `config` and open the main menu.
    pub fn new(config: GameConfig) -> Result<Self, MazeError> {
        let menu = config.scenes.main_menu.clone();
        Self::starting_at(config, &menu)
    }

    /// Validate `config` and open the scene called `name`.
    pub fn starting_at(config: GameConfig, name: &str) -> Result<Self, MazeError> {
        config.validate()?;
        let index = config.scenes.index_of(name)?;
        let mut checkpoints = PersistentSlot::new("checkpoints");
        let active = instantiate(&config, &mut checkpoints, index)?;
        tracing::info!(scene = %name, index, "session started");
        Ok(Self {
            config,
            checkpoints,
            active,
            active_index: index,
            loads: 0,
            quit: false,
        })
    }

    /// Tick the active scene once with `input`, then perform any scene load
    /// it requested.
    ///
    /// Returns the scene change, if one happened. A request naming a scene
    /// that is not in the build list is an error and leaves the current
    /// scene running.
    pub fn advance(&mut self, input: InputFrame) -> Result<Option<SceneChange>, MazeError> {
        let (request, quit) = match &mut self.active {
            ActiveScene::Title(tick_loop) => {
                tick_loop.set_input(input);
                tick_loop.tick();
                let quit = tick_loop.host().quit_requested();
                (tick_loop.host_mut().take_scene_request(), quit)
            }
            ActiveScene::Level(tick_loop) => {
                tick_loop.set_input(input);
                tick_loop.tick();
                let quit = tick_loop.host().quit_requested();
                (tick_loop.host_mut().take_scene_request(), quit)
            }
        };
        if quit && !self.quit {
            tracing::info!("quit requested");
            self.quit = true;
        }
        match request {
            Some(request) => self.load(&request).map(Some),
            None => Ok(None),
        }
    }

    /// Unload the active scene and load the one `request` names.
    pub fn load(&mut self, request: &SceneRequest) -> Result<SceneChange, MazeError> {
        let index = self.resolve(request)?;
        let from = self.active_scene_name().to_owned();
        self.active = instantiate(&self.config, &mut self.checkpoints, index)?;
        self.active_index = index;
        self.loads += 1;
        let to = self.active_scene_name().to_owned();
        tracing::info!(from = %from, to = %to, index, "scene loaded");
        Ok(SceneChange { from, to, index })
    }

    /// Reload the active scene by build index.
    pub fn game_over(&mut self) -> Result<SceneChange, MazeError> {
        tracing::info!(index = self.active_index, "game over");
        self.load(&SceneRequest::Index(self.active_index))
    }

    fn resolve(&self, request: &SceneRequest) -> Result<usize, MazeError> {
        let scenes = &self.config.scenes;
        match request {
            SceneRequest::Index(index) => scenes.name_at(*index).map(|_| *index),
            SceneRequest::Named(name) => scenes.index_of(name),
            SceneRequest::ReloadActive => Ok(self.active_index),
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Build index of the active scene.
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Name of the active scene.
    pub fn active_scene_name(&self) -> &str {
        self.config
            .scenes
            .build
            .get(self.active_index)
            .map_or("", String::as_str)
    }

    /// The active scene.
    pub fn active(&self) -> &ActiveScene {
        &self.active
    }

    /// The running level, if the maze is active.
    pub fn level(&self) -> Option<&TickLoop<Level>> {
        match &self.active {
            ActiveScene::Level(tick_loop) => Some(tick_loop),
            ActiveScene::Title(_) => None,
        }
    }

    /// Mutable access to the running level.
    pub fn level_mut(&mut self) -> Option<&mut TickLoop<Level>> {
        match &mut self.active {
            ActiveScene::Level(tick_loop) => Some(tick_loop),
            ActiveScene::Title(_) => None,
        }
    }

    /// The title screen, if it is active.
    pub fn title(&self) -> Option<&TickLoop<TitleScreen>> {
        match &self.active {
            ActiveScene::Title(tick_loop) => Some(tick_loop),
            ActiveScene::Level(_) => None,
        }
    }

    /// The persistent checkpoint store, once a level has installed it.
    pub fn checkpoints(&self) -> Option<Shared<CheckpointStore>> {
        self.checkpoints.get()
    }

    /// Number of scene loads since the session started.
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Whether any scene asked the application to exit.
    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// The session's configuration.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }
}

/// Build the scene at `index`. The main menu name gets the title screen;
/// every other scene is a maze level.
fn instantiate(
    config: &GameConfig,
    checkpoints: &mut PersistentSlot<CheckpointStore>,
    index: usize,
) -> Result<ActiveScene, MazeError> {
    let name = config.scenes.name_at(index)?;
    if name == config.scenes.main_menu {
        return Ok(ActiveScene::Title(Box::new(TitleScreen::build(config))));
    }
    let (store, claim) = checkpoints.claim(CheckpointStore::new);
    if claim == Claim::Discarded {
        tracing::debug!(scene = %name, "reusing session checkpoint store");
    }
    Ok(ActiveScene::Level(Box::new(Level::build(config, index, store))))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use maze_core::command::AudioCue;
    use maze_core::math::Position;

    fn in_game() -> Session {
        Session::starting_at(GameConfig::default(), "MainScene").unwrap()
    }

    // -- 1. Start-up ----------------------------------------------------------

    #[test]
    fn new_session_opens_main_menu_with_music() {
        let session = Session::new(GameConfig::default()).unwrap();
        assert_eq!(session.active_index(), 0);
        let title = session.title().unwrap();
        assert!(title.host().audio().is_playing(AudioCue::MenuMusic));
        assert!(session.checkpoints().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.scenes.main_game = "Nowhere".to_owned();
        assert!(Session::new(config).is_err());
        assert!(matches!(
            Session::starting_at(GameConfig::default(), "Credits"),
            Err(MazeError::UnknownScene { .. })
        ));
    }

    // -- 2. Title screen ------------------------------------------------------

    #[test]
    fn start_game_loads_level() {
        let mut session = Session::new(GameConfig::default()).unwrap();
        let change = session
            .advance(InputFrame::press(MenuButton::StartGame))
            .unwrap()
            .unwrap();
        assert_eq!(change.from, "MainMenu");
        assert_eq!(change.to, "MainScene");
        assert!(session.level().is_some());
        assert!(session.checkpoints().is_some());
    }

    #[test]
    fn quit_sets_flag_without_scene_change() {
        let mut session = Session::new(GameConfig::default()).unwrap();
        let change = session.advance(InputFrame::press(MenuButton::Quit)).unwrap();
        assert!(change.is_none());
        assert!(session.is_quit());
    }

    // -- 3. Scene loads -------------------------------------------------------

    #[test]
    fn restart_reloads_active_scene_by_name() {
        let mut session = in_game();
        session.advance(InputFrame::axes(0.0, 1.0)).unwrap();
        let change = session
            .advance(InputFrame::press(MenuButton::Restart))
            .unwrap()
            .unwrap();
        assert_eq!(change.index, 1);
        let level = session.level().unwrap();
        assert_eq!(level.tick_count(), 0);
        assert_eq!(level.state().player_position(), Position::ZERO);
    }

    #[test]
    fn exit_to_menu_returns_to_title() {
        let mut session = in_game();
        session.advance(InputFrame::press(MenuButton::Pause)).unwrap();
        let change = session
            .advance(InputFrame::press(MenuButton::ExitToMenu))
            .unwrap()
            .unwrap();
        assert_eq!(change.to, "MainMenu");
        assert!(session.title().is_some());
    }

    #[test]
    fn checkpoint_survives_reload() {
        let mut session = in_game();
        let store = session.checkpoints().unwrap();
        store.borrow_mut().save(Position::new(4.0, 0.0, 8.0), 120.0);

        session.game_over().unwrap();
        let reloaded = session.checkpoints().unwrap();
        assert!(std::rc::Rc::ptr_eq(&store, &reloaded));

        let level = session.level_mut().unwrap();
        level.set_input(InputFrame::press(MenuButton::Respawn));
        level.tick();
        assert_eq!(level.state().player_position(), Position::new(4.0, 0.0, 8.0));
        assert_eq!(session.load_count(), 1);
    }

    #[test]
    fn bad_requests_leave_scene_running() {
        let mut session = in_game();
        assert!(matches!(
            session.load(&SceneRequest::Index(7)),
            Err(MazeError::SceneIndexOutOfRange { index: 7, count: 2 })
        ));
        assert!(matches!(
            session.load(&SceneRequest::Named("Credits".to_owned())),
            Err(MazeError::UnknownScene { .. })
        ));
        assert_eq!(session.active_scene_name(), "MainScene");
        assert!(session.level().is_some());
    }
}
