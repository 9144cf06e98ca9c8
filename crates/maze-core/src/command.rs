//! Host command buffer with causality metadata.
//!
//! Gameplay components never touch audio, HUD or scene state directly. They
//! queue [`HostCommand`]s into a [`CommandBuffer`], each tagged with the
//! [`SystemId`] that issued it and a [`Cause`]. The host drains the buffer in
//! FIFO order after every system has run for the tick, so the order of side
//! effects is fully determined by system order and the order of pushes inside
//! each system.
//!
//! # Example
//!
//! ```
//! use maze_core::command::{AudioCue, Cause, CommandBuffer, HostCommand, SystemId};
//!
//! let mut cmds = CommandBuffer::new();
//! cmds.push(
//!     HostCommand::PlayAudio(AudioCue::Warning),
//!     SystemId::TIMER,
//!     Cause::Timer("low_time_warning".to_owned()),
//! );
//!
//! let drained = cmds.take();
//! assert_eq!(drained.len(), 1);
//! assert_eq!(drained[0].index, 0);
//! assert!(cmds.is_empty());
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Host vocabulary
// ---------------------------------------------------------------------------

/// Discrete audio clips the level can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AudioCue {
    /// Looping background ambience.
    Ambience,
    /// Player footsteps while walking.
    Footsteps,
    /// Low-time alert.
    Warning,
    /// Played when the player reaches the exit.
    Exit,
    /// Played when an observer spots the player.
    Caught,
    /// Main menu background music.
    MenuMusic,
}

impl AudioCue {
    /// Every cue, in a fixed order.
    pub const ALL: [AudioCue; 6] = [
        AudioCue::Ambience,
        AudioCue::Footsteps,
        AudioCue::Warning,
        AudioCue::Exit,
        AudioCue::Caught,
        AudioCue::MenuMusic,
    ];
}

/// HUD elements whose visibility gameplay code toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UiElement {
    /// Overhead map shown during the opening seconds.
    MapOverlay,
    /// In-game menu panel (restart / exit / respawn).
    MenuPanel,
    /// The countdown text.
    TimerText,
    /// Backdrop behind the countdown text.
    TimerBackground,
    /// Pause affordance.
    PauseButton,
    /// Resume affordance.
    ResumeButton,
}

/// Full-screen images faded in at the end of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FadeImage {
    /// Shown when the player escapes.
    Exit,
    /// Shown when the player is caught.
    Caught,
}

/// Colour of the countdown text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerColor {
    /// Plenty of time left.
    Green,
    /// Normal.
    White,
    /// Hurry.
    Red,
}

impl TimerColor {
    /// Colour for the given remaining time: green above 180 s, red at or
    /// below 30 s, white in between.
    pub fn for_remaining(remaining: f32) -> TimerColor {
        if remaining > 180.0 {
            TimerColor::Green
        } else if remaining <= 30.0 {
            TimerColor::Red
        } else {
            TimerColor::White
        }
    }
}

/// How a scene load names its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneRequest {
    /// Load by build index.
    Index(usize),
    /// Load by scene name.
    Named(String),
    /// Reload whatever scene is currently active, by name.
    ReloadActive,
}

/// A side effect for the host to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Start a clip from the beginning.
    PlayAudio(AudioCue),
    /// Stop a clip.
    StopAudio(AudioCue),
    /// Pause every clip that is currently playing.
    PauseAllAudio,
    /// Resume every clip that was paused.
    ResumeAllAudio,
    /// Show or hide a HUD element.
    SetVisible(UiElement, bool),
    /// Update the countdown text and its colour.
    SetTimerText {
        /// Formatted `MM:SS` text.
        text: String,
        /// Text colour.
        color: TimerColor,
    },
    /// Set the opacity of a fade image, in `[0, 1]`.
    SetFadeAlpha(FadeImage, f32),
    /// Set a flickering light's intensity.
    SetLightIntensity {
        /// Index of the light in the level layout.
        light: usize,
        /// Light intensity. Emission is derived by the host.
        intensity: f32,
    },
    /// Ask the host to load a scene after this tick.
    LoadScene(SceneRequest),
    /// Ask the host to exit the application.
    Quit,
}

// ---------------------------------------------------------------------------
// Causality
// ---------------------------------------------------------------------------

/// Identifies the system that issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemId(pub u32);

impl SystemId {
    /// In-game and main menu button handling.
    pub const MENU: SystemId = SystemId(1);
    /// Player movement.
    pub const MOVEMENT: SystemId = SystemId(2);
    /// Observer patrols.
    pub const PATROL: SystemId = SystemId(3);
    /// Trigger dispatch after the physics step.
    pub const PHYSICS: SystemId = SystemId(4);
    /// Line-of-sight checks.
    pub const DETECTION: SystemId = SystemId(5);
    /// The countdown.
    pub const TIMER: SystemId = SystemId(6);
    /// End-of-level transitions.
    pub const ENDING: SystemId = SystemId(7);
    /// Light flicker.
    pub const FLICKER: SystemId = SystemId(8);
    /// Session-level scene management.
    pub const SESSION: SystemId = SystemId(9);
}

/// Why a command was issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// A button press or input axis.
    PlayerInput(String),
    /// A rule of the game (e.g. "checkpoint_saved").
    GameRule(String),
    /// A timer threshold or elapsed duration.
    Timer(String),
    /// A state machine transition.
    StateTransition {
        /// The state being left.
        from: String,
        /// The state being entered.
        to: String,
    },
    /// A trigger volume event.
    Collision(String),
}

/// A queued host command with its causality metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// What to do.
    pub kind: HostCommand,
    /// Which system asked for it.
    pub issued_by: SystemId,
    /// Why.
    pub reason: Cause,
    /// Position within the tick's buffer, assigned on push.
    pub index: u32,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// Collects host commands during a tick.
///
/// Commands are drained in strict insertion order. Given the same systems in
/// the same order, the host sees the same command sequence every run.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_index: u32,
}

impl CommandBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command.
    pub fn push(&mut self, kind: HostCommand, issued_by: SystemId, reason: Cause) {
        let index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            kind,
            issued_by,
            reason,
            index,
        });
    }

    /// Queued commands in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Iterate over the queued command payloads.
    pub fn kinds(&self) -> impl Iterator<Item = &HostCommand> {
        self.commands.iter().map(|c| &c.kind)
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drain all queued commands, leaving the buffer empty and its index
    /// counter reset for the next tick.
    pub fn take(&mut self) -> Vec<Command> {
        self.next_index = 0;
        std::mem::take(&mut self.commands)
    }

    /// Discard all queued commands.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.next_index = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- 1. Ordering ---------------------------------------------------------

    #[test]
    fn commands_keep_insertion_order_across_systems() {
        let mut cmds = CommandBuffer::new();
        cmds.push(
            HostCommand::SetVisible(UiElement::MapOverlay, false),
            SystemId::TIMER,
            Cause::Timer("map_reveal".to_owned()),
        );
        cmds.push(
            HostCommand::PlayAudio(AudioCue::Caught),
            SystemId::ENDING,
            Cause::GameRule("caught".to_owned()),
        );
        cmds.push(
            HostCommand::SetVisible(UiElement::TimerText, false),
            SystemId::TIMER,
            Cause::Timer("blink".to_owned()),
        );

        let drained = cmds.take();
        let indices: Vec<u32> = drained.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(drained[1].issued_by, SystemId::ENDING);
    }

    // -- 2. take resets indices ----------------------------------------------

    #[test]
    fn take_resets_index_counter() {
        let mut cmds = CommandBuffer::new();
        cmds.push(HostCommand::Quit, SystemId::MENU, Cause::PlayerInput("quit".into()));
        let _ = cmds.take();
        cmds.push(HostCommand::Quit, SystemId::MENU, Cause::PlayerInput("quit".into()));
        assert_eq!(cmds.commands()[0].index, 0);
    }

    // -- 3. clear ------------------------------------------------------------

    #[test]
    fn clear_discards_everything() {
        let mut cmds = CommandBuffer::new();
        cmds.push(HostCommand::PauseAllAudio, SystemId::MENU, Cause::PlayerInput("pause".into()));
        cmds.clear();
        assert!(cmds.is_empty());
        assert_eq!(cmds.kinds().count(), 0);
    }

    // -- 4. Colour policy boundaries -----------------------------------------

    #[test]
    fn timer_color_boundaries() {
        assert_eq!(TimerColor::for_remaining(181.0), TimerColor::Green);
        assert_eq!(TimerColor::for_remaining(180.0), TimerColor::White);
        assert_eq!(TimerColor::for_remaining(31.0), TimerColor::White);
        assert_eq!(TimerColor::for_remaining(30.0), TimerColor::Red);
        assert_eq!(TimerColor::for_remaining(0.0), TimerColor::Red);
    }

    // -- 5. Serde ------------------------------------------------------------

    #[test]
    fn command_serializes_with_cause() {
        let cmd = Command {
            kind: HostCommand::LoadScene(SceneRequest::Named("MainMenu".into())),
            issued_by: SystemId::ENDING,
            reason: Cause::StateTransition {
                from: "AtExit".into(),
                to: "SceneLoad".into(),
            },
            index: 3,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
