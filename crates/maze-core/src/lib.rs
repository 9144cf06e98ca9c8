//! Maze Core -- engine-independent gameplay logic for the Shadow Maze level.
//!
//! Every gameplay component in this crate is a small state machine driven by
//! explicit handlers (`tick`, `on_zone_enter`, `on_zone_exit`) that a host
//! scheduler calls once per frame. Components never talk to an engine
//! directly: side effects such as playing a sound, toggling a HUD element or
//! loading a scene are queued as [`HostCommand`](command::HostCommand)s in a
//! [`CommandBuffer`](command::CommandBuffer) and applied by the host after
//! all components have run.
//!
//! Time reaches every component as a [`FrameTime`](clock::FrameTime), the raw
//! frame delta multiplied by the shared [`ClockMultiplier`](clock::ClockMultiplier).
//! Pausing the game is nothing more than setting that multiplier to zero.
//!
//! # Quick Start
//!
//! ```
//! use maze_core::prelude::*;
//!
//! let mut timer = CountdownTimer::new(TimerConfig::default());
//! let mut cmds = CommandBuffer::new();
//!
//! timer.begin(&mut cmds);
//! let signals = timer.tick(5.0, &mut cmds);
//!
//! assert!(!signals.expired);
//! assert_eq!(timer.remaining(), 185.0);
//! ```

#![deny(unsafe_code)]

pub mod checkpoint;
pub mod clock;
pub mod collectible;
pub mod command;
pub mod config;
pub mod detection;
pub mod ending;
pub mod entity;
pub mod flicker;
pub mod math;
pub mod menu;
pub mod movement;
pub mod patrol;
pub mod pause;
pub mod persistent;
pub mod timer;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by gameplay and configuration operations.
///
/// Most runtime gameplay never fails: absent optional references are skipped
/// by the host. The variants here cover the few places where a caller must
/// decide what to do.
#[derive(Debug, thiserror::Error)]
pub enum MazeError {
    /// A checkpoint was loaded before any checkpoint was saved.
    #[error("no checkpoint has been saved yet")]
    NoCheckpoint,

    /// A scene was requested by a name the scene registry does not know.
    #[error("scene '{name}' is not in the build list")]
    UnknownScene { name: String },

    /// A scene was requested by a build index past the end of the registry.
    #[error("scene index {index} is out of range (build list has {count} scenes)")]
    SceneIndexOutOfRange { index: usize, count: usize },

    /// A configuration value is outside its valid range.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The configuration file could not be read.
    #[error("failed to read config file '{path}'")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`config::GameConfig`].
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::checkpoint::{Checkpoint, CheckpointStore};
    pub use crate::clock::{ClockMultiplier, FrameTime};
    pub use crate::collectible::TimeCollectible;
    pub use crate::command::{
        AudioCue, Cause, Command, CommandBuffer, FadeImage, HostCommand, SceneRequest, SystemId,
        TimerColor, UiElement,
    };
    pub use crate::config::{
        DetectionConfig, EndingConfig, FlickerConfig, GameConfig, LayoutConfig, MovementConfig,
        PatrolConfig, SceneConfig, TickSettings, TimerConfig,
    };
    pub use crate::detection::{DetectionAgent, RayHit, SightQuery};
    pub use crate::ending::{EndOfLevel, EndState, Outcome};
    pub use crate::entity::{EntityId, EntityKind, EntityRegistry};
    pub use crate::flicker::{FlickerMode, LightFlicker};
    pub use crate::math::Position;
    pub use crate::menu::MainMenu;
    pub use crate::movement::{MotorStep, PlayerMotor};
    pub use crate::patrol::WaypointPatrol;
    pub use crate::pause::PauseMenu;
    pub use crate::persistent::{Claim, PersistentSlot, Shared};
    pub use crate::timer::{format_clock, CountdownTimer, TimerSignals};
    pub use crate::MazeError;
}
