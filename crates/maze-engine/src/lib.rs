//! Maze Engine -- headless host for the Shadow Maze gameplay logic.
//!
//! This crate builds on [`maze_core`] to run the level: a fixed-timestep
//! tick loop that runs named systems in a deterministic order, a rapier3d
//! physics world answering sight rays and trigger volumes, a [`Host`](host::Host)
//! that applies the queued commands to a simulated audio mixer and HUD, and a
//! [`Session`](session::Session) that performs scene loads.
//!
//! # Quick Start
//!
//! ```
//! use maze_engine::prelude::*;
//!
//! let mut session = Session::starting_at(GameConfig::default(), "MainScene").unwrap();
//!
//! for _ in 0..60 {
//!     session.advance(InputFrame::axes(0.0, 1.0)).unwrap();
//! }
//!
//! let level = session.level().unwrap();
//! assert_eq!(level.tick_count(), 60);
//! assert!(level.state().player_position().z > 1.5);
//! assert!(level.host().audio().is_playing(AudioCue::Footsteps));
//! ```

#![deny(unsafe_code)]

pub mod host;
pub mod level;
pub mod physics;
pub mod replay;
pub mod session;
pub mod snapshot;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the gameplay crate for convenience.
pub use maze_core;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use maze_core::prelude::*;

    pub use crate::host::{AudioMixer, Host, Hud, SourceState};
    pub use crate::level::{Level, Observer, Pickup};
    pub use crate::physics::{PhysicsWorld, ZoneEvent, ZoneEventKind, PHYSICS_SYSTEM_NAME};
    pub use crate::replay::{
        replay, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::session::{ActiveScene, SceneChange, Session, TitleScreen};
    pub use crate::snapshot::LevelSnapshot;
    pub use crate::tick::{
        InputFrame, MenuButton, Simulation, SystemFn, TickConfig, TickContext, TickDiagnostics,
        TickLoop,
    };
}
