//! Level snapshots with BLAKE3 hashing.
//!
//! [`LevelSnapshot`] is a serializable picture of a running maze: tick
//! metadata, the pending input frame and the gameplay state of every
//! component, plus a BLAKE3 digest of all of it. Two runs that agree on the
//! digest at a tick agree on everything a player could observe.
//!
//! ```
//! use maze_core::prelude::*;
//! use maze_engine::level::Level;
//! use maze_engine::tick::InputFrame;
//!
//! let config = GameConfig::default();
//! let store = std::rc::Rc::new(std::cell::RefCell::new(CheckpointStore::new()));
//! let mut tick_loop = Level::build(&config, 1, store);
//! tick_loop.set_input(InputFrame::axes(0.0, 1.0));
//! tick_loop.run_ticks(10);
//!
//! let snapshot = tick_loop.capture_snapshot();
//! assert_eq!(snapshot.tick_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64);
//! snapshot.verify().unwrap();
//! ```
//!
//! # What Is NOT Captured
//!
//! - **Systems**: fn pointers, rebuilt by [`Level::build`].
//! - **Physics world**: rapier state is derived from the captured positions
//!   and the layout in the config.
//! - **Diagnostics**: per-tick timing is transient.
//!
//! Snapshots are for comparison and inspection. A level is reproduced by
//! replaying its inputs, see [`crate::replay`].

use maze_core::checkpoint::CheckpointStore;
use maze_core::math::Position;
use maze_core::patrol::WaypointPatrol;
use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::tick::{InputFrame, Simulation, TickLoop};

// ---------------------------------------------------------------------------
// LevelSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of a running level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// Build index of the scene.
    pub scene_index: usize,
    /// Ticks executed at the time of capture.
    pub tick_counter: u64,
    /// Fixed time step in seconds per tick.
    pub fixed_dt: f64,
    /// Accumulated scaled time.
    pub game_time: f64,
    /// Input frame pending at the time of capture.
    pub current_input: InputFrame,
    /// Gameplay state of every component, as JSON.
    pub state: serde_json::Value,
    /// BLAKE3 hex digest (64 lowercase hex chars) of everything above.
    pub hash: String,
}

impl LevelSnapshot {
    /// Recompute the digest and compare it with the stored one.
    pub fn verify(&self) -> anyhow::Result<()> {
        let expected = compute_hash(
            self.scene_index,
            self.tick_counter,
            self.fixed_dt,
            self.game_time,
            &self.current_input,
            &self.state,
        );
        if self.hash != expected {
            anyhow::bail!(
                "snapshot hash mismatch at tick {}: stored {}, computed {}",
                self.tick_counter,
                self.hash,
                expected
            );
        }
        Ok(())
    }

    /// Player feet position recorded in the snapshot, if present.
    pub fn player_position(&self) -> Option<Position> {
        serde_json::from_value(self.state.get("player_position")?.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ObserverState<'a> {
    eye: Position,
    in_range: bool,
    patrol: &'a WaypointPatrol,
}

#[derive(Serialize)]
struct PickupState {
    id: u64,
    consumed: bool,
}

#[derive(Serialize)]
struct GameplayState<'a> {
    player_position: Position,
    clock: f32,
    motor: &'a maze_core::movement::PlayerMotor,
    timer: &'a maze_core::timer::CountdownTimer,
    ending: &'a maze_core::ending::EndOfLevel,
    pause: &'a maze_core::pause::PauseMenu,
    checkpoints: CheckpointStore,
    observers: Vec<ObserverState<'a>>,
    pickups: Vec<PickupState>,
    lights: Vec<f32>,
    host: &'a crate::host::Host,
}

fn gameplay_state(tick_loop: &TickLoop<Level>) -> serde_json::Value {
    let level = tick_loop.state();
    let state = GameplayState {
        player_position: level.player_position(),
        clock: level.clock().scale(),
        motor: level.motor(),
        timer: level.timer(),
        ending: level.ending(),
        pause: level.pause(),
        checkpoints: level.checkpoints().borrow().clone(),
        observers: level
            .observers()
            .iter()
            .map(|o| ObserverState {
                eye: o.eye,
                in_range: o.agent.in_range(),
                patrol: &o.patrol,
            })
            .collect(),
        pickups: level
            .pickups()
            .iter()
            .map(|p| PickupState {
                id: p.id.to_raw(),
                consumed: p.collectible.is_consumed(),
            })
            .collect(),
        lights: level.lights().iter().map(|l| l.intensity()).collect(),
        host: tick_loop.host(),
    };
    serde_json::to_value(&state).expect("level state should always be JSON-serializable")
}

/// BLAKE3 hex digest of the hashable snapshot parts. The hash field itself
/// is derived and not included.
fn compute_hash(
    scene_index: usize,
    tick_counter: u64,
    fixed_dt: f64,
    game_time: f64,
    input: &InputFrame,
    state: &serde_json::Value,
) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        scene_index: usize,
        tick_counter: u64,
        fixed_dt: f64,
        game_time: f64,
        current_input: &'a InputFrame,
        state: &'a serde_json::Value,
    }

    let hashable = HashableState {
        scene_index,
        tick_counter,
        fixed_dt,
        game_time,
        current_input: input,
        state,
    };

    let json_bytes = serde_json::to_vec(&hashable)
        .expect("LevelSnapshot state should always be JSON-serializable");

    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// TickLoop methods
// ---------------------------------------------------------------------------

impl TickLoop<Level> {
    /// Capture the current level state and its digest.
    pub fn capture_snapshot(&self) -> LevelSnapshot {
        let scene_index = self.state().scene_index();
        let tick_counter = self.tick_count();
        let fixed_dt = self.fixed_dt();
        let game_time = self.game_time();
        let current_input = self.current_input().clone();
        let state = gameplay_state(self);

        let hash = compute_hash(
            scene_index,
            tick_counter,
            fixed_dt,
            game_time,
            &current_input,
            &state,
        );

        LevelSnapshot {
            scene_index,
            tick_counter,
            fixed_dt,
            game_time,
            current_input,
            state,
            hash,
        }
    }

    /// Digest of the current level state.
    pub fn state_hash(&self) -> String {
        self.capture_snapshot().hash
    }
}
