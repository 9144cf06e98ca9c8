//! Deterministic replay with input recording and checkpoint verification.
//!
//! A level is fully determined by its [`GameConfig`], its build index, the
//! checkpoint it inherits from the session and the input frames fed to it.
//! [`ReplayRecorder`] captures exactly that, plus periodic state hashes, into
//! a [`ReplayLog`]. [`replay`] rebuilds the level from the log, feeds the
//! inputs tick by tick and compares hashes at each checkpoint.
//!
//! # Recording
//!
//! ```
//! use maze_core::prelude::*;
//! use maze_engine::level::Level;
//! use maze_engine::replay::{replay, ReplayRecorder};
//! use maze_engine::tick::InputFrame;
//!
//! let store = std::rc::Rc::new(std::cell::RefCell::new(CheckpointStore::new()));
//! let mut tick_loop = Level::build(&GameConfig::default(), 1, store);
//! let mut recorder = ReplayRecorder::new(&tick_loop, 10);
//!
//! for _ in 0..60 {
//!     tick_loop.set_input(InputFrame::axes(0.0, 1.0));
//!     let hash = tick_loop.state_hash();
//!     recorder.record_tick(tick_loop.tick_count(), tick_loop.current_input(), Some(hash));
//!     tick_loop.tick();
//! }
//!
//! let log = recorder.finish();
//! let result = replay(&log).unwrap();
//! assert!(result.completed);
//! assert_eq!(result.final_hash, tick_loop.state_hash());
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use maze_core::checkpoint::{Checkpoint, CheckpointStore};
use maze_core::config::GameConfig;
use serde::{Deserialize, Serialize};

use crate::level::Level;
use crate::tick::{InputFrame, TickLoop};

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// A complete replay log: everything needed to rebuild the level, plus the
/// ordered inputs and checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    /// Configuration the level was built from.
    pub config: GameConfig,
    /// Build index of the recorded scene.
    pub scene_index: usize,
    /// Checkpoint the level inherited from the session, if any.
    pub initial_checkpoint: Option<Checkpoint>,
    /// State hash of the level before its first tick.
    pub initial_hash: String,
    /// Number of ticks recorded. Replay executes exactly this many.
    pub total_ticks: u64,
    /// Inputs and checkpoints in recording order.
    pub entries: Vec<ReplayEntry>,
}

/// A single entry in a [`ReplayLog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// An input frame recorded at the given tick.
    Input {
        /// Tick the input was active for.
        tick: u64,
        /// The input.
        input: InputFrame,
    },
    /// A state hash taken before the given tick executed.
    Checkpoint {
        /// Tick number.
        tick: u64,
        /// BLAKE3 hex digest of the level at this tick.
        state_hash: String,
    },
}

/// The outcome of [`replay`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Whether every recorded tick was replayed.
    pub completed: bool,
    /// Ticks actually executed.
    pub ticks_replayed: u64,
    /// The first checkpoint whose hash did not match. `None` if all matched.
    pub first_divergence: Option<ReplayDivergence>,
    /// State hash of the replayed level when replay stopped.
    pub final_hash: String,
}

/// Details about a determinism failure detected during replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayDivergence {
    /// Tick of the mismatching checkpoint.
    pub tick: u64,
    /// Hash recorded in the log.
    pub expected_hash: String,
    /// Hash computed during replay.
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Records a level run into a [`ReplayLog`].
///
/// Call [`record_tick`](Self::record_tick) after setting the tick's input
/// and before executing it. Tick numbers must strictly increase.
pub struct ReplayRecorder {
    log: ReplayLog,
    checkpoint_interval: u64,
    ticks_recorded: u64,
    last_tick: Option<u64>,
}

impl ReplayRecorder {
    /// Start recording `tick_loop`, which must not have ticked yet.
    ///
    /// `checkpoint_interval` of 10 keeps hashes at ticks 0, 10, 20 and so on.
    /// Zero keeps every hash passed to [`record_tick`](Self::record_tick).
    pub fn new(tick_loop: &TickLoop<Level>, checkpoint_interval: u64) -> Self {
        let level = tick_loop.state();
        Self {
            log: ReplayLog {
                config: level.config().clone(),
                scene_index: level.scene_index(),
                initial_checkpoint: level.checkpoints().borrow().load().ok(),
                initial_hash: tick_loop.state_hash(),
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            ticks_recorded: 0,
            last_tick: None,
        }
    }

    /// Record a single tick.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is not strictly greater than the previous call's.
    pub fn record_tick(&mut self, tick: u64, input: &InputFrame, state_hash: Option<String>) {
        if let Some(prev) = self.last_tick {
            assert!(
                tick > prev,
                "ReplayRecorder::record_tick: tick {tick} is not strictly greater than previous tick {prev}"
            );
        }
        self.last_tick = Some(tick);
        self.ticks_recorded += 1;

        if !input.is_empty() {
            self.log.entries.push(ReplayEntry::Input {
                tick,
                input: input.clone(),
            });
        }

        if let Some(hash) = state_hash {
            let should_checkpoint =
                self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0;
            if should_checkpoint {
                self.log.entries.push(ReplayEntry::Checkpoint {
                    tick,
                    state_hash: hash,
                });
            }
        }
    }

    /// Finish recording and return the log.
    pub fn finish(mut self) -> ReplayLog {
        self.log.total_ticks = self.ticks_recorded;
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Rebuild the level described by `log` and replay its inputs.
///
/// Replay stops at the first checkpoint whose hash differs and reports it in
/// [`ReplayResult::first_divergence`].
///
/// # Errors
///
/// Returns an error if the log is malformed (duplicate entries for a tick),
/// its config does not validate, or the rebuilt level does not hash to the
/// recorded initial state.
pub fn replay(log: &ReplayLog) -> anyhow::Result<ReplayResult> {
    let mut input_map: BTreeMap<u64, InputFrame> = BTreeMap::new();
    let mut checkpoint_map: BTreeMap<u64, String> = BTreeMap::new();

    for entry in &log.entries {
        match entry {
            ReplayEntry::Input { tick, input } => {
                if input_map.insert(*tick, input.clone()).is_some() {
                    anyhow::bail!("replay log contains duplicate Input entry at tick {tick}");
                }
            }
            ReplayEntry::Checkpoint { tick, state_hash } => {
                if checkpoint_map.insert(*tick, state_hash.clone()).is_some() {
                    anyhow::bail!("replay log contains duplicate Checkpoint entry at tick {tick}");
                }
            }
        }
    }

    log.config
        .validate()
        .map_err(|e| anyhow::anyhow!("replay log config is invalid: {e}"))?;
    let scene = log.config.scenes.name_at(log.scene_index)?;

    let mut store = CheckpointStore::new();
    if let Some(checkpoint) = log.initial_checkpoint {
        store.save(checkpoint.position, checkpoint.time_remaining);
    }
    let mut tick_loop = Level::build(&log.config, log.scene_index, Rc::new(RefCell::new(store)));

    let initial_hash = tick_loop.state_hash();
    if initial_hash != log.initial_hash {
        anyhow::bail!(
            "rebuilt level does not match recorded initial state: expected {}, got {}",
            log.initial_hash,
            initial_hash
        );
    }
    tracing::debug!(scene = %scene, ticks = log.total_ticks, "replaying");

    let mut ticks_replayed: u64 = 0;
    for tick in 0..log.total_ticks {
        tick_loop.set_input(input_map.get(&tick).cloned().unwrap_or_default());

        if let Some(expected_hash) = checkpoint_map.get(&tick) {
            let actual_hash = tick_loop.state_hash();
            if &actual_hash != expected_hash {
                tracing::warn!(tick, "replay diverged");
                return Ok(ReplayResult {
                    completed: false,
                    ticks_replayed,
                    first_divergence: Some(ReplayDivergence {
                        tick,
                        expected_hash: expected_hash.clone(),
                        actual_hash: actual_hash.clone(),
                    }),
                    final_hash: actual_hash,
                });
            }
        }

        tick_loop.tick();
        ticks_replayed += 1;
    }

    Ok(ReplayResult {
        completed: true,
        ticks_replayed,
        first_divergence: None,
        final_hash: tick_loop.state_hash(),
    })
}
