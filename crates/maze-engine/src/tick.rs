//! Fixed-timestep tick loop for deterministic simulation.
//!
//! The [`TickLoop`] drives a scene forward. Each tick:
//!
//! 1. The clock multiplier is read from the scene state and combined with the
//!    fixed step into the tick's [`FrameTime`].
//! 2. All registered systems run in declaration order, each receiving the
//!    scene state, a [`TickContext`] with the frame time and input, and the
//!    shared [`CommandBuffer`].
//! 3. The command buffer is drained into the [`Host`] (FIFO, deterministic).
//! 4. The tick counter and the scaled game time advance.
//!
//! Because system ordering is fixed, the command buffer is FIFO, and the only
//! external input is the [`InputFrame`] set before each tick (randomness uses
//! seeded RNGs), the tick loop is fully deterministic: same initial state +
//! same systems + same inputs = same final state.
//!
//! # Example
//!
//! ```
//! use maze_core::prelude::*;
//! use maze_engine::tick::{Simulation, TickConfig, TickLoop};
//!
//! #[derive(Default)]
//! struct Stopwatch {
//!     clock: ClockMultiplier,
//!     elapsed: f32,
//! }
//!
//! impl Simulation for Stopwatch {
//!     fn clock(&self) -> ClockMultiplier {
//!         self.clock
//!     }
//! }
//!
//! let mut tick_loop = TickLoop::new(Stopwatch::default(), TickConfig::default());
//! tick_loop.add_system("stopwatch", |s, ctx, _cmds| {
//!     s.elapsed += ctx.time.scaled();
//! });
//!
//! tick_loop.run_ticks(60);
//! assert_eq!(tick_loop.tick_count(), 60);
//! assert!((tick_loop.state().elapsed - 1.0).abs() < 1e-4);
//! ```

use std::time::{Duration, Instant};

use maze_core::clock::{ClockMultiplier, FrameTime};
use maze_core::command::{Command, CommandBuffer};
use serde::{Deserialize, Serialize};

use crate::host::Host;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
///
/// The `fixed_dt` is the duration in seconds of each simulation tick. A value
/// of `1.0 / 60.0` gives 60 ticks per second.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick (systems + command apply).
    pub total_time: Duration,
    /// Time spent applying commands to the host.
    pub command_apply_time: Duration,
}

// ---------------------------------------------------------------------------
// InputFrame
// ---------------------------------------------------------------------------

/// A menu or HUD button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuButton {
    /// In-game pause button.
    Pause,
    /// In-game resume button.
    Resume,
    /// Escape key: pause or resume.
    TogglePause,
    /// Reload the current level.
    Restart,
    /// Back to the title screen.
    ExitToMenu,
    /// Return to the last checkpoint.
    Respawn,
    /// Title screen start button.
    StartGame,
    /// Title screen quit button.
    Quit,
}

/// One tick of player input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Strafe axis in `[-1, 1]`.
    pub horizontal: f32,
    /// Forward axis in `[-1, 1]`.
    pub vertical: f32,
    /// Buttons pressed this tick, in press order.
    pub buttons: Vec<MenuButton>,
}

impl InputFrame {
    /// Axes only.
    pub fn axes(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
            buttons: Vec::new(),
        }
    }

    /// A single button press and no movement.
    pub fn press(button: MenuButton) -> Self {
        Self {
            buttons: vec![button],
            ..Self::default()
        }
    }

    /// Whether this frame carries no input at all.
    pub fn is_empty(&self) -> bool {
        self.horizontal == 0.0 && self.vertical == 0.0 && self.buttons.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Scene state driven by a [`TickLoop`].
pub trait Simulation {
    /// The multiplier applied to this tick's dt.
    fn clock(&self) -> ClockMultiplier;

    /// Number of flickering lights the host should accept intensities for.
    fn light_count(&self) -> usize {
        0
    }

    /// Called once when the loop is created, before the first tick.
    fn begin(&mut self, _cmds: &mut CommandBuffer) {}
}

/// Per-tick data handed to every system.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Index of the tick being run, starting at 0.
    pub tick: u64,
    /// Raw and scaled dt for this tick.
    pub time: FrameTime,
    /// Player input for this tick.
    pub input: &'a InputFrame,
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// A system function that advances the scene state each tick.
///
/// Systems mutate their own state directly and queue every externally
/// visible effect (audio, HUD, scene loads) in the [`CommandBuffer`], so the
/// host sees effects in a single deterministic order.
pub type SystemFn<S> = fn(&mut S, &TickContext<'_>, &mut CommandBuffer);

/// A named system in the registry.
///
/// The `after` field lists the names of systems that must execute before
/// this system.
struct RegisteredSystem<S> {
    name: String,
    func: SystemFn<S>,
    after: Vec<String>,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The deterministic fixed-timestep tick loop.
///
/// # Determinism Guarantee
///
/// Given the same initial state, the same registered systems (in the same
/// order), and the same input frames, the tick loop produces identical
/// results across runs. This is guaranteed by:
///
/// - Fixed system execution order (declaration order).
/// - Deterministic command application (FIFO).
/// - Real time computed as `tick_count * fixed_dt`, not accumulated.
pub struct TickLoop<S> {
    state: S,
    host: Host,
    command_buffer: CommandBuffer,
    systems: Vec<RegisteredSystem<S>>,
    tick_counter: u64,
    fixed_dt: f64,
    /// Sum of scaled dt. Stands still while the clock is frozen.
    game_time: f64,
    last_diagnostics: TickDiagnostics,
    /// Input for the next tick. Consumed by [`TickLoop::tick`].
    current_input: InputFrame,
}

impl<S: Simulation> TickLoop<S> {
    /// Create a new tick loop around `state`.
    ///
    /// Calls [`Simulation::begin`] and applies whatever it queued, so the
    /// host reflects the scene's opening state before the first tick.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(mut state: S, config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        let mut host = Host::new(state.light_count());
        let mut command_buffer = CommandBuffer::new();
        state.begin(&mut command_buffer);
        host.apply_all(&command_buffer.take());
        Self {
            state,
            host,
            command_buffer,
            systems: Vec::new(),
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            game_time: 0.0,
            last_diagnostics: TickDiagnostics::default(),
            current_input: InputFrame::default(),
        }
    }

    /// Register a system to be run each tick.
    ///
    /// Systems are executed in the order they are registered.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn<S>) {
        self.add_system_after(name, &[], func);
    }

    /// Register a system with explicit execution dependencies.
    ///
    /// `after` lists system names that must execute before this system.
    ///
    /// # Panics
    ///
    /// - If any system in `after` is not already registered.
    /// - If a system with this name already exists.
    /// - If adding this system would create a dependency cycle.
    pub fn add_system_after(&mut self, name: &str, after: &[&str], func: SystemFn<S>) {
        for dep in after {
            assert!(
                self.systems.iter().any(|s| s.name == *dep),
                "system '{name}' declares dependency on '{dep}', but '{dep}' is not registered"
            );
        }

        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );

        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
            after: after.iter().map(|s| s.to_string()).collect(),
        });

        self.validate_system_order();
    }

    /// Depth-first search with a recursion stack to detect back edges.
    ///
    /// # Panics
    ///
    /// Panics if a cycle is detected in the dependency graph.
    fn validate_system_order(&self) {
        let mut visited = vec![false; self.systems.len()];
        let mut in_stack = vec![false; self.systems.len()];

        fn dfs<S>(
            systems: &[RegisteredSystem<S>],
            idx: usize,
            visited: &mut [bool],
            in_stack: &mut [bool],
        ) -> bool {
            if in_stack[idx] {
                return false;
            }
            if visited[idx] {
                return true;
            }
            visited[idx] = true;
            in_stack[idx] = true;
            for dep_name in &systems[idx].after {
                if let Some(dep_idx) = systems.iter().position(|s| s.name == *dep_name) {
                    if !dfs(systems, dep_idx, visited, in_stack) {
                        return false;
                    }
                }
            }
            in_stack[idx] = false;
            true
        }

        for i in 0..self.systems.len() {
            assert!(
                dfs(&self.systems, i, &mut visited, &mut in_stack),
                "cycle detected in system dependencies"
            );
        }
    }

    /// Execute one simulation tick.
    ///
    /// Consumes the input set with [`set_input`](Self::set_input); a tick
    /// with no input set sees an empty frame. Returns the commands applied
    /// to the host this tick, in order.
    pub fn tick(&mut self) -> Vec<Command> {
        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());

        let input = std::mem::take(&mut self.current_input);
        let ctx = TickContext {
            tick: self.tick_counter,
            time: FrameTime::new(self.fixed_dt as f32, self.state.clock()),
            input: &input,
        };

        for system in &self.systems {
            let sys_start = Instant::now();
            (system.func)(&mut self.state, &ctx, &mut self.command_buffer);
            system_times.push((system.name.clone(), sys_start.elapsed()));
        }

        let apply_start = Instant::now();
        let applied = self.command_buffer.take();
        self.host.apply_all(&applied);
        let command_apply_time = apply_start.elapsed();

        self.game_time += f64::from(ctx.time.scaled());
        self.tick_counter += 1;

        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
            command_apply_time,
        };

        tracing::trace!(
            tick = ctx.tick,
            commands = applied.len(),
            frozen = ctx.time.is_frozen(),
            "tick complete"
        );
        applied
    }

    /// Run multiple ticks with no input. Returns the total number of
    /// commands applied.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut total_commands = 0u64;
        for _ in 0..count {
            total_commands += self.tick().len() as u64;
        }
        total_commands
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Real simulation time in seconds, `tick_count * fixed_dt`.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    /// Scaled time in seconds. Does not advance while paused.
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// The scene state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable access to the scene state, for setup and tests.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// The host the commands are applied to.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Diagnostics from the last tick (timing per system).
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Set the input frame for the next tick.
    pub fn set_input(&mut self, input: InputFrame) {
        self.current_input = input;
    }

    /// The input frame the next tick will see.
    pub fn current_input(&self) -> &InputFrame {
        &self.current_input
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
