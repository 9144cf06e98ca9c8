//! Level configuration.
//!
//! [`GameConfig`] gathers every tunable the level uses, from countdown
//! thresholds to the maze layout. It is plain serde data read from JSON; any
//! section or field missing from the file falls back to the values of the
//! shipped level.
//!
//! # Example
//!
//! ```
//! use maze_core::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "timer": { "total_time": 60.0 } }"#).unwrap();
//! assert_eq!(config.timer.total_time, 60.0);
//! assert_eq!(config.timer.warning_threshold, 10.0);
//! assert_eq!(config.scenes.main_menu, "MainMenu");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::flicker::FlickerMode;
use crate::math::Position;
use crate::MazeError;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Fixed-step settings for the host loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickSettings {
    /// Seconds per tick.
    pub fixed_dt: f64,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

/// Countdown thresholds, all in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Starting time.
    pub total_time: f32,
    /// At or below this the warning cue plays and the text starts blinking.
    pub warning_threshold: f32,
    /// At or below this the map overlay is hidden and the menu revealed.
    pub reveal_threshold: f32,
    /// Half-period of the low-time blink.
    pub blink_period: f32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            total_time: 190.0,
            warning_threshold: 10.0,
            reveal_threshold: 180.0,
            blink_period: 0.5,
        }
    }
}

/// End-of-level fade timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndingConfig {
    /// Seconds for the fade image to reach full opacity.
    pub fade_duration: f32,
    /// Seconds the fully opaque image stays up before the scene changes.
    pub display_duration: f32,
    /// Replays the outcome cue on every tick of the transition, as the
    /// first release of the game did.
    pub replay_cue_every_tick: bool,
}

impl Default for EndingConfig {
    fn default() -> Self {
        Self {
            fade_duration: 1.0,
            display_duration: 1.0,
            replay_cue_every_tick: false,
        }
    }
}

/// Observer sight settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Height added to the target position when aiming the sight ray.
    pub eye_offset: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { eye_offset: 1.0 }
    }
}

/// Player motor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Metres per second at full input.
    pub walk_speed: f32,
    /// Maximum facing change in radians per second.
    pub turn_speed: f32,
    /// Radius of the player capsule.
    pub player_radius: f32,
    /// Half height of the capsule's cylindrical part.
    pub player_half_height: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.0,
            turn_speed: 20.0,
            player_radius: 0.3,
            player_half_height: 0.5,
        }
    }
}

/// Patrol steering settings shared by every moving observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Metres per second.
    pub speed: f32,
    /// Distance at which a waypoint counts as reached.
    pub stopping_distance: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            speed: 1.2,
            stopping_distance: 0.2,
        }
    }
}

/// Light flicker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerConfig {
    /// How intensities are produced.
    pub mode: FlickerMode,
    /// Base seed. Light `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for FlickerConfig {
    fn default() -> Self {
        Self {
            mode: FlickerMode::default(),
            seed: 0x5EED,
        }
    }
}

/// Scene build list and the names gameplay code loads by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Scene names in build-index order.
    pub build: Vec<String>,
    /// Scene loaded on exit, on time expiry and from the in-game menu.
    pub main_menu: String,
    /// Scene the main menu starts.
    pub main_game: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            build: vec!["MainMenu".to_owned(), "MainScene".to_owned()],
            main_menu: "MainMenu".to_owned(),
            main_game: "MainScene".to_owned(),
        }
    }
}

impl SceneConfig {
    /// Build index of a scene name.
    pub fn index_of(&self, name: &str) -> Result<usize, MazeError> {
        self.build
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| MazeError::UnknownScene {
                name: name.to_owned(),
            })
    }

    /// Scene name at a build index.
    pub fn name_at(&self, index: usize) -> Result<&str, MazeError> {
        self.build
            .get(index)
            .map(String::as_str)
            .ok_or(MazeError::SceneIndexOutOfRange {
                index,
                count: self.build.len(),
            })
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// An axis-aligned box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    /// Centre in world space.
    pub center: Position,
    /// Half size along each axis. Every component must be positive.
    pub half_extents: Position,
}

impl BoxSpec {
    /// Construct from a centre and half extents.
    pub fn new(center: Position, half_extents: Position) -> Self {
        Self {
            center,
            half_extents,
        }
    }
}

/// A watcher with a spherical proximity zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSpec {
    /// Eye point at spawn.
    pub position: Position,
    /// Radius of the proximity zone.
    pub sight_radius: f32,
    /// Patrol route. Empty for a stationary gargoyle.
    #[serde(default)]
    pub waypoints: Vec<Position>,
}

/// A time pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectibleSpec {
    /// Pickup volume.
    pub zone: BoxSpec,
    /// Seconds added on pickup.
    pub bonus: f32,
}

/// Maze geometry and object placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Where the player's feet start.
    pub player_start: Position,
    /// The exit volume.
    pub exit: BoxSpec,
    /// Checkpoint volumes.
    pub save_points: Vec<BoxSpec>,
    /// Solid walls.
    pub walls: Vec<BoxSpec>,
    /// Gargoyles and ghosts.
    pub observers: Vec<ObserverSpec>,
    /// Time pickups. The shipped level has none.
    pub collectibles: Vec<CollectibleSpec>,
    /// Number of flickering lights.
    pub lights: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            player_start: Position::new(0.0, 0.0, 0.0),
            exit: BoxSpec::new(Position::new(0.0, 1.0, 20.0), Position::new(2.0, 1.0, 1.0)),
            save_points: vec![BoxSpec::new(Position::new(4.0, 1.0, 8.0), Position::new(1.0, 1.0, 1.0))],
            walls: vec![
                BoxSpec::new(Position::new(-6.0, 1.0, 10.0), Position::new(0.5, 1.0, 12.0)),
                BoxSpec::new(Position::new(6.0, 1.0, 10.0), Position::new(0.5, 1.0, 12.0)),
                BoxSpec::new(Position::new(0.0, 1.0, -2.0), Position::new(6.0, 1.0, 0.5)),
                BoxSpec::new(Position::new(0.0, 1.0, 22.0), Position::new(6.0, 1.0, 0.5)),
                BoxSpec::new(Position::new(-2.0, 1.0, 6.0), Position::new(4.0, 1.0, 0.5)),
                BoxSpec::new(Position::new(2.0, 1.0, 12.0), Position::new(4.0, 1.0, 0.5)),
            ],
            observers: vec![
                ObserverSpec {
                    position: Position::new(-4.0, 1.4, 15.0),
                    sight_radius: 3.0,
                    waypoints: Vec::new(),
                },
                ObserverSpec {
                    position: Position::new(3.0, 1.4, 15.0),
                    sight_radius: 2.5,
                    waypoints: vec![
                        Position::new(3.0, 1.4, 15.0),
                        Position::new(3.0, 1.4, 18.0),
                        Position::new(-3.0, 1.4, 18.0),
                    ],
                },
            ],
            collectibles: Vec::new(),
            lights: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Every tunable of the level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Host loop step.
    pub tick: TickSettings,
    /// Countdown.
    pub timer: TimerConfig,
    /// End-of-level fade.
    pub ending: EndingConfig,
    /// Observer sight.
    pub detection: DetectionConfig,
    /// Player motor.
    pub movement: MovementConfig,
    /// Observer patrols.
    pub patrol: PatrolConfig,
    /// Light flicker.
    pub flicker: FlickerConfig,
    /// Scene names.
    pub scenes: SceneConfig,
    /// Maze geometry.
    pub layout: LayoutConfig,
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, MazeError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MazeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MazeError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), "loaded game config");
        Ok(config)
    }

    /// Check every value is inside its valid range.
    pub fn validate(&self) -> Result<(), MazeError> {
        let dt = self.tick.fixed_dt;
        ensure(dt.is_finite() && dt > 0.0, "tick.fixed_dt", "must be positive and finite")?;

        let t = &self.timer;
        ensure(non_negative(t.total_time), "timer.total_time", "must be non-negative")?;
        ensure(non_negative(t.warning_threshold), "timer.warning_threshold", "must be non-negative")?;
        ensure(non_negative(t.reveal_threshold), "timer.reveal_threshold", "must be non-negative")?;
        ensure(positive(t.blink_period), "timer.blink_period", "must be positive")?;

        ensure(positive(self.ending.fade_duration), "ending.fade_duration", "must be positive")?;
        ensure(
            non_negative(self.ending.display_duration),
            "ending.display_duration",
            "must be non-negative",
        )?;

        ensure(self.detection.eye_offset.is_finite(), "detection.eye_offset", "must be finite")?;

        let m = &self.movement;
        ensure(non_negative(m.walk_speed), "movement.walk_speed", "must be non-negative")?;
        ensure(non_negative(m.turn_speed), "movement.turn_speed", "must be non-negative")?;
        ensure(positive(m.player_radius), "movement.player_radius", "must be positive")?;
        ensure(positive(m.player_half_height), "movement.player_half_height", "must be positive")?;

        ensure(non_negative(self.patrol.speed), "patrol.speed", "must be non-negative")?;
        ensure(
            non_negative(self.patrol.stopping_distance),
            "patrol.stopping_distance",
            "must be non-negative",
        )?;

        self.flicker.mode.validate()?;

        let s = &self.scenes;
        ensure(!s.build.is_empty(), "scenes.build", "must list at least one scene")?;
        s.index_of(&s.main_menu)?;
        s.index_of(&s.main_game)?;

        let l = &self.layout;
        ensure(l.player_start.is_finite(), "layout.player_start", "must be finite")?;
        check_box(&l.exit, "layout.exit")?;
        for (i, b) in l.save_points.iter().enumerate() {
            check_box(b, &format!("layout.save_points[{i}]"))?;
        }
        for (i, b) in l.walls.iter().enumerate() {
            check_box(b, &format!("layout.walls[{i}]"))?;
        }
        for (i, o) in l.observers.iter().enumerate() {
            ensure(
                o.position.is_finite(),
                &format!("layout.observers[{i}].position"),
                "must be finite",
            )?;
            for (j, w) in o.waypoints.iter().enumerate() {
                ensure(
                    w.is_finite(),
                    &format!("layout.observers[{i}].waypoints[{j}]"),
                    "must be finite",
                )?;
            }
            ensure(
                positive(o.sight_radius),
                &format!("layout.observers[{i}].sight_radius"),
                "must be positive",
            )?;
        }
        for (i, c) in l.collectibles.iter().enumerate() {
            check_box(&c.zone, &format!("layout.collectibles[{i}].zone"))?;
            ensure(
                non_negative(c.bonus),
                &format!("layout.collectibles[{i}].bonus"),
                "must be non-negative",
            )?;
        }
        Ok(())
    }
}

// -- validation helpers -------------------------------------------------------

fn ensure(ok: bool, field: &str, reason: &str) -> Result<(), MazeError> {
    if ok {
        Ok(())
    } else {
        Err(MazeError::InvalidConfig {
            field: field.to_owned(),
            reason: reason.to_owned(),
        })
    }
}

fn positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

fn non_negative(v: f32) -> bool {
    v.is_finite() && v >= 0.0
}

fn check_box(b: &BoxSpec, field: &str) -> Result<(), MazeError> {
    ensure(b.center.is_finite(), field, "center must be finite")?;
    let h = b.half_extents;
    ensure(
        positive(h.x) && positive(h.y) && positive(h.z),
        field,
        "half extents must be positive",
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
