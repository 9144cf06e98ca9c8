//! Headless maze runner.
//!
//! Usage: `maze_headless [CONFIG.json] [MAX_TICKS]`
//!
//! Starts a session on the main menu, presses start, then steers the player
//! along a fixed route until the session returns to the menu or the tick
//! budget runs out. Scene loads are logged at `info`; set `RUST_LOG=debug`
//! to see every state transition.

use maze_engine::prelude::*;

const DEFAULT_MAX_TICKS: u64 = 3_600;

/// Route through the default layout: round the first wall, touch the save
/// point, then head for the exit.
const ROUTE: [Position; 4] = [
    Position::new(4.0, 0.0, 2.0),
    Position::new(4.0, 0.0, 8.0),
    Position::new(0.0, 0.0, 9.0),
    Position::new(0.0, 0.0, 20.0),
];

const ARRIVAL_RADIUS: f32 = 0.25;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::from_path(&path)?,
        None => GameConfig::default(),
    };
    let max_ticks = match args.next() {
        Some(raw) => raw.parse::<u64>()?,
        None => DEFAULT_MAX_TICKS,
    };

    let mut session = Session::new(config)?;
    let mut waypoint = 0usize;
    let mut started = false;

    for tick in 0..max_ticks {
        let input = match session.level() {
            None if started => {
                tracing::info!(tick, "back on the title screen, stopping");
                break;
            }
            None => {
                started = true;
                InputFrame::press(MenuButton::StartGame)
            }
            Some(level) => steer(level.state().player_position(), &mut waypoint),
        };

        if let Some(change) = session.advance(input)? {
            tracing::info!(tick, from = %change.from, to = %change.to, "scene change");
            waypoint = 0;
        }
        if session.is_quit() {
            break;
        }
    }

    match session.level() {
        Some(level) => {
            let snapshot = level.capture_snapshot();
            tracing::info!(
                scene = %session.active_scene_name(),
                ticks = snapshot.tick_counter,
                time_remaining = level.state().timer().remaining(),
                ending = ?level.state().ending().state(),
                hash = %snapshot.hash,
                "final level state"
            );
        }
        None => tracing::info!(
            scene = %session.active_scene_name(),
            loads = session.load_count(),
            "session ended outside the maze"
        ),
    }
    Ok(())
}

/// Axis input that walks from `from` toward the current waypoint, advancing
/// to the next one on arrival.
fn steer(from: Position, waypoint: &mut usize) -> InputFrame {
    while let Some(target) = ROUTE.get(*waypoint) {
        let dx = target.x - from.x;
        let dz = target.z - from.z;
        if dx.hypot(dz) > ARRIVAL_RADIUS {
            return InputFrame::axes(dx.clamp(-1.0, 1.0), dz.clamp(-1.0, 1.0));
        }
        *waypoint += 1;
    }
    InputFrame::default()
}
