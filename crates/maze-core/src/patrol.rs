//! Waypoint patrol steering.
//!
//! Moves straight toward the current waypoint at a fixed speed, and switches
//! to the next one (wrapping) once closer than the stopping distance.

use serde::Serialize;

use crate::config::PatrolConfig;
use crate::math::Position;

/// Cycles an observer through a fixed route.
#[derive(Debug, Clone, Serialize)]
pub struct WaypointPatrol {
    waypoints: Vec<Position>,
    index: usize,
    speed: f32,
    stopping_distance: f32,
}

impl WaypointPatrol {
    /// A patrol starting at the first waypoint. An empty route never moves.
    pub fn new(waypoints: Vec<Position>, config: &PatrolConfig) -> Self {
        Self {
            waypoints,
            index: 0,
            speed: config.speed,
            stopping_distance: config.stopping_distance,
        }
    }

    /// New position after `dt` seconds starting from `position`.
    pub fn step(&mut self, position: Position, dt: f32) -> Position {
        let Some(&target) = self.waypoints.get(self.index) else {
            return position;
        };
        if position.distance(target) < self.stopping_distance {
            self.index = (self.index + 1) % self.waypoints.len();
            tracing::trace!(waypoint = self.index, "patrol advanced");
        }
        let target = self.waypoints[self.index];
        let to_target = target - position;
        let remaining = to_target.length();
        let travel = self.speed * dt.max(0.0);
        if remaining <= travel {
            target
        } else {
            position + to_target.normalized() * travel
        }
    }

    /// Index of the waypoint currently steered toward.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Whether this patrol has a route.
    pub fn is_moving(&self) -> bool {
        !self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> WaypointPatrol {
        WaypointPatrol::new(
            vec![Position::new(0.0, 0.0, 0.0), Position::new(0.0, 0.0, 2.0)],
            &PatrolConfig {
                speed: 1.0,
                stopping_distance: 0.1,
            },
        )
    }

    #[test]
    fn empty_route_is_stationary() {
        let mut p = WaypointPatrol::new(Vec::new(), &PatrolConfig::default());
        let here = Position::new(1.0, 0.0, 1.0);
        assert_eq!(p.step(here, 1.0), here);
        assert!(!p.is_moving());
    }

    #[test]
    fn advances_and_wraps() {
        let mut p = route();
        let mut pos = Position::ZERO;
        pos = p.step(pos, 0.5);
        assert_eq!(p.current_index(), 1);
        assert!((pos.z - 0.5).abs() < 1e-6);

        for _ in 0..3 {
            pos = p.step(pos, 0.5);
        }
        assert_eq!(pos, Position::new(0.0, 0.0, 2.0));
        p.step(pos, 0.5);
        assert_eq!(p.current_index(), 0);
    }

    #[test]
    fn does_not_overshoot() {
        let mut p = route();
        let pos = p.step(Position::ZERO, 0.0);
        assert_eq!(p.current_index(), 1);
        let pos = p.step(pos, 10.0);
        assert_eq!(pos, Position::new(0.0, 0.0, 2.0));
    }
}
