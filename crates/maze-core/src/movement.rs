//! Player motor: input axes to planar displacement, facing and footsteps.

use std::f32::consts::PI;

use serde::Serialize;

use crate::command::{AudioCue, Cause, CommandBuffer, HostCommand, SystemId};
use crate::config::MovementConfig;
use crate::math::Position;

const AXIS_DEADZONE: f32 = 1e-6;

/// Result of one motor step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorStep {
    /// Desired planar displacement for this tick, before collision.
    pub displacement: Position,
    /// Whether any input axis is held.
    pub walking: bool,
    /// Unit planar facing after this tick's turn.
    pub facing: Position,
}

/// Turns the two input axes into movement.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerMotor {
    walk_speed: f32,
    turn_speed: f32,
    facing: Position,
    walking: bool,
}

impl PlayerMotor {
    /// A motor facing +z.
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            walk_speed: config.walk_speed,
            turn_speed: config.turn_speed,
            facing: Position::FORWARD,
            walking: false,
        }
    }

    /// Advance by `dt` with the given axes, each clamped to `[-1, 1]`.
    ///
    /// Footsteps start when walking starts and stop when it stops.
    pub fn step(
        &mut self,
        horizontal: f32,
        vertical: f32,
        dt: f32,
        cmds: &mut CommandBuffer,
    ) -> MotorStep {
        let h = clamp_axis(horizontal);
        let v = clamp_axis(vertical);
        let direction = Position::new(h, 0.0, v).normalized();
        let walking = h.abs() > AXIS_DEADZONE || v.abs() > AXIS_DEADZONE;

        if walking != self.walking {
            let kind = if walking {
                HostCommand::PlayAudio(AudioCue::Footsteps)
            } else {
                HostCommand::StopAudio(AudioCue::Footsteps)
            };
            cmds.push(kind, SystemId::MOVEMENT, Cause::PlayerInput("walk".to_owned()));
            self.walking = walking;
        }

        if walking {
            self.facing = rotate_towards(self.facing, direction, self.turn_speed * dt.max(0.0));
        }

        MotorStep {
            displacement: direction * (self.walk_speed * dt.max(0.0)),
            walking,
            facing: self.facing,
        }
    }

    /// Current facing.
    pub fn facing(&self) -> Position {
        self.facing
    }

    /// Whether the player was walking on the last step.
    pub fn is_walking(&self) -> bool {
        self.walking
    }
}

fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Rotate the planar unit vector `from` toward `to` by at most `max_radians`.
fn rotate_towards(from: Position, to: Position, max_radians: f32) -> Position {
    if to.planar().length() <= f32::EPSILON {
        return from;
    }
    let current = from.x.atan2(from.z);
    let target = to.x.atan2(to.z);
    let mut delta = target - current;
    while delta > PI {
        delta -= 2.0 * PI;
    }
    while delta < -PI {
        delta += 2.0 * PI;
    }
    let angle = current + delta.clamp(-max_radians, max_radians);
    Position::new(angle.sin(), 0.0, angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motor() -> PlayerMotor {
        PlayerMotor::new(&MovementConfig::default())
    }

    #[test]
    fn idle_motor_stays_put() {
        let mut m = motor();
        let mut cmds = CommandBuffer::new();
        let step = m.step(0.0, 0.0, 0.1, &mut cmds);
        assert!(!step.walking);
        assert_eq!(step.displacement, Position::ZERO);
        assert!(cmds.is_empty());
    }

    #[test]
    fn diagonal_input_is_normalised() {
        let mut m = motor();
        let mut cmds = CommandBuffer::new();
        let step = m.step(1.0, 1.0, 1.0, &mut cmds);
        assert!((step.displacement.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn axes_are_clamped() {
        let mut m = motor();
        let mut cmds = CommandBuffer::new();
        let step = m.step(0.0, 5.0, 1.0, &mut cmds);
        assert!((step.displacement.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn footsteps_follow_walking_edges() {
        let mut m = motor();
        let mut cmds = CommandBuffer::new();
        m.step(1.0, 0.0, 0.1, &mut cmds);
        m.step(1.0, 0.0, 0.1, &mut cmds);
        m.step(0.0, 0.0, 0.1, &mut cmds);
        let kinds: Vec<_> = cmds.kinds().cloned().collect();
        assert_eq!(
            kinds,
            vec![
                HostCommand::PlayAudio(AudioCue::Footsteps),
                HostCommand::StopAudio(AudioCue::Footsteps),
            ]
        );
    }

    #[test]
    fn turn_is_rate_limited() {
        let mut m = motor();
        let mut cmds = CommandBuffer::new();
        // 20 rad/s over 0.01 s allows 0.2 rad of the quarter turn to +x.
        let step = m.step(1.0, 0.0, 0.01, &mut cmds);
        let angle = step.facing.x.atan2(step.facing.z);
        assert!((angle - 0.2).abs() < 1e-5);

        let step = m.step(1.0, 0.0, 1.0, &mut cmds);
        assert!((step.facing.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotate_towards_takes_short_way_round() {
        let from = Position::new(-0.1f32.sin(), 0.0, -0.1f32.cos());
        let to = Position::new(0.1f32.sin(), 0.0, -0.1f32.cos());
        let r = rotate_towards(from, to, 10.0);
        assert!((r.x - to.x).abs() < 1e-5 && (r.z - to.z).abs() < 1e-5);
    }
}
