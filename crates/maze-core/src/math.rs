//! Minimal 3D vector type shared by gameplay components.
//!
//! The physics host converts to and from its own vector types at the
//! boundary; gameplay code only needs component-wise arithmetic, lengths and
//! normalisation. The y axis points up.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Right.
    pub x: f32,
    /// Up.
    pub y: f32,
    /// Forward.
    pub z: f32,
}

impl Position {
    /// The origin.
    pub const ZERO: Position = Position::new(0.0, 0.0, 0.0);
    /// One unit up the y axis.
    pub const UP: Position = Position::new(0.0, 1.0, 0.0);
    /// One unit along +z, the default facing.
    pub const FORWARD: Position = Position::new(0.0, 0.0, 1.0);

    /// Construct from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, other: Position) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Distance between two points.
    pub fn distance(self, other: Position) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized(self) -> Position {
        let len = self.length();
        if len <= f32::EPSILON {
            Position::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// The same vector with its vertical component dropped.
    pub fn planar(self) -> Position {
        Position::new(self.x, 0.0, self.z)
    }

    /// Whether every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Position {
    type Output = Position;
    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        *self = *self + rhs;
    }
}

impl Sub for Position {
    type Output = Position;
    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Position {
    type Output = Position;
    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Position {
    type Output = Position;
    fn neg(self) -> Position {
        Position::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Position::ZERO.normalized(), Position::ZERO);
    }

    #[test]
    fn normalized_has_unit_length() {
        let v = Position::new(3.0, 0.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn arithmetic() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(0.5, 0.5, 0.5);
        assert_eq!(a - b, Position::new(0.5, 1.5, 2.5));
        assert_eq!(a + b * 2.0, Position::new(2.0, 3.0, 4.0));
        assert_eq!(a.distance(a), 0.0);
    }
}
