//! Proximity plus line-of-sight detection.
//!
//! A [`DetectionAgent`] watches for one specific target. Its proximity zone
//! raises enter/exit events; while the target is inside, every tick the agent
//! casts a ray from its eye toward the target, raised by the eye offset. The
//! target is spotted only when it is the first thing the ray hits.

use serde::Serialize;

use crate::entity::EntityId;
use crate::math::Position;

/// The nearest surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Owner of the struck collider.
    pub entity: EntityId,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// Nearest-hit ray casting, provided by whatever owns the level geometry.
pub trait SightQuery {
    /// Cast an unbounded ray and return the first solid surface hit.
    ///
    /// `direction` need not be normalised. Colliders belonging to `exclude`
    /// are ignored, and so are trigger volumes.
    fn cast_ray(
        &self,
        origin: Position,
        direction: Position,
        exclude: Option<EntityId>,
    ) -> Option<RayHit>;
}

/// A gargoyle or ghost looking for the player.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionAgent {
    id: EntityId,
    target: EntityId,
    eye_offset: f32,
    in_range: bool,
}

impl DetectionAgent {
    /// An agent `id` tracking `target`.
    pub fn new(id: EntityId, target: EntityId, eye_offset: f32) -> Self {
        Self {
            id,
            target,
            eye_offset,
            in_range: false,
        }
    }

    /// Proximity zone entered by `other`.
    pub fn on_zone_enter(&mut self, other: EntityId) {
        if other == self.target {
            self.in_range = true;
            tracing::debug!(agent = %self.id, "target in range");
        }
    }

    /// Proximity zone left by `other`.
    pub fn on_zone_exit(&mut self, other: EntityId) {
        if other == self.target {
            self.in_range = false;
            tracing::debug!(agent = %self.id, "target out of range");
        }
    }

    /// Whether the target can be seen from `eye`. Always `false` while the
    /// target is out of range.
    pub fn check(&self, eye: Position, target_position: Position, sight: &dyn SightQuery) -> bool {
        if !self.in_range {
            return false;
        }
        let direction = target_position - eye + Position::UP * self.eye_offset;
        match sight.cast_ray(eye, direction, Some(self.id)) {
            Some(hit) => hit.entity == self.target,
            None => false,
        }
    }

    /// This agent's id.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The tracked target.
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Whether the target is inside the proximity zone.
    pub fn in_range(&self) -> bool {
        self.in_range
    }
}
