//! rapier3d physics integration: walls, trigger volumes, sight rays and the
//! player's character controller.
//!
//! The [`PhysicsWorld`] owns a rapier3d simulation and maps its handles back
//! to maze [`EntityId`]s. It never moves anything on its own: walls and zones
//! are fixed, while the player and the observers are kinematic bodies placed
//! by gameplay code. Each tick:
//!
//! 1. Movement places the player through [`PhysicsWorld::move_character`],
//!    which uses rapier's kinematic character controller so walls block it.
//! 2. Patrols place observers through [`PhysicsWorld::teleport`].
//! 3. [`PhysicsWorld::step`] runs the narrow phase and returns the sensor
//!    enter/exit events as [`ZoneEvent`]s.
//! 4. Detection casts sight rays through the [`SightQuery`] impl.
//!
//! # Determinism
//!
//! rapier3d is compiled with `enhanced-determinism`. Zone events are sorted
//! before they are returned, so channel delivery order never leaks into
//! gameplay.

use std::collections::HashMap;

use maze_core::config::BoxSpec;
use maze_core::detection::{RayHit, SightQuery};
use maze_core::entity::EntityId;
use maze_core::math::Position;
use rapier3d::control::{CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

/// System name used when registering the physics step.
pub const PHYSICS_SYSTEM_NAME: &str = "physics";

fn to_vector(p: Position) -> Vector<Real> {
    vector![p.x, p.y, p.z]
}

fn to_position(v: &Vector<Real>) -> Position {
    Position::new(v.x, v.y, v.z)
}

// ---------------------------------------------------------------------------
// ZoneEvent
// ---------------------------------------------------------------------------

/// Whether a visitor entered or left a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoneEventKind {
    /// The visitor started overlapping the zone.
    Enter,
    /// The visitor stopped overlapping the zone.
    Exit,
}

/// A trigger volume event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneEvent {
    /// Owner of the sensor.
    pub zone: EntityId,
    /// Owner of the other collider.
    pub visitor: EntityId,
    /// Enter or exit.
    pub kind: ZoneEventKind,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

struct CharacterBody {
    shape: SharedShape,
    /// Collider centre relative to the body origin (the feet).
    offset: Real,
}

/// Manages the rapier3d simulation for one level.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    controller: KinematicCharacterController,
    /// Maps EntityId (raw u64) -> rapier RigidBodyHandle.
    entity_to_body: HashMap<u64, RigidBodyHandle>,
    /// Maps rapier ColliderHandle -> EntityId (raw u64).
    collider_to_entity: HashMap<ColliderHandle, u64>,
    characters: HashMap<u64, CharacterBody>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// An empty world with no gravity. Nothing in the maze falls.
    pub fn new() -> Self {
        let controller = KinematicCharacterController {
            offset: CharacterLength::Absolute(0.01),
            snap_to_ground: None,
            autostep: None,
            ..KinematicCharacterController::default()
        };
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, 0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            controller,
            entity_to_body: HashMap::new(),
            collider_to_entity: HashMap::new(),
            characters: HashMap::new(),
        }
    }

    fn insert(&mut self, entity: EntityId, body: RigidBody, collider: Collider) {
        let raw_id = entity.to_raw();
        if self.entity_to_body.contains_key(&raw_id) {
            tracing::warn!(entity = %entity, "entity already has a physics body");
            return;
        }
        let body_handle = self.rigid_body_set.insert(body);
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        self.entity_to_body.insert(raw_id, body_handle);
        self.collider_to_entity.insert(collider_handle, raw_id);
        self.query_pipeline.update(&self.collider_set);
    }

    /// A solid, immovable box.
    pub fn add_wall(&mut self, entity: EntityId, spec: &BoxSpec) {
        let h = spec.half_extents;
        let body = RigidBodyBuilder::fixed().translation(to_vector(spec.center)).build();
        let collider = ColliderBuilder::cuboid(h.x, h.y, h.z).build();
        self.insert(entity, body, collider);
    }

    /// A fixed box trigger: exit, save point or pickup.
    pub fn add_zone(&mut self, entity: EntityId, spec: &BoxSpec) {
        let h = spec.half_extents;
        let body = RigidBodyBuilder::fixed().translation(to_vector(spec.center)).build();
        let collider = ColliderBuilder::cuboid(h.x, h.y, h.z)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_collision_types(ActiveCollisionTypes::all())
            .build();
        self.insert(entity, body, collider);
    }

    /// A solid upright capsule whose body origin is at `feet`.
    pub fn add_character(&mut self, entity: EntityId, feet: Position, radius: f32, half_height: f32) {
        let offset = half_height + radius;
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(feet))
            .build();
        let collider = ColliderBuilder::capsule_y(half_height, radius)
            .translation(vector![0.0, offset, 0.0])
            .build();
        self.insert(entity, body, collider);
        self.characters.insert(
            entity.to_raw(),
            CharacterBody {
                shape: SharedShape::capsule_y(half_height, radius),
                offset,
            },
        );
    }

    /// A kinematic watcher whose proximity zone is a sphere around `eye`.
    pub fn add_observer(&mut self, entity: EntityId, eye: Position, sight_radius: f32) {
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_vector(eye))
            .build();
        let collider = ColliderBuilder::ball(sight_radius)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_collision_types(ActiveCollisionTypes::all())
            .build();
        self.insert(entity, body, collider);
    }

    /// Remove an entity's body and colliders. No-op if it has none.
    pub fn remove_entity(&mut self, entity: EntityId) {
        let raw_id = entity.to_raw();
        if let Some(body_handle) = self.entity_to_body.remove(&raw_id) {
            self.rigid_body_set.remove(
                body_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            self.collider_to_entity.retain(|_, eid| *eid != raw_id);
            self.characters.remove(&raw_id);
            self.query_pipeline.update(&self.collider_set);
        }
    }

    /// Place a kinematic body at `position` without sweeping.
    pub fn teleport(&mut self, entity: EntityId, position: Position) {
        if let Some(rb) = self
            .entity_to_body
            .get(&entity.to_raw())
            .and_then(|h| self.rigid_body_set.get_mut(*h))
        {
            rb.set_translation(to_vector(position), true);
        }
    }

    /// Sweep a character by `desired`, sliding along walls, and place it at
    /// the end of the sweep. Returns the new feet position, or `None` if
    /// `entity` is not a character.
    pub fn move_character(&mut self, entity: EntityId, desired: Position, dt: f32) -> Option<Position> {
        let raw_id = entity.to_raw();
        let character = self.characters.get(&raw_id)?;
        let body_handle = *self.entity_to_body.get(&raw_id)?;
        let feet = *self.rigid_body_set.get(body_handle)?.translation();

        let shape_pos = Isometry::translation(feet.x, feet.y + character.offset, feet.z);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .exclude_rigid_body(body_handle);
        let movement = self.controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            &*character.shape,
            &shape_pos,
            to_vector(desired),
            filter,
            |_| {},
        );

        let next = feet + movement.translation;
        let rb = self.rigid_body_set.get_mut(body_handle)?;
        rb.set_translation(next, true);
        Some(to_position(&next))
    }

    /// Where an entity's body currently is.
    pub fn position_of(&self, entity: EntityId) -> Option<Position> {
        let handle = self.entity_to_body.get(&entity.to_raw())?;
        self.rigid_body_set.get(*handle).map(|rb| to_position(rb.translation()))
    }

    /// Step the simulation by `dt` and report sensor overlaps that started or
    /// stopped.
    ///
    /// Uses crossbeam channels internally to collect rapier events. Events
    /// are sorted by `(zone, visitor, kind)`.
    pub fn step(&mut self, dt: f32) -> Vec<ZoneEvent> {
        self.integration_params.dt = dt;

        let (collision_send, collision_recv) =
            rapier3d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier3d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &event_handler,
        );

        let mut events = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            let (h1, h2, kind) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, ZoneEventKind::Enter),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, ZoneEventKind::Exit),
            };
            if let Some(event) = self.zone_event(h1, h2, kind) {
                events.push(event);
            }
        }

        events.sort_by_key(|e| (e.zone.to_raw(), e.visitor.to_raw(), e.kind));
        events
    }

    /// Orient a collider pair as (sensor, other). Pairs involving removed
    /// colliders, or two sensors, are dropped.
    fn zone_event(&self, h1: ColliderHandle, h2: ColliderHandle, kind: ZoneEventKind) -> Option<ZoneEvent> {
        let s1 = self.collider_set.get(h1)?.is_sensor();
        let s2 = self.collider_set.get(h2)?.is_sensor();
        let (zone, visitor) = match (s1, s2) {
            (true, false) => (h1, h2),
            (false, true) => (h2, h1),
            _ => return None,
        };
        Some(ZoneEvent {
            zone: EntityId::from_raw(*self.collider_to_entity.get(&zone)?),
            visitor: EntityId::from_raw(*self.collider_to_entity.get(&visitor)?),
            kind,
        })
    }

    /// Check if an entity is registered in the physics world.
    pub fn has_entity(&self, entity: EntityId) -> bool {
        self.entity_to_body.contains_key(&entity.to_raw())
    }

    /// Number of physics bodies currently registered.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

impl SightQuery for PhysicsWorld {
    fn cast_ray(&self, origin: Position, direction: Position, exclude: Option<EntityId>) -> Option<RayHit> {
        let dir = to_vector(direction);
        let length = dir.norm();
        if length <= Real::EPSILON {
            return None;
        }
        let ray = Ray::new(point![origin.x, origin.y, origin.z], dir);
        let mut filter = QueryFilter::default().exclude_sensors();
        if let Some(handle) = exclude.and_then(|e| self.entity_to_body.get(&e.to_raw())) {
            filter = filter.exclude_rigid_body(*handle);
        }
        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            Real::MAX,
            true,
            filter,
        )?;
        let entity = EntityId::from_raw(*self.collider_to_entity.get(&handle)?);
        Some(RayHit {
            entity,
            distance: toi * length,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
