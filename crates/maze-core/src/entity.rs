//! Scene object identifiers.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and an *index* in the low 32 bits. Trigger volumes, ray hits
//! and detection targets all refer to scene objects by `EntityId`, so a
//! consumed collectible whose slot is recycled can never be mistaken for the
//! object that replaced it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational scene object identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Construct an `EntityId` from an index and generation.
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// What role a scene object plays in the level.
///
/// Trigger dispatch uses the kind of the zone that fired to decide which
/// component receives the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player character.
    Player,
    /// Solid maze geometry. Blocks movement and sight.
    Wall,
    /// The exit volume that ends the level successfully.
    ExitZone,
    /// A trigger that saves a checkpoint when the player enters it.
    SavePoint,
    /// A watcher (static gargoyle or patrolling ghost) with a proximity zone.
    Observer,
    /// A pickup that adds time to the countdown.
    Collectible,
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Allocates scene object ids and remembers their [`EntityKind`].
///
/// Free indices are recycled FIFO with a bumped generation, so an id held by
/// a stale trigger event stops resolving as soon as its object is despawned.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Current generation for each index slot.
    generations: Vec<u32>,
    /// Kind of the live object in each slot, `None` when the slot is free.
    kinds: Vec<Option<EntityKind>>,
    /// Recyclable indices, oldest first.
    free_indices: VecDeque<u32>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new object of the given kind.
    pub fn spawn(&mut self, kind: EntityKind) -> EntityId {
        if let Some(index) = self.free_indices.pop_front() {
            self.kinds[index as usize] = Some(kind);
            EntityId::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.kinds.push(Some(kind));
            EntityId::new(index, 0)
        }
    }

    /// Release an object. Returns `false` for ids that are stale or already
    /// despawned.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index() as usize;
        self.kinds[idx] = None;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_indices.push_back(id.index());
        true
    }

    /// Whether `id` refers to a live object.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index() as usize;
        idx < self.generations.len()
            && self.generations[idx] == id.generation()
            && self.kinds[idx].is_some()
    }

    /// The kind of a live object, or `None` for stale ids.
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.is_alive(id) {
            self.kinds[id.index() as usize]
        } else {
            None
        }
    }

    /// Number of live objects.
    pub fn alive_count(&self) -> usize {
        self.kinds.iter().filter(|k| k.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
