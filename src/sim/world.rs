//! Collaborator seams: the entity world and the drop supplier
//!
//! The engine never owns entities. It asks an [`EntityWorld`] to spawn,
//! destroy, locate and scale them, and a [`KindSupplier`] what to drop next.
//! [`SimWorld`] is a plain in-memory world used by the headless runner and
//! the tests.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{DropKind, EntityId, EntityKind};

/// Spawn/destroy primitives provided by the physics host
pub trait EntityWorld {
    /// Materialize an entity. Ids must come from an increasing sequence.
    fn spawn(&mut self, kind: EntityKind, pos: Vec2, impulse: Vec2) -> EntityId;
    /// Remove an entity. Returns false if it was not alive.
    fn destroy(&mut self, id: EntityId) -> bool;
    fn is_alive(&self, id: EntityId) -> bool;
    fn position(&self, id: EntityId) -> Option<Vec2>;
    /// Multiply an entity's extent. Returns false if it was not alive.
    fn scale(&mut self, id: EntityId, factor: f32) -> bool;
}

/// The drop selector. Its probabilities are its own business.
pub trait KindSupplier {
    fn supply_next_kind(&mut self) -> DropKind;
}

/// Supplier that hands out a fixed sequence forever
#[derive(Debug, Clone)]
pub struct CyclingSupplier {
    kinds: Vec<DropKind>,
    cursor: usize,
}

impl CyclingSupplier {
    /// `kinds` must not be empty
    pub fn new(kinds: Vec<DropKind>) -> Option<Self> {
        (!kinds.is_empty()).then_some(Self { kinds, cursor: 0 })
    }
}

impl KindSupplier for CyclingSupplier {
    fn supply_next_kind(&mut self) -> DropKind {
        let kind = self.kinds[self.cursor % self.kinds.len()];
        self.cursor += 1;
        kind
    }
}

/// A body in the in-memory world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Last impulse received (no integration happens here)
    pub vel: Vec2,
    /// Extent multiplier, 1.0 at spawn
    pub scale: f32,
}

/// In-memory entity world (no physics, bodies stay where they are put)
#[derive(Debug, Clone)]
pub struct SimWorld {
    /// Live bodies (sorted by id for determinism)
    bodies: BTreeMap<EntityId, Body>,
    /// Next entity ID
    next_id: u64,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (EntityId, &Body)> {
        self.bodies.iter().map(|(id, body)| (*id, body))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Teleport a body (tests and scripted scenarios)
    pub fn move_to(&mut self, id: EntityId, pos: Vec2) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.pos = pos;
                true
            }
            None => false,
        }
    }

    /// Live bodies of exactly this kind
    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.bodies.values().filter(|b| b.kind == kind).count()
    }
}

impl EntityWorld for SimWorld {
    fn spawn(&mut self, kind: EntityKind, pos: Vec2, impulse: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.bodies.insert(
            id,
            Body {
                kind,
                pos,
                vel: impulse,
                scale: 1.0,
            },
        );
        id
    }

    fn destroy(&mut self, id: EntityId) -> bool {
        self.bodies.remove(&id).is_some()
    }

    fn is_alive(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    fn position(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.pos)
    }

    fn scale(&mut self, id: EntityId, factor: f32) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.scale *= factor;
                true
            }
            None => false,
        }
    }
}
