//! Per-entity contact bookkeeping
//!
//! Every tracked entity owns one [`ContactSet`]: the partners it is currently
//! touching. Tracking is per owner, so a touch between A and B arrives as two
//! independent events, one for each side, in either order.
//!
//! A handle in a set means "touching AND alive". Destroyed partners are not
//! removed eagerly; callers purge with a liveness predicate before any
//! consuming read and once per tick.

use std::collections::{BTreeSet, HashMap};

use super::entity::{Category, EntityId};
use crate::error::EngineError;

/// Contacts of one owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactSet {
    /// Connector and element owners: one undifferentiated set
    Single(BTreeSet<EntityId>),
    /// Equipment owners: split by partner category
    Partitioned {
        elements: BTreeSet<EntityId>,
        connectors: BTreeSet<EntityId>,
        equipment: BTreeSet<EntityId>,
        /// Whether connector/equipment partners are recorded at all
        track_bodies: bool,
    },
}

impl ContactSet {
    pub fn single() -> Self {
        ContactSet::Single(BTreeSet::new())
    }

    pub fn partitioned(track_bodies: bool) -> Self {
        ContactSet::Partitioned {
            elements: BTreeSet::new(),
            connectors: BTreeSet::new(),
            equipment: BTreeSet::new(),
            track_bodies,
        }
    }

    /// Record a partner. Returns false if it was already present or not tracked.
    fn insert(&mut self, other: EntityId, category: Category) -> bool {
        match self {
            ContactSet::Single(set) => set.insert(other),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                track_bodies,
            } => match category {
                Category::Element => elements.insert(other),
                Category::Connector if *track_bodies => connectors.insert(other),
                Category::Equipment if *track_bodies => equipment.insert(other),
                _ => false,
            },
        }
    }

    fn remove(&mut self, other: EntityId) -> bool {
        match self {
            ContactSet::Single(set) => set.remove(&other),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => elements.remove(&other) | connectors.remove(&other) | equipment.remove(&other),
        }
    }

    fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) -> usize {
        let before = self.len();
        match self {
            ContactSet::Single(set) => set.retain(|&id| keep(id)),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => {
                elements.retain(|&id| keep(id));
                connectors.retain(|&id| keep(id));
                equipment.retain(|&id| keep(id));
            }
        }
        before - self.len()
    }

    pub fn len(&self) -> usize {
        match self {
            ContactSet::Single(set) => set.len(),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => elements.len() + connectors.len() + equipment.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, other: EntityId) -> bool {
        match self {
            ContactSet::Single(set) => set.contains(&other),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => {
                elements.contains(&other)
                    || connectors.contains(&other)
                    || equipment.contains(&other)
            }
        }
    }

    fn all(&self) -> Vec<EntityId> {
        match self {
            ContactSet::Single(set) => set.iter().copied().collect(),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => {
                let mut all: Vec<EntityId> = elements
                    .iter()
                    .chain(connectors.iter())
                    .chain(equipment.iter())
                    .copied()
                    .collect();
                all.sort();
                all
            }
        }
    }

    fn partition(&self, category: Category) -> Vec<EntityId> {
        match self {
            ContactSet::Single(_) => self.all(),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => match category {
                Category::Element => elements.iter().copied().collect(),
                Category::Connector => connectors.iter().copied().collect(),
                Category::Equipment => equipment.iter().copied().collect(),
            },
        }
    }

    fn clear(&mut self, category: Category) {
        match self {
            ContactSet::Single(set) => set.clear(),
            ContactSet::Partitioned {
                elements,
                connectors,
                equipment,
                ..
            } => match category {
                Category::Element => elements.clear(),
                Category::Connector => connectors.clear(),
                Category::Equipment => equipment.clear(),
            },
        }
    }
}

/// Registry of contact sets keyed by owner
#[derive(Debug, Default)]
pub struct ContactTracker {
    sets: HashMap<EntityId, ContactSet>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the contact set for a freshly spawned owner
    pub fn track(&mut self, owner: EntityId, set: ContactSet) -> Result<(), EngineError> {
        if self.sets.contains_key(&owner) {
            return Err(EngineError::AlreadyTracked(owner));
        }
        self.sets.insert(owner, set);
        Ok(())
    }

    /// Drop the contact set of a destroyed owner
    pub fn untrack(&mut self, owner: EntityId) -> Option<ContactSet> {
        self.sets.remove(&owner)
    }

    pub fn is_tracked(&self, owner: EntityId) -> bool {
        self.sets.contains_key(&owner)
    }

    fn set_mut(&mut self, owner: EntityId) -> Result<&mut ContactSet, EngineError> {
        self.sets.get_mut(&owner).ok_or(EngineError::Untracked(owner))
    }

    /// Borrow a raw set (no purge). Intended for inspection and tests.
    pub fn get(&self, owner: EntityId) -> Result<&ContactSet, EngineError> {
        self.sets.get(&owner).ok_or(EngineError::Untracked(owner))
    }

    /// `owner` started touching `other`. Returns whether the set changed.
    pub fn on_contact_begin(
        &mut self,
        owner: EntityId,
        other: EntityId,
        category: Category,
    ) -> Result<bool, EngineError> {
        if owner == other {
            return Ok(false);
        }
        let added = self.set_mut(owner)?.insert(other, category);
        if added {
            log::trace!("contact begin {:?} -> {:?} ({:?})", owner, other, category);
        }
        Ok(added)
    }

    /// `owner` stopped touching `other`. Returns whether the set changed.
    pub fn on_contact_end(&mut self, owner: EntityId, other: EntityId) -> Result<bool, EngineError> {
        let removed = self.set_mut(owner)?.remove(other);
        if removed {
            log::trace!("contact end {:?} -> {:?}", owner, other);
        }
        Ok(removed)
    }

    /// Remove partners that are no longer alive. Returns how many were dropped.
    pub fn purge_dead(
        &mut self,
        owner: EntityId,
        is_alive: impl Fn(EntityId) -> bool,
    ) -> Result<usize, EngineError> {
        Ok(self.set_mut(owner)?.retain(is_alive))
    }

    /// Purge every owner. Called once per tick.
    pub fn purge_all(&mut self, is_alive: impl Fn(EntityId) -> bool) -> usize {
        self.sets
            .values_mut()
            .map(|set| set.retain(&is_alive))
            .sum()
    }

    /// Materialized copy of every partner, ascending by id.
    ///
    /// Consumers act on the copy, so destroying partners while working through
    /// it cannot disturb the live set.
    pub fn snapshot(&self, owner: EntityId) -> Result<Vec<EntityId>, EngineError> {
        Ok(self.get(owner)?.all())
    }

    /// Materialized copy of one partition. Undifferentiated sets return everything.
    pub fn snapshot_partition(
        &self,
        owner: EntityId,
        category: Category,
    ) -> Result<Vec<EntityId>, EngineError> {
        Ok(self.get(owner)?.partition(category))
    }

    /// Empty one partition (or the whole set for undifferentiated owners)
    pub fn clear(&mut self, owner: EntityId, category: Category) -> Result<(), EngineError> {
        self.set_mut(owner)?.clear(category);
        Ok(())
    }

    /// Drop every set (session reset)
    pub fn clear_all(&mut self) {
        self.sets.clear();
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
