//! Entity handles and the tagged kind of each entity

use serde::{Deserialize, Serialize};

use super::catalog::{ConnectorKindId, ElementKindId, EquipmentKindId};

/// Handle of an entity living in the external world.
///
/// Ids are handed out from a monotonically increasing creation sequence, so a
/// greater id always means a younger entity. The merge tie-break relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Broad category of an entity, used to partition contact sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Element,
    Connector,
    Equipment,
}

/// What an entity is. Capabilities are resolved by matching on this, never by
/// probing the entity at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Element(ElementKindId),
    Connector(ConnectorKindId),
    Equipment(EquipmentKindId),
}

impl EntityKind {
    pub fn category(&self) -> Category {
        match self {
            EntityKind::Element(_) => Category::Element,
            EntityKind::Connector(_) => Category::Connector,
            EntityKind::Equipment(_) => Category::Equipment,
        }
    }

    /// Element kind if this entity can merge
    pub fn as_element(&self) -> Option<ElementKindId> {
        match *self {
            EntityKind::Element(id) => Some(id),
            _ => None,
        }
    }

    /// Connector kind if this entity hosts recipes
    pub fn as_connector(&self) -> Option<ConnectorKindId> {
        match *self {
            EntityKind::Connector(id) => Some(id),
            _ => None,
        }
    }

    /// Equipment kind if this entity hosts an effect
    pub fn as_equipment(&self) -> Option<EquipmentKindId> {
        match *self {
            EntityKind::Equipment(id) => Some(id),
            _ => None,
        }
    }
}

/// A kind the drop supplier may hand out. Equipment is never dropped; it only
/// comes out of recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropKind {
    Element(ElementKindId),
    Connector(ConnectorKindId),
}

impl From<DropKind> for EntityKind {
    fn from(kind: DropKind) -> Self {
        match kind {
            DropKind::Element(id) => EntityKind::Element(id),
            DropKind::Connector(id) => EntityKind::Connector(id),
        }
    }
}
