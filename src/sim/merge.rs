//! Pairwise merge rule for elements
//!
//! Two elements merge only when they carry the very same kind id and that
//! kind has a next tier. Both sides of a touch see the event; only the side
//! with the strictly greater entity id acts, the other stays passive. This
//! keeps the result independent of which callback fires first.

use glam::Vec2;

use super::catalog::{Catalog, ElementKindId};
use super::entity::EntityId;

/// One side of an element-element contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeCandidate {
    pub id: EntityId,
    pub kind: ElementKindId,
    pub pos: Vec2,
}

/// What the initiating side must do
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePlan {
    pub initiator: EntityId,
    pub partner: EntityId,
    pub source: ElementKindId,
    pub product: ElementKindId,
    /// Midpoint of the two merged entities
    pub position: Vec2,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeDecision {
    /// This side performs the merge
    Merge(MergePlan),
    /// Mergeable pair, but the partner has the greater id and will act
    Passive,
    /// Same kind at its maximum tier; contacts simply persist
    TerminalTier,
    /// Different kinds (or unknown kinds)
    Incompatible,
}

/// Decide the outcome of `owner` touching `other`, seen from `owner`'s side.
pub fn resolve_merge(
    catalog: &Catalog,
    owner: &MergeCandidate,
    other: &MergeCandidate,
) -> MergeDecision {
    if owner.id == other.id || owner.kind != other.kind {
        return MergeDecision::Incompatible;
    }
    let Some(def) = catalog.element(owner.kind) else {
        return MergeDecision::Incompatible;
    };
    let Some(product) = def.promotes_to else {
        return MergeDecision::TerminalTier;
    };
    if owner.id < other.id {
        return MergeDecision::Passive;
    }

    MergeDecision::Merge(MergePlan {
        initiator: owner.id,
        partner: other.id,
        source: owner.kind,
        product,
        position: (owner.pos + other.pos) * 0.5,
        score: def.merge_score,
    })
}
