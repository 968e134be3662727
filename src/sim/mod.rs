//! Deterministic game core
//!
//! All merge, craft and scoring logic lives here. This module must stay pure
//! and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, physics or platform dependencies

pub mod catalog;
pub mod contact;
pub mod defeat;
pub mod effects;
pub mod engine;
pub mod entity;
pub mod events;
pub mod merge;
pub mod recipe;
pub mod score;
pub mod world;

pub use catalog::{
    Catalog, CatalogBuilder, CatalogFile, ConnectorKindDef, ConnectorKindId, ElementKindDef,
    ElementKindId, EquipmentKindDef, EquipmentKindId, Recipe,
};
pub use contact::{ContactSet, ContactTracker};
pub use defeat::DangerZone;
pub use effects::{BoardAction, EffectInput, EffectTag, ElementContact, plan_effect};
pub use engine::{ActivationOutcome, ContactEvent, ContactOutcome, EffectReport, Engine, TickReport};
pub use entity::{Category, DropKind, EntityId, EntityKind};
pub use events::GameEvent;
pub use merge::{MergeCandidate, MergeDecision, MergePlan, resolve_merge};
pub use recipe::{RecipeMatch, match_recipe};
pub use score::{GameOverResult, GameProgressState, ScoreTracker, SessionPhase};
pub use world::{Body, CyclingSupplier, EntityWorld, KindSupplier, SimWorld};
