//! Events raised by the engine for the presentation layer
//!
//! Events are queued as they happen and drained in batch by the host, which
//! uses them for effects, sound, score display and upgrade prompts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{ConnectorKindId, ElementKindId, EquipmentKindId};
use super::effects::EffectTag;
use super::entity::EntityId;
use super::score::GameOverResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Two elements merged into one of the next tier
    Merged {
        source: ElementKindId,
        product: ElementKindId,
        entity: EntityId,
        pos: Vec2,
    },
    /// A connector recipe produced equipment
    Crafted {
        connector: ConnectorKindId,
        recipe_index: usize,
        equipment: EquipmentKindId,
        entity: EntityId,
        pos: Vec2,
    },
    /// The score passed an upgrade threshold
    ThresholdCrossed { threshold: i64 },
    /// An equipment effect ran and its host was consumed
    EquipmentActivated {
        entity: EntityId,
        effect: EffectTag,
        destroyed: usize,
        spawned: usize,
        scaled: usize,
    },
    /// The current drop touched something for the first time
    DropLanded { entity: EntityId },
    /// The session ended
    GameOver { score: i64, result: GameOverResult },
}
