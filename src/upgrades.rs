//! Attribute upgrades offered at score thresholds

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of upgrades offered per threshold
pub const OFFER_SIZE: usize = 3;

/// What an upgrade improves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    /// Longer hold before a drop is released
    CountdownDuration,
    /// Faster drop movement
    MovementSpeed,
    /// Flat bonus added to every score gain
    ComponentScore,
}

/// A selectable upgrade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpgrade {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: UpgradeKind,
    pub value: i64,
}

/// Drop tunables the upgrades adjust. Read by the drop collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropTuning {
    pub countdown_duration: f32,
    pub movement_speed: f32,
}

/// Draw up to [`OFFER_SIZE`] distinct upgrades from `pool`
pub fn draw_offer<R: Rng>(pool: &[AttributeUpgrade], rng: &mut R) -> Vec<AttributeUpgrade> {
    let mut remaining: Vec<&AttributeUpgrade> = pool.iter().collect();
    let mut offer = Vec::with_capacity(OFFER_SIZE.min(pool.len()));
    while offer.len() < OFFER_SIZE && !remaining.is_empty() {
        let index = rng.random_range(0..remaining.len());
        offer.push(remaining.swap_remove(index).clone());
    }
    offer
}
