//! Equipment effects
//!
//! An effect reads the host equipment's contacts and turns them into a list of
//! [`BoardAction`]s. Planning is pure; the engine applies the actions, so the
//! host may vanish right after without the effect noticing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, ElementKindId};
use super::entity::{Category, EntityId};

/// The effect an equipment kind carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTag {
    /// Every touching element jumps to its next tier
    Promote,
    /// Every touching element becomes the lowest-tier kind among them
    ReplaceWithLowestTier,
    /// Everything touching shrinks
    ShrinkAll,
    /// Every connector on the board becomes the lowest-tier touching element
    TransformConnectors,
}

impl EffectTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectTag::Promote => "Promote",
            EffectTag::ReplaceWithLowestTier => "ReplaceWithLowestTier",
            EffectTag::ShrinkAll => "ShrinkAll",
            EffectTag::TransformConnectors => "TransformConnectors",
        }
    }

    /// Whether hosts of this effect record connector and equipment partners
    pub fn tracks_bodies(&self) -> bool {
        matches!(self, EffectTag::ShrinkAll)
    }

    /// Contact partitions emptied after the effect runs
    pub fn cleared_partitions(&self) -> &'static [Category] {
        match self {
            EffectTag::ShrinkAll => &[Category::Element, Category::Connector, Category::Equipment],
            _ => &[Category::Element],
        }
    }
}

/// A single board mutation requested by an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoardAction {
    /// Destroy `target` and spawn `with` where it stood
    Replace {
        target: EntityId,
        with: ElementKindId,
        at: Vec2,
    },
    /// Scale `target`'s extent
    Scale { target: EntityId, factor: f32 },
}

/// A live contacted element as seen by an effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementContact {
    pub id: EntityId,
    pub kind: ElementKindId,
    pub pos: Vec2,
}

/// Everything an effect may look at. All lists hold live entities only.
#[derive(Debug, Clone, Default)]
pub struct EffectInput {
    /// Elements touching the host, ascending by id
    pub elements: Vec<ElementContact>,
    /// Connectors touching the host (only tracked for some effects)
    pub connectors: Vec<EntityId>,
    /// Equipment touching the host (only tracked for some effects)
    pub equipment: Vec<EntityId>,
    /// Every live connector on the board with its position
    pub board_connectors: Vec<(EntityId, Vec2)>,
}

/// The contacted element with the smallest tier; the first one wins ties
pub fn lowest_tier(catalog: &Catalog, elements: &[ElementContact]) -> Option<ElementKindId> {
    let mut best: Option<(i32, ElementKindId)> = None;
    for element in elements {
        let Some(def) = catalog.element(element.kind) else {
            continue;
        };
        if best.is_none_or(|(tier, _)| def.tier < tier) {
            best = Some((def.tier, element.kind));
        }
    }
    best.map(|(_, kind)| kind)
}

/// Turn an effect into board actions. An empty result means "nothing to do".
pub fn plan_effect(
    tag: EffectTag,
    catalog: &Catalog,
    input: &EffectInput,
    shrink_factor: f32,
) -> Vec<BoardAction> {
    match tag {
        EffectTag::Promote => input
            .elements
            .iter()
            .filter_map(|e| {
                let next = catalog.element(e.kind)?.promotes_to?;
                Some(BoardAction::Replace {
                    target: e.id,
                    with: next,
                    at: e.pos,
                })
            })
            .collect(),

        EffectTag::ReplaceWithLowestTier => {
            let Some(lowest) = lowest_tier(catalog, &input.elements) else {
                return Vec::new();
            };
            input
                .elements
                .iter()
                .map(|e| BoardAction::Replace {
                    target: e.id,
                    with: lowest,
                    at: e.pos,
                })
                .collect()
        }

        EffectTag::ShrinkAll => {
            if input.elements.is_empty() && input.connectors.is_empty() {
                return Vec::new();
            }
            input
                .elements
                .iter()
                .map(|e| e.id)
                .chain(input.connectors.iter().copied())
                .chain(input.equipment.iter().copied())
                .map(|target| BoardAction::Scale {
                    target,
                    factor: shrink_factor,
                })
                .collect()
        }

        EffectTag::TransformConnectors => {
            let Some(lowest) = lowest_tier(catalog, &input.elements) else {
                return Vec::new();
            };
            input
                .board_connectors
                .iter()
                .map(|&(target, at)| BoardAction::Replace {
                    target,
                    with: lowest,
                    at,
                })
                .collect()
        }
    }
}
