//! Recipe matching against a connector's live contacts
//!
//! Recipes are tried in list order; the first one whose required multiset is
//! fully covered wins and no later recipe is looked at. Only the exact
//! contributing entities are reported, so extra elements touching the
//! connector survive the craft.

use std::collections::BTreeMap;

use super::catalog::{ConnectorKindDef, ElementKindId, EquipmentKindId, Recipe};
use super::entity::EntityId;

/// A satisfied recipe and the entities that satisfy it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeMatch {
    /// Index into the connector's recipe list
    pub recipe_index: usize,
    pub produces: EquipmentKindId,
    pub score: i64,
    /// Entities consumed by the craft, in the order they were picked
    pub contributors: Vec<EntityId>,
}

/// Required count per kind
fn requirement_counts(recipe: &Recipe) -> BTreeMap<ElementKindId, u32> {
    let mut counts = BTreeMap::new();
    for kind in &recipe.required {
        *counts.entry(*kind).or_insert(0) += 1;
    }
    counts
}

/// Try one recipe. Returns the contributing entities if it is satisfied.
pub fn satisfy(recipe: &Recipe, contacts: &[(EntityId, ElementKindId)]) -> Option<Vec<EntityId>> {
    let mut remaining = requirement_counts(recipe);
    let mut outstanding = recipe.required.len();
    if outstanding == 0 {
        return None;
    }

    let mut contributors = Vec::with_capacity(outstanding);
    for &(entity, kind) in contacts {
        if let Some(count) = remaining.get_mut(&kind) {
            if *count > 0 {
                *count -= 1;
                outstanding -= 1;
                contributors.push(entity);
                if outstanding == 0 {
                    return Some(contributors);
                }
            }
        }
    }
    None
}

/// Find the first satisfied recipe of `connector` given the live element
/// contacts (entity, kind). `None` is the normal "not yet" outcome.
pub fn match_recipe(
    connector: &ConnectorKindDef,
    contacts: &[(EntityId, ElementKindId)],
) -> Option<RecipeMatch> {
    connector
        .recipes
        .iter()
        .enumerate()
        .find_map(|(index, recipe)| {
            satisfy(recipe, contacts).map(|contributors| RecipeMatch {
                recipe_index: index,
                produces: recipe.produces,
                score: recipe.score_value,
                contributors,
            })
        })
}
