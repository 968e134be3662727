//! Kind catalog: the immutable configuration every entity refers to
//!
//! Kinds are registered once at startup through [`CatalogBuilder`] (or loaded
//! from a JSON [`CatalogFile`]) and frozen into a [`Catalog`]. Entities carry
//! typed ids into it. Two kinds are "the same" only when their ids are equal;
//! two registrations with identical fields are distinct kinds and never merge.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::effects::EffectTag;
use crate::error::ConfigError;

/// Identifies an element kind. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementKindId(pub u32);

/// Identifies a connector kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectorKindId(pub u32);

/// Identifies an equipment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EquipmentKindId(pub u32);

/// A basic mergeable kind
#[derive(Debug, Clone)]
pub struct ElementKindDef {
    pub name: String,
    /// Ordinal level; lower is more basic
    pub tier: i32,
    /// Kind produced when two of this kind merge (None = terminal tier)
    pub promotes_to: Option<ElementKindId>,
    /// Score awarded for a merge of this kind
    pub merge_score: i64,
}

/// A crafting recipe hosted by a connector kind
#[derive(Debug, Clone)]
pub struct Recipe {
    pub name: String,
    /// Required element kinds; repeated ids mean "needs that many"
    pub required: Vec<ElementKindId>,
    pub produces: EquipmentKindId,
    pub score_value: i64,
}

/// A connector kind: an ordered recipe list (first listed wins)
#[derive(Debug, Clone)]
pub struct ConnectorKindDef {
    pub name: String,
    pub recipes: Vec<Recipe>,
}

/// An equipment kind with its activatable effect
#[derive(Debug, Clone)]
pub struct EquipmentKindDef {
    pub name: String,
    pub effect: EffectTag,
    /// Minimum session score before the effect may be activated
    pub activation_score: i64,
}

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    elements: Vec<ElementKindDef>,
    connectors: Vec<ConnectorKindDef>,
    equipment: Vec<EquipmentKindDef>,
    /// Names are unique across all three kind families
    names: HashSet<String>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.names.insert(name.to_string()) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Register an element kind. Promotion can be set later with
    /// [`CatalogBuilder::set_promotion`] so tiers may be registered in any order.
    pub fn register_element(
        &mut self,
        name: &str,
        tier: i32,
        merge_score: i64,
    ) -> Result<ElementKindId, ConfigError> {
        self.claim_name(name)?;
        let id = ElementKindId(self.elements.len() as u32);
        self.elements.push(ElementKindDef {
            name: name.to_string(),
            tier,
            promotes_to: None,
            merge_score,
        });
        Ok(id)
    }

    /// Declare that two `from` elements merge into one `to`.
    pub fn set_promotion(
        &mut self,
        from: ElementKindId,
        to: ElementKindId,
    ) -> Result<(), ConfigError> {
        if to.0 as usize >= self.elements.len() {
            return Err(ConfigError::UnknownElement(format!("#{}", to.0)));
        }
        let def = self
            .elements
            .get_mut(from.0 as usize)
            .ok_or_else(|| ConfigError::UnknownElement(format!("#{}", from.0)))?;
        def.promotes_to = Some(to);
        Ok(())
    }

    pub fn register_equipment(
        &mut self,
        name: &str,
        effect: EffectTag,
        activation_score: i64,
    ) -> Result<EquipmentKindId, ConfigError> {
        self.claim_name(name)?;
        let id = EquipmentKindId(self.equipment.len() as u32);
        self.equipment.push(EquipmentKindDef {
            name: name.to_string(),
            effect,
            activation_score,
        });
        Ok(id)
    }

    /// Register a connector kind. Recipe order is match priority.
    pub fn register_connector(
        &mut self,
        name: &str,
        recipes: Vec<Recipe>,
    ) -> Result<ConnectorKindId, ConfigError> {
        self.claim_name(name)?;
        let id = ConnectorKindId(self.connectors.len() as u32);
        self.connectors.push(ConnectorKindDef {
            name: name.to_string(),
            recipes,
        });
        Ok(id)
    }

    /// Validate every cross reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, ConfigError> {
        for (i, element) in self.elements.iter().enumerate() {
            if element.promotes_to == Some(ElementKindId(i as u32)) {
                return Err(ConfigError::SelfPromotion(element.name.clone()));
            }
        }

        for connector in &self.connectors {
            if connector.recipes.is_empty() {
                return Err(ConfigError::EmptyConnector(connector.name.clone()));
            }
            for recipe in &connector.recipes {
                if recipe.required.is_empty() {
                    return Err(ConfigError::EmptyRecipe {
                        connector: connector.name.clone(),
                        recipe: recipe.name.clone(),
                    });
                }
                if let Some(bad) = recipe
                    .required
                    .iter()
                    .find(|id| id.0 as usize >= self.elements.len())
                {
                    return Err(ConfigError::UnknownElement(format!("#{}", bad.0)));
                }
                if recipe.produces.0 as usize >= self.equipment.len() {
                    return Err(ConfigError::UnknownEquipment(format!(
                        "#{}",
                        recipe.produces.0
                    )));
                }
            }
        }

        log::info!(
            "Catalog built: {} elements, {} connectors, {} equipment",
            self.elements.len(),
            self.connectors.len(),
            self.equipment.len()
        );

        Ok(Catalog {
            elements: self.elements,
            connectors: self.connectors,
            equipment: self.equipment,
        })
    }
}

/// Immutable kind catalog. Frozen after build; share it behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    elements: Vec<ElementKindDef>,
    connectors: Vec<ConnectorKindDef>,
    equipment: Vec<EquipmentKindDef>,
}

impl Catalog {
    pub fn element(&self, id: ElementKindId) -> Option<&ElementKindDef> {
        self.elements.get(id.0 as usize)
    }

    pub fn connector(&self, id: ConnectorKindId) -> Option<&ConnectorKindDef> {
        self.connectors.get(id.0 as usize)
    }

    pub fn equipment(&self, id: EquipmentKindId) -> Option<&EquipmentKindDef> {
        self.equipment.get(id.0 as usize)
    }

    pub fn element_id(&self, name: &str) -> Option<ElementKindId> {
        self.elements
            .iter()
            .position(|e| e.name == name)
            .map(|i| ElementKindId(i as u32))
    }

    pub fn connector_id(&self, name: &str) -> Option<ConnectorKindId> {
        self.connectors
            .iter()
            .position(|c| c.name == name)
            .map(|i| ConnectorKindId(i as u32))
    }

    pub fn equipment_id(&self, name: &str) -> Option<EquipmentKindId> {
        self.equipment
            .iter()
            .position(|e| e.name == name)
            .map(|i| EquipmentKindId(i as u32))
    }

    /// All element kinds in registration order
    pub fn element_ids(&self) -> impl Iterator<Item = ElementKindId> + '_ {
        (0..self.elements.len()).map(|i| ElementKindId(i as u32))
    }

    /// All connector kinds in registration order
    pub fn connector_ids(&self) -> impl Iterator<Item = ConnectorKindId> + '_ {
        (0..self.connectors.len()).map(|i| ConnectorKindId(i as u32))
    }

    /// Load a catalog from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        file.into_catalog()
    }
}

// ---------------------------------------------------------------------------
// On-disk form
// ---------------------------------------------------------------------------

/// Catalog as written by designers: everything referenced by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub elements: Vec<ElementEntry>,
    #[serde(default)]
    pub equipment: Vec<EquipmentEntry>,
    #[serde(default)]
    pub connectors: Vec<ConnectorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementEntry {
    pub name: String,
    pub tier: i32,
    #[serde(default)]
    pub merge_score: i64,
    #[serde(default)]
    pub promotes_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentEntry {
    pub name: String,
    pub effect: EffectTag,
    #[serde(default)]
    pub activation_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorEntry {
    pub name: String,
    pub recipes: Vec<RecipeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub name: String,
    pub requires: Vec<String>,
    pub produces: String,
    #[serde(default)]
    pub score: i64,
}

impl CatalogFile {
    /// Resolve names into ids and build the catalog
    pub fn into_catalog(self) -> Result<Catalog, ConfigError> {
        let mut builder = CatalogBuilder::new();

        let mut element_ids = HashMap::new();
        for entry in &self.elements {
            let id = builder.register_element(&entry.name, entry.tier, entry.merge_score)?;
            element_ids.insert(entry.name.clone(), id);
        }
        let lookup_element = |name: &str| {
            element_ids
                .get(name)
                .copied()
                .ok_or_else(|| ConfigError::UnknownElement(name.to_string()))
        };
        for entry in &self.elements {
            if let Some(next) = &entry.promotes_to {
                builder.set_promotion(lookup_element(&entry.name)?, lookup_element(next)?)?;
            }
        }

        let mut equipment_ids = HashMap::new();
        for entry in &self.equipment {
            let id = builder.register_equipment(&entry.name, entry.effect, entry.activation_score)?;
            equipment_ids.insert(entry.name.clone(), id);
        }

        for connector in self.connectors {
            let mut recipes = Vec::with_capacity(connector.recipes.len());
            for recipe in connector.recipes {
                let required = recipe
                    .requires
                    .iter()
                    .map(|name| lookup_element(name))
                    .collect::<Result<Vec<_>, _>>()?;
                let produces = equipment_ids
                    .get(&recipe.produces)
                    .copied()
                    .ok_or_else(|| ConfigError::UnknownEquipment(recipe.produces.clone()))?;
                recipes.push(Recipe {
                    name: recipe.name,
                    required,
                    produces,
                    score_value: recipe.score,
                });
            }
            builder.register_connector(&connector.name, recipes)?;
        }

        builder.build()
    }
}
