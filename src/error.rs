//! Error types
//!
//! Two families only: configuration problems that must stop startup, and
//! invariant violations that indicate a bug in the caller. Expected "nothing
//! happened" outcomes (no recipe matched, terminal tier, empty contact set)
//! are ordinary return values, never errors.

use crate::sim::EntityId;

/// Startup-time configuration failure. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate kind name: {0}")]
    DuplicateName(String),
    #[error("unknown element kind: {0}")]
    UnknownElement(String),
    #[error("unknown equipment kind: {0}")]
    UnknownEquipment(String),
    #[error("connector `{0}` has no recipes")]
    EmptyConnector(String),
    #[error("recipe `{recipe}` on connector `{connector}` requires no elements")]
    EmptyRecipe { connector: String, recipe: String },
    #[error("element `{0}` promotes into itself")]
    SelfPromotion(String),
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A broken engine invariant. Always a programming error in the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("entity {0:?} has no contact tracker")]
    Untracked(EntityId),
    #[error("entity {0:?} was already destroyed")]
    DoubleDestroy(EntityId),
    #[error("entity {0:?} is not equipment")]
    NotEquipment(EntityId),
    #[error("entity {0:?} is already tracked")]
    AlreadyTracked(EntityId),
}
