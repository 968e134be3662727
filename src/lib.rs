//! Merge Forge - a contact-driven merge and crafting game core
//!
//! Core modules:
//! - `sim`: Deterministic engine (contacts, merges, recipes, effects, score)
//! - `settings`: Data-driven game tunables
//! - `highscores`: Persistent top-three leaderboard
//! - `upgrades`: Attribute upgrades offered at score thresholds
//! - `error`: Configuration and invariant errors

pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;
pub mod upgrades;

pub use error::{ConfigError, EngineError};
pub use highscores::HighScores;
pub use settings::GameSettings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the headless runner
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Score step between upgrade thresholds
    pub const DEFAULT_SCORE_THRESHOLD: i64 = 100;
    /// Seconds the danger zone may stay occupied
    pub const DEFAULT_DEFEAT_TIME: f32 = 1.5;

    /// Impulse magnitude for merge and craft products
    pub const SPAWN_IMPULSE: f32 = 3.0;
    /// Scale applied by the shrink effect
    pub const SHRINK_FACTOR: f32 = 0.8;

    /// Drop defaults
    pub const DEFAULT_COUNTDOWN_DURATION: f32 = 5.0;
    pub const DEFAULT_MOVEMENT_SPEED: f32 = 2.0;
}

/// Mean of a set of points
#[inline]
pub fn centroid(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().copied().sum::<Vec2>() / points.len() as f32)
}
