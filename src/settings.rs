//! Game settings
//!
//! Tunables shared by the engine and its collaborators. Loaded once at
//! startup from JSON; any missing field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    // === Scoring ===
    /// Score step between upgrade thresholds (also the first threshold)
    pub score_threshold: i64,

    // === Board ===
    /// Seconds the danger zone may stay occupied before the game is over
    pub defeat_time: f32,
    /// Impulse magnitude given to merge and craft products
    pub spawn_impulse: f32,
    /// Scale factor applied by the shrink effect
    pub shrink_factor: f32,

    // === Drop collaborator ===
    /// Seconds before the held drop is released automatically
    pub countdown_duration: f32,
    /// Horizontal speed of the held drop
    pub movement_speed: f32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,

            defeat_time: DEFAULT_DEFEAT_TIME,
            spawn_impulse: SPAWN_IMPULSE,
            shrink_factor: SHRINK_FACTOR,

            countdown_duration: DEFAULT_COUNTDOWN_DURATION,
            movement_speed: DEFAULT_MOVEMENT_SPEED,
        }
    }
}

impl GameSettings {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.score_threshold <= 0 {
            return Err(ConfigError::InvalidSetting {
                field: "score_threshold",
                reason: format!("must be positive, got {}", self.score_threshold),
            });
        }
        if !(self.defeat_time > 0.0 && self.defeat_time.is_finite()) {
            return Err(ConfigError::InvalidSetting {
                field: "defeat_time",
                reason: format!("must be positive, got {}", self.defeat_time),
            });
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor <= 1.0) {
            return Err(ConfigError::InvalidSetting {
                field: "shrink_factor",
                reason: format!("must be in (0, 1], got {}", self.shrink_factor),
            });
        }
        if !(self.spawn_impulse >= 0.0 && self.spawn_impulse.is_finite()) {
            return Err(ConfigError::InvalidSetting {
                field: "spawn_impulse",
                reason: format!("must be finite and not negative, got {}", self.spawn_impulse),
            });
        }
        if !(self.countdown_duration > 0.0 && self.countdown_duration.is_finite()) {
            return Err(ConfigError::InvalidSetting {
                field: "countdown_duration",
                reason: format!("must be positive, got {}", self.countdown_duration),
            });
        }
        if !(self.movement_speed >= 0.0 && self.movement_speed.is_finite()) {
            return Err(ConfigError::InvalidSetting {
                field: "movement_speed",
                reason: format!("must be finite and not negative, got {}", self.movement_speed),
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: GameSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from disk, using defaults if the file is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("Using default settings");
            return Ok(Self::default());
        }
        let settings = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved");
        Ok(())
    }
}
