//! High score leaderboard
//!
//! Keeps the top 3 finished sessions, best first. Equal scores keep their
//! arrival order. Persisting the board between runs is up to the host; it
//! serializes to a plain ordered JSON list of name/score pairs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 3;

/// Name shown for a ranked entry until the player submits one
pub const PROVISIONAL_NAME: &str = "---";

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's name
    pub name: String,
    /// Final session score
    pub score: i64,
}

/// High score leaderboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores {
    entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    /// Insert a finished session under the provisional name.
    ///
    /// Returns the 0-based rank of the new entry, or None if it fell off the
    /// bottom of the board.
    pub fn insert_provisional(&mut self, score: i64) -> Option<usize> {
        // A stable sort places the new entry after every existing entry with
        // an equal or better score.
        let rank = self.entries.iter().filter(|e| e.score >= score).count();

        self.entries.push(HighScoreEntry {
            name: PROVISIONAL_NAME.to_string(),
            score,
        });
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);

        (rank < MAX_HIGH_SCORES).then_some(rank)
    }

    /// Name a ranked slot. Does not re-sort. Returns false for an empty slot.
    pub fn submit_name(&mut self, rank: usize, name: &str) -> bool {
        match self.entries.get_mut(rank) {
            Some(entry) => {
                entry.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Restore order and size after loading foreign data
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        scores.normalize();
        Ok(scores)
    }

    /// Load high scores from disk, starting fresh if the file is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No high scores found, starting fresh");
            return Ok(Self::new());
        }
        let scores = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded {} high scores", scores.entries.len());
        Ok(scores)
    }

    /// Save high scores to disk
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}
