//! Score, thresholds and ranking for one session
//!
//! Phases: `Playing` until game over, then `GameOver` until the session is
//! reset. Threshold crossings are reported as they happen and counted as
//! pending upgrade choices for the presentation layer to consume.

use serde::{Deserialize, Serialize};

use crate::highscores::{HighScoreEntry, HighScores};

/// Crossings reported for a single gain; any further ones are skipped
pub const MAX_CROSSINGS_PER_GAIN: usize = 64;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    GameOver,
}

/// Per-session score progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProgressState {
    pub current_score: i64,
    pub next_threshold: i64,
    /// Added on top of every positive score gain
    pub score_bonus: i64,
}

/// Result of the game-over transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverResult {
    /// Final score entered the board at this 0-based rank
    Ranked(usize),
    /// Final score did not make the board
    NotRanked,
    /// The session was already over; nothing changed
    AlreadyOver,
}

#[derive(Debug, Clone)]
pub struct ScoreTracker {
    progress: GameProgressState,
    threshold_step: i64,
    phase: SessionPhase,
    high_scores: HighScores,
    /// Threshold crossings not yet answered with an upgrade
    pending_upgrades: u32,
}

impl ScoreTracker {
    /// `threshold_step` is both the first threshold and the gap between them
    pub fn new(threshold_step: i64, high_scores: HighScores) -> Self {
        Self {
            progress: GameProgressState {
                current_score: 0,
                next_threshold: threshold_step,
                score_bonus: 0,
            },
            threshold_step,
            phase: SessionPhase::Playing,
            high_scores,
            pending_upgrades: 0,
        }
    }

    pub fn score(&self) -> i64 {
        self.progress.current_score
    }

    pub fn progress(&self) -> GameProgressState {
        self.progress
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == SessionPhase::GameOver
    }

    pub fn leaderboard(&self) -> &[HighScoreEntry] {
        self.high_scores.entries()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    /// Whether an upgrade choice is waiting to be answered
    pub fn upgrade_pending(&self) -> bool {
        self.pending_upgrades > 0
    }

    /// Add a score gain plus the current bonus.
    ///
    /// Non-positive deltas are ignored. Returns every threshold crossed by
    /// this gain, lowest first; each one is a separate crossing. The score
    /// saturates at `i64::MAX`, and a threshold of `i64::MAX` is never
    /// crossed.
    pub fn add_score(&mut self, delta: i64) -> Vec<i64> {
        if delta <= 0 {
            return Vec::new();
        }
        self.progress.current_score = self
            .progress
            .current_score
            .saturating_add(delta.saturating_add(self.progress.score_bonus));

        let mut crossed = Vec::new();
        while self.progress.next_threshold < i64::MAX
            && self.progress.current_score >= self.progress.next_threshold
        {
            if crossed.len() == MAX_CROSSINGS_PER_GAIN {
                let skipped = (self.progress.current_score - self.progress.next_threshold)
                    / self.threshold_step
                    + 1;
                self.progress.next_threshold = self
                    .progress
                    .next_threshold
                    .saturating_add(skipped.saturating_mul(self.threshold_step));
                log::debug!("skipped {} threshold crossings in one gain", skipped);
                break;
            }
            crossed.push(self.progress.next_threshold);
            self.progress.next_threshold =
                self.progress.next_threshold.saturating_add(self.threshold_step);
            if self.phase == SessionPhase::Playing {
                self.pending_upgrades = self.pending_upgrades.saturating_add(1);
            }
        }
        crossed
    }

    /// Raise the per-gain bonus (component score upgrade)
    pub fn add_bonus(&mut self, value: i64) {
        self.progress.score_bonus = self.progress.score_bonus.saturating_add(value);
    }

    /// Mark one pending upgrade choice as answered
    pub fn resolve_upgrade(&mut self) -> bool {
        if self.pending_upgrades == 0 {
            return false;
        }
        self.pending_upgrades -= 1;
        true
    }

    /// End the session and enter the final score on the board. Idempotent.
    pub fn game_over(&mut self) -> GameOverResult {
        if self.phase == SessionPhase::GameOver {
            return GameOverResult::AlreadyOver;
        }
        self.phase = SessionPhase::GameOver;
        self.pending_upgrades = 0;

        match self.high_scores.insert_provisional(self.progress.current_score) {
            Some(rank) => GameOverResult::Ranked(rank),
            None => GameOverResult::NotRanked,
        }
    }

    /// Name a ranked slot. Does not re-sort the board.
    pub fn submit_name(&mut self, rank: usize, name: &str) -> bool {
        self.high_scores.submit_name(rank, name)
    }

    /// Start a fresh session. The leaderboard survives.
    pub fn reset_session(&mut self) {
        self.progress = GameProgressState {
            current_score: 0,
            next_threshold: self.threshold_step,
            score_bonus: 0,
        };
        self.phase = SessionPhase::Playing;
        self.pending_upgrades = 0;
    }
}
