//! Match Result Reporting
//!
//! Final scores and winner handed to the persistence collaborator when a match
//! ends. The core only knows the `ResultReporter` trait.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::info;
use uuid::Uuid;

use crate::game::config::ParticipantMode;
use crate::game::state::Slot;

/// Final result of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Match identifier.
    pub match_id: Uuid,
    /// 2 or 4 paddles.
    pub participants: ParticipantMode,
    /// Final score per slot.
    pub final_scores: Vec<u32>,
    /// Winning slot.
    pub winner: Slot,
    /// Winner's display name.
    pub winner_name: String,
    /// Ticks played.
    pub duration_ticks: u32,
    /// When the match ended.
    pub finished_at: DateTime<Utc>,
}

impl MatchReport {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Receives the final report. Implementations must not block the frame loop.
pub trait ResultReporter: Send {
    /// Called exactly once when the match ends.
    fn report(&mut self, report: &MatchReport);
}

/// Reporter that only logs.
#[derive(Debug, Default)]
pub struct LogReporter;

impl ResultReporter for LogReporter {
    fn report(&mut self, report: &MatchReport) {
        info!(
            match_id = %report.match_id,
            winner = %report.winner_name,
            scores = ?report.final_scores,
            ticks = report.duration_ticks,
            "Match finished"
        );
    }
}
