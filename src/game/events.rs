//! Game Events
//!
//! Events generated during a tick. They drive logging, sound/FX hooks in the
//! renderer, and the end-of-match report.

use serde::{Serialize, Deserialize};
use crate::core::vec3::Vec3;
use crate::game::state::Slot;

/// Why a ball left the field without scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoScoreReason {
    /// No paddle touched the ball since the serve.
    Untouched,
    /// The last hitter knocked it through their own edge without an
    /// obstacle deflection.
    OwnEdge,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEventData {
    /// Ball served toward a slot.
    Served {
        /// Slot the serve is aimed at.
        toward: Slot,
        /// Initial velocity.
        velocity: Vec3,
    },

    /// Paddle returned the ball.
    PaddleHit {
        /// Paddle that hit.
        slot: Slot,
        /// Horizontal speed after the hit.
        speed: f32,
    },

    /// Ball bounced off a corner block.
    CornerHit {
        /// Corner index, clockwise from (-X, -Z).
        corner: u8,
    },

    /// Ball bounced off an obstacle.
    ObstacleHit {
        /// Obstacle index.
        obstacle: usize,
    },

    /// A slot scored.
    Goal {
        /// Slot credited.
        scorer: Slot,
        /// Edge the ball left through.
        conceded: Slot,
        /// Scorer's new total.
        new_score: u32,
    },

    /// Self-penalty: hit, obstacle, own edge.
    Penalty {
        /// Penalised slot.
        slot: Slot,
        /// New total.
        new_score: u32,
    },

    /// Ball left the field but nobody scored.
    NoScore {
        /// Edge the ball left through.
        conceded: Slot,
        /// Why it did not count.
        reason: NoScoreReason,
    },

    /// Match ended.
    MatchEnded {
        /// Winning slot.
        winner: Slot,
        /// Ticks played.
        duration_ticks: u32,
    },
}

/// A game event with its tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the event occurred.
    pub tick: u32,
    /// Event data.
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, data: GameEventData) -> Self {
        Self { tick, data }
    }

    /// Slot primarily involved, if any.
    pub fn slot(&self) -> Option<Slot> {
        match &self.data {
            GameEventData::Served { toward, .. } => Some(*toward),
            GameEventData::PaddleHit { slot, .. } => Some(*slot),
            GameEventData::Goal { scorer, .. } => Some(*scorer),
            GameEventData::Penalty { slot, .. } => Some(*slot),
            GameEventData::NoScore { conceded, .. } => Some(*conceded),
            GameEventData::MatchEnded { winner, .. } => Some(*winner),
            GameEventData::CornerHit { .. } | GameEventData::ObstacleHit { .. } => None,
        }
    }

    /// Whether this event changed the score.
    pub fn is_scoring(&self) -> bool {
        matches!(
            self.data,
            GameEventData::Goal { .. } | GameEventData::Penalty { .. }
        )
    }
}

// Convenience constructors

/// Create a serve event.
pub fn served(tick: u32, toward: Slot, velocity: Vec3) -> GameEvent {
    GameEvent::new(tick, GameEventData::Served { toward, velocity })
}

/// Create a paddle hit event.
pub fn paddle_hit(tick: u32, slot: Slot, speed: f32) -> GameEvent {
    GameEvent::new(tick, GameEventData::PaddleHit { slot, speed })
}

/// Create a corner hit event.
pub fn corner_hit(tick: u32, corner: u8) -> GameEvent {
    GameEvent::new(tick, GameEventData::CornerHit { corner })
}

/// Create an obstacle hit event.
pub fn obstacle_hit(tick: u32, obstacle: usize) -> GameEvent {
    GameEvent::new(tick, GameEventData::ObstacleHit { obstacle })
}

/// Create a goal event.
pub fn goal(tick: u32, scorer: Slot, conceded: Slot, new_score: u32) -> GameEvent {
    GameEvent::new(tick, GameEventData::Goal { scorer, conceded, new_score })
}

/// Create a penalty event.
pub fn penalty(tick: u32, slot: Slot, new_score: u32) -> GameEvent {
    GameEvent::new(tick, GameEventData::Penalty { slot, new_score })
}

/// Create a no-score event.
pub fn no_score(tick: u32, conceded: Slot, reason: NoScoreReason) -> GameEvent {
    GameEvent::new(tick, GameEventData::NoScore { conceded, reason })
}

/// Create a match ended event.
pub fn match_ended(tick: u32, winner: Slot) -> GameEvent {
    GameEvent::new(tick, GameEventData::MatchEnded { winner, duration_ticks: tick })
}
