//! Protocol Messages
//!
//! Wire format between host, guests and the relay. Every message is one JSON
//! object with a `type` discriminant and an optional opaque `token`.
//!
//! The channel is unordered, lossy and may duplicate. Nothing here carries
//! sequencing: `state` is a full snapshot and `input` is a full key snapshot,
//! so applying either twice or out of order is harmless.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::core::vec3::Vec3;
use crate::game::config::ParticipantMode;
use crate::game::input::InputFrame;
use crate::game::state::{Obstacle, SimulationState, Slot};

// =============================================================================
// MESSAGES
// =============================================================================

/// Every message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Host announces a room.
    Hello(Hello),
    /// Guest asks for a slot.
    Join(Join),
    /// Host gives a guest its slot.
    Assign(Assign),
    /// Host starts the match.
    Start(Start),
    /// Host state snapshot.
    State(StateSnapshot),
    /// Guest key snapshot.
    Input(InputRecord),
}

/// Host announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    /// Room identifier.
    pub room: String,
    /// Participant mode of the match.
    pub mode: ParticipantMode,
    /// Optional session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Guest join request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    /// Room identifier.
    pub room: String,
    /// Guest's self-chosen identifier, stable across retries.
    pub guest_id: Uuid,
    /// Optional session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Slot assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assign {
    /// Guest being assigned.
    pub guest_id: Uuid,
    /// Assigned slot.
    pub slot: Slot,
    /// Optional session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Match start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Start {
    /// Optional session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Ball kinematics on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    /// Position.
    pub position: [f32; 3],
    /// Velocity.
    pub velocity: [f32; 3],
}

/// Obstacle on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    /// Centre.
    pub position: [f32; 3],
    /// Radius.
    pub radius: f32,
}

/// Full state snapshot from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Host tick, informational only.
    pub tick: u32,
    /// Ball position and velocity.
    pub ball: BallSnapshot,
    /// Paddle positions in slot order.
    pub paddles: Vec<[f32; 3]>,
    /// Score per slot.
    pub scores: Vec<u32>,
    /// Obstacle layout, present only in the first broadcasts after start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacles: Option<Vec<ObstacleSnapshot>>,
    /// Optional session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Guest key snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Guest's slot.
    pub slot: Slot,
    /// Negative-direction key held.
    pub neg: bool,
    /// Positive-direction key held.
    pub pos: bool,
    /// Optional session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl InputRecord {
    /// Key frame carried by this record.
    pub fn frame(&self) -> InputFrame {
        InputFrame::new(self.neg, self.pos)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON encode/decode failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot shape does not match the local match.
    #[error("Snapshot has {got} paddles, expected {expected}")]
    ShapeMismatch {
        /// Paddles in the snapshot.
        got: usize,
        /// Paddles in the local view.
        expected: usize,
    },
}

// =============================================================================
// SERIALIZATION
// =============================================================================

impl WireMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Decode a frame, dropping anything malformed or unknown.
    pub fn decode(s: &str) -> Option<Self> {
        match Self::from_json(s) {
            Ok(msg) => Some(msg),
            Err(e) => {
                debug!("Ignoring malformed message: {}", e);
                None
            }
        }
    }

    /// Room named by this message, for routing. Only `hello` and `join`
    /// carry one.
    pub fn room(&self) -> Option<&str> {
        match self {
            WireMessage::Hello(h) => Some(&h.room),
            WireMessage::Join(j) => Some(&j.room),
            _ => None,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Hello(_) => "hello",
            WireMessage::Join(_) => "join",
            WireMessage::Assign(_) => "assign",
            WireMessage::Start(_) => "start",
            WireMessage::State(_) => "state",
            WireMessage::Input(_) => "input",
        }
    }
}

impl StateSnapshot {
    /// Capture the broadcastable part of a simulation state.
    pub fn capture(state: &SimulationState, include_obstacles: bool, token: Option<String>) -> Self {
        Self {
            tick: state.tick,
            ball: BallSnapshot {
                position: state.ball.position.to_array(),
                velocity: state.ball.velocity.to_array(),
            },
            paddles: state.paddles.iter().map(|p| p.position.to_array()).collect(),
            scores: state.scores.as_slice().to_vec(),
            obstacles: include_obstacles.then(|| {
                state
                    .obstacles
                    .iter()
                    .map(|o| ObstacleSnapshot { position: o.position.to_array(), radius: o.radius })
                    .collect()
            }),
            token,
        }
    }

    /// Obstacles carried by this snapshot, if any.
    pub fn obstacle_layout(&self) -> Option<Vec<Obstacle>> {
        self.obstacles.as_ref().map(|list| {
            list.iter()
                .map(|o| Obstacle { position: Vec3::from_array(o.position), radius: o.radius })
                .collect()
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
