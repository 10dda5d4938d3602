//! Match configuration.
//!
//! `MatchConfig` is what the menu layer hands to the core. It is a plain value
//! with a `Default` and a few builder helpers; `validate()` rejects the
//! combinations the simulation cannot run.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::params::PhysicsParams;
use crate::game::state::{ControlRole, Slot};

/// Number of paddles in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantMode {
    /// Left vs Right.
    Two,
    /// Left, Right, Bottom and Top.
    Four,
}

impl ParticipantMode {
    /// Paddle count for this mode.
    pub fn slot_count(self) -> usize {
        match self {
            ParticipantMode::Two => 2,
            ParticipantMode::Four => 4,
        }
    }

    /// Slots in play, in index order.
    pub fn slots(self) -> &'static [Slot] {
        match self {
            ParticipantMode::Two => &[Slot::Left, Slot::Right],
            ParticipantMode::Four => &[Slot::Left, Slot::Right, Slot::Bottom, Slot::Top],
        }
    }

    /// Build from a raw participant count.
    pub fn from_count(count: usize) -> Result<Self, ConfigError> {
        match count {
            2 => Ok(ParticipantMode::Two),
            4 => Ok(ParticipantMode::Four),
            n => Err(ConfigError::InvalidParticipants(n)),
        }
    }
}

/// How the paddles are driven and who owns the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Every paddle is a human on this machine.
    Local,
    /// Slot 0 is the local human, all others are AI.
    AiOpponent,
    /// This machine simulates; slot 0 is local, the rest are remote guests.
    RemoteHost,
    /// This machine only renders host state and sends its key state.
    RemoteGuest,
}

impl ConnectionMode {
    /// Whether this mode needs a network endpoint.
    pub fn is_networked(self) -> bool {
        matches!(self, ConnectionMode::RemoteHost | ConnectionMode::RemoteGuest)
    }
}

/// AI difficulty, 1 (easiest) to 10 (hardest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    /// Easiest level.
    pub const MIN: Difficulty = Difficulty(1);
    /// Hardest level.
    pub const MAX: Difficulty = Difficulty(10);

    /// Validate a raw level.
    pub fn new(level: u8) -> Result<Self, ConfigError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ConfigError::InvalidDifficulty(level))
        }
    }

    /// Raw level.
    pub fn level(self) -> u8 {
        self.0
    }

    /// Position in the range, 0.0 at level 1 and 1.0 at level 10.
    pub fn fraction(self) -> f32 {
        (self.0 - Self::MIN.0) as f32 / (Self::MAX.0 - Self::MIN.0) as f32
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = ConfigError;
    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.0
    }
}

/// Half extents of the playing field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDims {
    /// Half width along X (Left/Right goals).
    pub half_width: f32,
    /// Half depth along Z (Bottom/Top goals, or side walls in 2P).
    pub half_depth: f32,
}

impl FieldDims {
    /// Default field for a participant mode: a wide court for 2P, a square
    /// arena for 4P.
    pub fn for_mode(mode: ParticipantMode) -> Self {
        match mode {
            ParticipantMode::Two => Self { half_width: 10.0, half_depth: 6.0 },
            ParticipantMode::Four => Self { half_width: 8.0, half_depth: 8.0 },
        }
    }
}

/// Where to reach the relay and which room to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEndpoint {
    /// WebSocket URL of the relay (e.g. `ws://127.0.0.1:9001`).
    pub url: String,
    /// Room identifier shared by host and guests.
    pub room: String,
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Participant count other than 2 or 4.
    #[error("Unsupported participant count: {0}")]
    InvalidParticipants(usize),

    /// Difficulty outside 1..=10.
    #[error("AI difficulty must be 1-10, got {0}")]
    InvalidDifficulty(u8),

    /// Win score of zero.
    #[error("Win score must be at least 1")]
    InvalidWinScore,

    /// Field too small to fit paddles between the corners.
    #[error("Field {half_width}x{half_depth} too small for paddles")]
    FieldTooSmall {
        /// Offending half width.
        half_width: f32,
        /// Offending half depth.
        half_depth: f32,
    },
}

/// Full match configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    /// 2 or 4 paddles.
    pub participants: ParticipantMode,
    /// Control and authority mode.
    pub connection: ConnectionMode,
    /// First slot to reach this score wins.
    pub win_score: u32,
    /// Difficulty for AI paddles.
    pub ai_difficulty: Option<Difficulty>,
    /// Relay endpoint for networked modes.
    pub network: Option<NetworkEndpoint>,
    /// Opaque token attached to outgoing messages.
    pub session_token: Option<String>,
    /// Display names by slot index.
    pub display_names: Vec<String>,
    /// Field half extents.
    pub field: FieldDims,
    /// Number of obstacles generated at setup.
    pub obstacle_count: usize,
    /// RNG seed; derived from the match id when absent.
    pub seed: Option<u64>,
    /// Tuning constants.
    pub params: PhysicsParams,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(ParticipantMode::Two, ConnectionMode::AiOpponent)
    }
}

impl MatchConfig {
    /// Config with defaults for the given modes.
    pub fn new(participants: ParticipantMode, connection: ConnectionMode) -> Self {
        Self {
            participants,
            connection,
            win_score: 5,
            ai_difficulty: None,
            network: None,
            session_token: None,
            display_names: Vec::new(),
            field: FieldDims::for_mode(participants),
            obstacle_count: 3,
            seed: None,
            params: PhysicsParams::default(),
        }
    }

    /// Set the win score.
    pub fn with_win_score(mut self, win_score: u32) -> Self {
        self.win_score = win_score;
        self
    }

    /// Set the AI difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.ai_difficulty = Some(difficulty);
        self
    }

    /// Set the relay endpoint.
    pub fn with_network(mut self, url: impl Into<String>, room: impl Into<String>) -> Self {
        self.network = Some(NetworkEndpoint { url: url.into(), room: room.into() });
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the obstacle count.
    pub fn with_obstacles(mut self, count: usize) -> Self {
        self.obstacle_count = count;
        self
    }

    /// Check the config is playable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.win_score == 0 {
            return Err(ConfigError::InvalidWinScore);
        }
        let p = &self.params;
        let min_half = p.corner_radius + p.paddle_half_length + p.ball_radius;
        if self.field.half_width <= min_half || self.field.half_depth <= min_half {
            return Err(ConfigError::FieldTooSmall {
                half_width: self.field.half_width,
                half_depth: self.field.half_depth,
            });
        }
        Ok(())
    }

    /// Difficulty used by AI paddles.
    pub fn difficulty(&self) -> Difficulty {
        self.ai_difficulty.unwrap_or_default()
    }

    /// Display name for a slot, falling back to the slot label.
    pub fn display_name(&self, slot: Slot) -> String {
        self.display_names
            .get(slot.index())
            .cloned()
            .unwrap_or_else(|| slot.label().to_string())
    }

    /// Control role of every slot, in slot order.
    ///
    /// A guest never simulates, but its table still marks which paddle is
    /// remote so the layout matches the host's.
    pub fn control_roles(&self) -> Vec<ControlRole> {
        self.participants
            .slots()
            .iter()
            .map(|slot| match (self.connection, slot) {
                (ConnectionMode::Local, s) => ControlRole::Human { binding: s.index() },
                (ConnectionMode::AiOpponent, Slot::Left) => ControlRole::Human { binding: 0 },
                (ConnectionMode::AiOpponent, _) => ControlRole::AiControlled,
                (ConnectionMode::RemoteHost, Slot::Left) => ControlRole::Human { binding: 0 },
                (ConnectionMode::RemoteHost, _) => ControlRole::RemoteGuest,
                (ConnectionMode::RemoteGuest, _) => ControlRole::RemoteGuest,
            })
            .collect()
    }

    /// Guests a host must wait for before starting.
    pub fn required_guests(&self) -> usize {
        self.participants.slot_count() - 1
    }
}

// =============================================================================
// TESTS
// =============================================================================
