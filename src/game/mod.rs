//! Game Logic Module
//!
//! Everything that runs inside one simulation tick. No I/O, no clocks.
//!
//! ## Module Structure
//!
//! - `config`: Participant and connection modes, match configuration
//! - `params`: Physics and AI tuning constants
//! - `state`: Slots, paddles, ball, scores and the simulation state
//! - `physics`: Ball integration and contact resolution
//! - `collision`: Contact tests and responses
//! - `ai`: Crossing prediction and AI paddle control
//! - `input`: Key state, remote input table and per-paddle control
//! - `map`: Obstacle layout generation
//! - `scoring`: Goal attribution, penalties and serves
//! - `tick`: Authoritative match controller
//! - `events`: Game events
//! - `report`: End-of-match report

pub mod config;
pub mod params;
pub mod state;
pub mod physics;
pub mod collision;
pub mod ai;
pub mod input;
pub mod map;
pub mod scoring;
pub mod tick;
pub mod events;
pub mod report;

// Re-export key types
pub use config::{ConnectionMode, Difficulty, MatchConfig, ParticipantMode};
pub use input::{InputFrame, KeyState, PaddleControl};
pub use state::{MatchPhase, SimulationState, Slot};
pub use tick::{MatchController, TickResult};
pub use events::GameEvent;
