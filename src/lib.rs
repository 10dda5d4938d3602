//! # Arena Pong
//!
//! Host-authoritative paddle-and-ball arena for two or four players.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ARENA PONG                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec3.rs     - Float vector on the XZ floor plane        │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - Simulation (no I/O)                       │
//! │  ├── config.rs   - Participant/connection modes, config      │
//! │  ├── state.rs    - Slots, paddles, ball, scores              │
//! │  ├── physics.rs  - Ball step and contacts                    │
//! │  ├── ai.rs       - Crossing prediction, AI paddles           │
//! │  ├── input.rs    - Keys, remote input, paddle control        │
//! │  ├── scoring.rs  - Goal attribution and serves               │
//! │  └── tick.rs     - Authoritative match controller            │
//! │                                                              │
//! │  network/        - Host/guest protocol                       │
//! │  ├── protocol.rs - Wire messages                             │
//! │  ├── mailbox.rs  - Per-tick inbox, sinks, loopback           │
//! │  ├── host.rs     - Host session                              │
//! │  ├── guest.rs    - Guest session                             │
//! │  ├── transport.rs- WebSocket client                          │
//! │  └── relay.rs    - Room relay server                         │
//! │                                                              │
//! │  runner.rs       - Picks local/host/guest, drives frames     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority
//!
//! Only the host (or a local match) simulates. Guests mirror the host's
//! snapshots and send key state; every message is a full snapshot, so loss,
//! duplication and reordering never corrupt either side.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod runner;

// Re-export commonly used types
pub use core::vec3::Vec3;
pub use core::rng::MatchRng;
pub use game::config::{ConnectionMode, MatchConfig, ParticipantMode};
pub use game::input::{InputFrame, KeyState};
pub use game::state::{SimulationState, Slot};
pub use game::tick::MatchController;
pub use runner::{FrameSink, MatchRunner};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Target state broadcast rate (Hz)
pub const BROADCAST_RATE_HZ: u32 = 30;
