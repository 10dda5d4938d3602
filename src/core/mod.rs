//! Core primitives.
//!
//! Float vector math on the floor plane and the seeded match RNG. Nothing
//! here knows about paddles or slots.

pub mod vec3;
pub mod rng;

// Re-export core types
pub use vec3::Vec3;
pub use rng::MatchRng;
