//! AI Paddle Control
//!
//! Each AI paddle predicts where the ball will cross its plane by stepping a
//! copy of the ball forward, adds a per-serve aim error, and eases toward that
//! target. Difficulty scales the error down and the responsiveness up.

use crate::core::rng::MatchRng;
use crate::core::vec3::Vec3;
use crate::game::config::{Difficulty, FieldDims, ParticipantMode};
use crate::game::params::PhysicsParams;
use crate::game::state::{Ball, SimulationState, Slot};

/// Difficulty-derived tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiTuning {
    /// Half-range of the per-serve aim error.
    pub error_range: f32,
    /// Proportional gain toward the target.
    pub responsiveness: f32,
}

impl AiTuning {
    /// Linear interpolation between the easiest and hardest settings.
    pub fn from_difficulty(difficulty: Difficulty, params: &PhysicsParams) -> Self {
        let t = difficulty.fraction();
        Self {
            error_range: params.ai_error_max * (1.0 - t),
            responsiveness: params.ai_responsiveness_min
                + (params.ai_responsiveness_max - params.ai_responsiveness_min) * t,
        }
    }
}

/// Per-paddle AI state.
#[derive(Clone, Debug, PartialEq)]
pub struct AiController {
    tuning: AiTuning,
    error: f32,
    velocity: f32,
}

impl AiController {
    /// New controller with no aim error until the first serve.
    pub fn new(difficulty: Difficulty, params: &PhysicsParams) -> Self {
        Self {
            tuning: AiTuning::from_difficulty(difficulty, params),
            error: 0.0,
            velocity: 0.0,
        }
    }

    /// Tuning in use.
    pub fn tuning(&self) -> AiTuning {
        self.tuning
    }

    /// Current aim error.
    pub fn error(&self) -> f32 {
        self.error
    }

    /// Re-roll the aim error. Called on every serve.
    pub fn reroll(&mut self, rng: &mut MatchRng) {
        self.error = rng.next_symmetric(self.tuning.error_range);
    }

    /// Target coordinate along the paddle's axis: the predicted crossing
    /// plus aim error, or the centre when no crossing is predicted.
    pub fn target(&self, slot: Slot, state: &SimulationState, params: &PhysicsParams) -> f32 {
        let limit = state.axis_limit(slot, params);
        predict_crossing(&state.ball, slot, state.participants, &state.field, params)
            .map(|c| c + self.error)
            .unwrap_or(0.0)
            .clamp(-limit, limit)
    }

    /// Movement delta for this tick, capped at the human step.
    pub fn compute_move(&mut self, slot: Slot, state: &SimulationState, params: &PhysicsParams) -> f32 {
        let current = match state.paddle(slot) {
            Some(p) => p.axis_position(),
            None => return 0.0,
        };
        let desired = (self.target(slot, state, params) - current) * self.tuning.responsiveness;
        let blended = self.velocity + (desired - self.velocity) * params.ai_blend;
        let step = blended.clamp(-params.paddle_step, params.paddle_step);
        self.velocity = step;
        step
    }
}

/// Forward-simulate the ball on the floor plane until it crosses `slot`'s
/// paddle plane while moving toward it.
///
/// Side walls reflect in 2P mode. Returns `None` when the ball is moving
/// away, leaves through another edge, or the horizon runs out.
pub fn predict_crossing(
    ball: &Ball,
    slot: Slot,
    participants: ParticipantMode,
    field: &FieldDims,
    params: &PhysicsParams,
) -> Option<f32> {
    let inward = slot.inward();
    let facing = slot.facing_axis();
    let movement = slot.movement_axis();
    let plane = slot.edge_sign() * (slot.edge_distance(field) - params.paddle_inset);

    let mut pos = ball.position.xz();
    let mut vel = ball.velocity.xz();
    if vel.dot(inward) >= 0.0 {
        return None;
    }

    let wall = field.half_depth - ball.radius;
    for _ in 0..params.ai_horizon_ticks {
        let next = pos + vel;

        let before = facing.of(pos) - plane;
        let after = facing.of(next) - plane;
        if before * after <= 0.0 {
            let span = before - after;
            let t = if span.abs() < f32::EPSILON { 0.0 } else { before / span };
            return Some(movement.of(pos) + movement.of(vel) * t);
        }

        pos = next;
        if participants == ParticipantMode::Two && pos.z.abs() > wall {
            pos.z = pos.z.clamp(-wall, wall);
            vel.z = -vel.z;
        }

        if pos.x.abs() > field.half_width || pos.z.abs() > field.half_depth {
            return None;
        }
    }
    None
}

/// Unit direction for a serve toward `slot`, rotated by `angle` radians.
pub fn serve_direction(slot: Slot, angle: f32) -> Vec3 {
    let toward = -slot.inward();
    let (sin, cos) = angle.sin_cos();
    Vec3::horizontal(toward.x * cos - toward.z * sin, toward.x * sin + toward.z * cos)
}

// =============================================================================
// TESTS
// =============================================================================
