//! Simulation tuning.
//!
//! All distances are world units, all speeds are units per tick.

use std::f32::consts::FRAC_PI_6;
use serde::{Serialize, Deserialize};

/// Physics, serve and AI tuning shared by every match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Ball radius.
    pub ball_radius: f32,
    /// Per-tick velocity multiplier (speed ramp).
    pub speed_ramp: f32,
    /// Downward acceleration per tick.
    pub gravity: f32,
    /// Vertical restitution on floor contact, below 1.
    pub floor_restitution: f32,
    /// Corner block radius; also the paddle corner-exclusion margin.
    pub corner_radius: f32,
    /// Paddle half-extent along its movement axis.
    pub paddle_half_length: f32,
    /// Paddle half-extent along its facing axis.
    pub paddle_half_thickness: f32,
    /// Distance from the goal edge to the paddle centre.
    pub paddle_inset: f32,
    /// Facing-axis amplification on a paddle hit.
    pub paddle_hit_gain: f32,
    /// Lateral velocity added per unit of contact offset.
    pub deflection: f32,
    /// Cap on horizontal ball speed.
    pub max_horizontal_speed: f32,
    /// Velocity gain on obstacle contact, above 1.
    pub obstacle_gain: f32,
    /// Maximum paddle travel per tick (human and AI).
    pub paddle_step: f32,
    /// Serve speed lower bound.
    pub serve_speed_min: f32,
    /// Serve speed upper bound.
    pub serve_speed_max: f32,
    /// Maximum serve deviation from the target slot's facing axis (radians).
    pub max_serve_angle: f32,
    /// Ball height at serve.
    pub serve_height: f32,
    /// Forward-simulation horizon for AI prediction (ticks).
    pub ai_horizon_ticks: u32,
    /// Weight of the new proportional term when blending AI velocity.
    pub ai_blend: f32,
    /// Aim error half-range at difficulty 1.
    pub ai_error_max: f32,
    /// Responsiveness at difficulty 1.
    pub ai_responsiveness_min: f32,
    /// Responsiveness at difficulty 10.
    pub ai_responsiveness_max: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            ball_radius: 0.3,
            speed_ramp: 1.0008,
            gravity: 0.012,
            floor_restitution: 0.75,
            corner_radius: 0.9,
            paddle_half_length: 1.4,
            paddle_half_thickness: 0.2,
            paddle_inset: 0.6,
            paddle_hit_gain: 1.05,
            deflection: 0.06,
            max_horizontal_speed: 0.55,
            obstacle_gain: 1.03,
            paddle_step: 0.22,
            serve_speed_min: 0.16,
            serve_speed_max: 0.22,
            max_serve_angle: FRAC_PI_6,
            serve_height: 1.2,
            ai_horizon_ticks: 600,
            ai_blend: 0.5,
            ai_error_max: 1.8,
            ai_responsiveness_min: 0.08,
            ai_responsiveness_max: 0.6,
        }
    }
}

impl PhysicsParams {
    /// Lowest height the ball centre may reach.
    #[inline]
    pub fn floor_height(&self) -> f32 {
        self.ball_radius
    }
}
