//! Physics Step
//!
//! Integrates the ball for one tick and resolves every contact in a fixed
//! order: speed ramp, gravity, integrate, floor, side walls (2P only), corners,
//! paddles, obstacles. Contact bookkeeping goes into `state.rally` and events
//! are queued on the state.

use crate::game::collision::{corner_centres, resolve_corner, resolve_obstacle, resolve_paddle};
use crate::game::config::ParticipantMode;
use crate::game::events;
use crate::game::params::PhysicsParams;
use crate::game::state::SimulationState;

/// Advance the ball by one tick.
pub fn step(state: &mut SimulationState, params: &PhysicsParams) {
    integrate(state, params);
    bounce_floor(state, params);

    if state.participants == ParticipantMode::Two {
        bounce_side_walls(state);
    }

    process_corners(state, params);
    process_paddles(state, params);
    process_obstacles(state, params);
}

/// Speed ramp, gravity and position update.
fn integrate(state: &mut SimulationState, params: &PhysicsParams) {
    let ball = &mut state.ball;
    ball.velocity = ball
        .velocity
        .scale(params.speed_ramp)
        .clamp_length_xz(params.max_horizontal_speed);
    ball.velocity.y -= params.gravity;
    ball.position += ball.velocity;
}

fn bounce_floor(state: &mut SimulationState, params: &PhysicsParams) {
    let ball = &mut state.ball;
    let floor = params.floor_height();
    if ball.position.y < floor {
        ball.position.y = floor;
        ball.velocity.y = -ball.velocity.y * params.floor_restitution;
    }
}

/// Reflect off the Z walls. In 2P mode those edges are not goals.
fn bounce_side_walls(state: &mut SimulationState) {
    let limit = state.field.half_depth - state.ball.radius;
    let ball = &mut state.ball;
    if ball.position.z > limit {
        ball.position.z = limit;
        ball.velocity.z = -ball.velocity.z.abs();
    } else if ball.position.z < -limit {
        ball.position.z = -limit;
        ball.velocity.z = ball.velocity.z.abs();
    }
}

fn process_corners(state: &mut SimulationState, params: &PhysicsParams) {
    let corners = corner_centres(state.field.half_width, state.field.half_depth);
    for (index, corner) in (0u8..).zip(corners) {
        if resolve_corner(&mut state.ball, corner, params.corner_radius) {
            let tick = state.tick;
            state.push_event(events::corner_hit(tick, index));
        }
    }
}

fn process_paddles(state: &mut SimulationState, params: &PhysicsParams) {
    for i in 0..state.paddles.len() {
        let paddle = state.paddles[i];
        if resolve_paddle(&mut state.ball, &paddle, params) {
            state.rally.paddle_hit(paddle.slot);
            let tick = state.tick;
            let speed = state.ball.velocity.length_xz();
            state.push_event(events::paddle_hit(tick, paddle.slot, speed));
        }
    }
}

fn process_obstacles(state: &mut SimulationState, params: &PhysicsParams) {
    for i in 0..state.obstacles.len() {
        let obstacle = state.obstacles[i];
        if resolve_obstacle(&mut state.ball, &obstacle, params.obstacle_gain) {
            state.rally.obstacle_hit();
            let tick = state.tick;
            state.push_event(events::obstacle_hit(tick, i));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::MatchRng;
    use crate::core::vec3::Vec3;
    use crate::game::config::{ConnectionMode, MatchConfig};
    use crate::game::events::GameEventData;
    use crate::game::state::{Obstacle, Slot};

    fn state_for(participants: ParticipantMode) -> (SimulationState, PhysicsParams) {
        let cfg = MatchConfig::new(participants, ConnectionMode::AiOpponent);
        (SimulationState::new(&cfg, MatchRng::new(7)), cfg.params.clone())
    }

    #[test]
    fn test_gravity_and_floor_bounce() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        state.ball.position = Vec3::new(0.0, params.floor_height() + 0.01, 0.0);
        state.ball.velocity = Vec3::new(0.0, -0.2, 0.0);

        step(&mut state, &params);

        assert_eq!(state.ball.position.y, params.floor_height());
        assert!(state.ball.velocity.y > 0.0);
        // Restitution below one loses energy
        assert!(state.ball.velocity.y < 0.2 * params.speed_ramp + params.gravity);
    }

    #[test]
    fn test_speed_ramp() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        state.ball.velocity = Vec3::horizontal(0.1, 0.0);

        step(&mut state, &params);

        assert!((state.ball.velocity.x - 0.1 * params.speed_ramp).abs() < 1e-7);
    }

    #[test]
    fn test_side_wall_bounce_two_player() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        let limit = state.field.half_depth - state.ball.radius;
        state.ball.position = Vec3::new(0.0, 1.0, limit - 0.05);
        state.ball.velocity = Vec3::horizontal(0.0, 0.2);

        step(&mut state, &params);

        assert!(state.ball.position.z <= limit);
        assert!(state.ball.velocity.z < 0.0);
    }

    #[test]
    fn test_no_side_wall_in_four_player() {
        let (mut state, params) = state_for(ParticipantMode::Four);
        // Move Bottom paddle out of the way
        state.move_paddle(Slot::Bottom, 100.0, &params);
        let limit = state.field.half_depth - state.ball.radius;
        state.ball.position = Vec3::new(0.0, 1.0, limit - 0.05);
        state.ball.velocity = Vec3::horizontal(0.0, 0.2);

        step(&mut state, &params);

        assert!(state.ball.position.z > limit);
        assert!(state.ball.velocity.z > 0.0);
    }

    #[test]
    fn test_paddle_hit_updates_rally() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        state.rally.obstacle_after_hit = true;
        let plane = state.paddle(Slot::Right).unwrap().plane();
        state.ball.position = Vec3::new(plane - 0.5, 1.0, 0.0);
        state.ball.velocity = Vec3::horizontal(0.2, 0.0);

        step(&mut state, &params);

        assert!(state.ball.velocity.x < 0.0);
        assert_eq!(state.rally.last_hitter, Some(Slot::Right));
        assert!(state.rally.touched_once);
        assert!(!state.rally.obstacle_after_hit);
        let events = state.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.data, GameEventData::PaddleHit { slot: Slot::Right, .. })));
    }

    #[test]
    fn test_obstacle_after_hit_flag() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        state.obstacles.push(Obstacle { position: Vec3::horizontal(0.0, 0.0), radius: 1.0 });
        state.rally.paddle_hit(Slot::Left);
        state.ball.position = Vec3::new(-1.5, 1.0, 0.0);
        state.ball.velocity = Vec3::horizontal(0.3, 0.0);

        step(&mut state, &params);

        assert!(state.rally.obstacle_after_hit);
        assert!(state.ball.velocity.x < 0.0);
    }

    #[test]
    fn test_obstacle_before_any_hit_does_not_flag() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        state.obstacles.push(Obstacle { position: Vec3::horizontal(0.0, 0.0), radius: 1.0 });
        state.ball.position = Vec3::new(-1.5, 1.0, 0.0);
        state.ball.velocity = Vec3::horizontal(0.3, 0.0);

        step(&mut state, &params);

        assert!(!state.rally.obstacle_after_hit);
    }

    #[test]
    fn test_obstacle_event_keeps_large_index() {
        let (mut state, params) = state_for(ParticipantMode::Two);
        state.obstacles = (0..300)
            .map(|i| Obstacle { position: Vec3::horizontal(100.0 + i as f32 * 3.0, 0.0), radius: 1.0 })
            .collect();
        state.obstacles.push(Obstacle { position: Vec3::horizontal(0.0, 0.0), radius: 1.0 });
        state.ball.position = Vec3::new(-1.5, 1.0, 0.0);
        state.ball.velocity = Vec3::horizontal(0.3, 0.0);

        step(&mut state, &params);

        let events = state.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.data, GameEventData::ObstacleHit { obstacle: 300 })));
    }
}
