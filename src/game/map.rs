//! Obstacle Layout
//!
//! Seeded rejection sampling of round obstacles in the middle of the field.
//! The layout is generated once per match, either locally or by the host, and
//! never changes afterwards.

use crate::core::rng::MatchRng;
use crate::core::vec3::Vec3;
use crate::game::config::FieldDims;
use crate::game::params::PhysicsParams;
use crate::game::state::Obstacle;

const MIN_RADIUS: f32 = 0.5;
const MAX_RADIUS: f32 = 0.9;
/// Fraction of each half extent obstacles may occupy.
const SPREAD: f32 = 0.55;
/// Keep-out radius around the serve point.
const SERVE_CLEARANCE: f32 = 2.0;
const ATTEMPTS_PER_OBSTACLE: u32 = 200;

/// Generate up to `count` non-overlapping obstacles.
///
/// Obstacles keep clear of the serve point and leave at least a ball's
/// width between each other. Fewer than `count` may be returned on a small
/// field.
pub fn generate_obstacles(
    rng: &mut MatchRng,
    field: &FieldDims,
    params: &PhysicsParams,
    count: usize,
) -> Vec<Obstacle> {
    let mut obstacles: Vec<Obstacle> = Vec::with_capacity(count);
    let max_x = field.half_width * SPREAD;
    let max_z = field.half_depth * SPREAD;
    let gap = 2.0 * params.ball_radius + 0.5;

    for _ in 0..count {
        for _ in 0..ATTEMPTS_PER_OBSTACLE {
            let radius = rng.next_range(MIN_RADIUS, MAX_RADIUS);
            let position = Vec3::horizontal(rng.next_symmetric(max_x), rng.next_symmetric(max_z));

            if position.length_xz() < SERVE_CLEARANCE + radius {
                continue;
            }
            let clear = obstacles
                .iter()
                .all(|o| o.position.distance_xz(position) > o.radius + radius + gap);
            if clear {
                obstacles.push(Obstacle { position, radius });
                break;
            }
        }
    }

    obstacles
}
