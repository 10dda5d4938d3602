//! Collision Detection
//!
//! Narrow-phase tests and responses for the ball against corners, paddles and
//! obstacles. Every test works on the horizontal (XZ) projection; height only
//! matters for the floor bounce in `physics`.

use crate::core::vec3::Vec3;
use crate::game::params::PhysicsParams;
use crate::game::state::{Ball, Obstacle, Paddle};

/// Extra separation added when pushing the ball out of a contact, so the
/// resolved ball no longer overlaps on the next test.
pub const CONTACT_SLOP: f32 = 1e-3;

/// Check if two circles overlap on the floor plane.
#[inline]
pub fn circles_overlap_xz(pos_a: Vec3, radius_a: f32, pos_b: Vec3, radius_b: f32) -> bool {
    let combined = radius_a + radius_b;
    let d = (pos_a - pos_b).xz();
    d.length_squared() < combined * combined
}

/// Horizontal unit normal from `from` toward `to`, or `fallback` when the two
/// points coincide.
#[inline]
pub fn contact_normal(from: Vec3, to: Vec3, fallback: Vec3) -> Vec3 {
    (to - from).xz().normalize_or(fallback)
}

/// Place the ball on the contact ring around `centre`, keeping its height.
fn push_out(ball: &mut Ball, centre: Vec3, normal: Vec3, distance: f32) {
    let ring = centre.xz() + normal.scale(distance + CONTACT_SLOP);
    ball.position.x = ring.x;
    ball.position.z = ring.z;
}

/// Corner block centres, clockwise from (-X, -Z).
pub fn corner_centres(half_width: f32, half_depth: f32) -> [Vec3; 4] {
    [
        Vec3::horizontal(-half_width, -half_depth),
        Vec3::horizontal(half_width, -half_depth),
        Vec3::horizontal(half_width, half_depth),
        Vec3::horizontal(-half_width, half_depth),
    ]
}

/// Ball against a corner block.
///
/// Both horizontal velocity components flip unconditionally on contact.
pub fn resolve_corner(ball: &mut Ball, corner: Vec3, corner_radius: f32) -> bool {
    if !circles_overlap_xz(ball.position, ball.radius, corner, corner_radius) {
        return false;
    }

    ball.velocity.x = -ball.velocity.x;
    ball.velocity.z = -ball.velocity.z;

    let toward_centre = (-corner).xz().normalize_or(Vec3::RIGHT);
    let normal = contact_normal(corner, ball.position, toward_centre);
    push_out(ball, corner, normal, ball.radius + corner_radius);
    true
}

/// Signed contact offset along the paddle's movement axis if the ball is
/// inside the paddle's expanded box.
pub fn paddle_contact(ball: &Ball, paddle: &Paddle, params: &PhysicsParams) -> Option<f32> {
    let facing = paddle.slot.facing_axis();
    let movement = paddle.slot.movement_axis();

    let across = (facing.of(ball.position) - paddle.plane()).abs();
    let along = movement.of(ball.position) - paddle.axis_position();

    let inside = across < params.paddle_half_thickness + ball.radius
        && along.abs() < params.paddle_half_length + ball.radius;
    inside.then_some(along)
}

/// Whether the ball is travelling toward a paddle's edge.
#[inline]
pub fn moving_toward(ball: &Ball, paddle: &Paddle) -> bool {
    ball.velocity.dot(paddle.slot.inward()) < 0.0
}

/// Ball against a paddle.
///
/// On a hit the facing-axis component reverses with `paddle_hit_gain`, the
/// lateral component picks up deflection from the contact offset, horizontal
/// speed is capped, and the ball is moved clear of the paddle face.
pub fn resolve_paddle(ball: &mut Ball, paddle: &Paddle, params: &PhysicsParams) -> bool {
    if !moving_toward(ball, paddle) {
        return false;
    }
    let offset = match paddle_contact(ball, paddle, params) {
        Some(offset) => offset,
        None => return false,
    };

    let facing = paddle.slot.facing_axis();
    let movement = paddle.slot.movement_axis();

    let reflected = -facing.of(ball.velocity) * params.paddle_hit_gain;
    facing.set(&mut ball.velocity, reflected);

    let lateral = movement.of(ball.velocity) + offset * params.deflection;
    movement.set(&mut ball.velocity, lateral);

    ball.velocity = ball.velocity.clamp_length_xz(params.max_horizontal_speed);

    let inward_sign = facing.of(paddle.slot.inward());
    let clear = paddle.plane()
        + inward_sign * (params.paddle_half_thickness + ball.radius + CONTACT_SLOP);
    facing.set(&mut ball.position, clear);
    true
}

/// Ball against an obstacle.
///
/// Reflects about the contact normal with a gain above one when the ball is
/// approaching, and always moves it onto the contact ring.
pub fn resolve_obstacle(ball: &mut Ball, obstacle: &Obstacle, gain: f32) -> bool {
    if !circles_overlap_xz(ball.position, ball.radius, obstacle.position, obstacle.radius) {
        return false;
    }

    let fallback = (-ball.velocity).xz().normalize_or(Vec3::RIGHT);
    let normal = contact_normal(obstacle.position, ball.position, fallback);

    if ball.velocity.dot(normal) < 0.0 {
        let reflected = ball.velocity.reflect(normal);
        ball.velocity = Vec3::new(reflected.x * gain, reflected.y, reflected.z * gain);
    }

    push_out(ball, obstacle.position, normal, ball.radius + obstacle.radius);
    true
}

// =============================================================================
// TESTS
// =============================================================================
