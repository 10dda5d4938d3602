//! Goals, Penalties and Serves
//!
//! Goal rules per mode:
//! - 2P: the ball leaves past the Left or Right edge; the opposite slot
//!   scores.
//! - 4P: the ball leaves past any edge; the last hitter scores.
//!
//! Both modes apply the touch gate (no paddle contact since the serve means
//! no score) and the self-penalty (hit, obstacle, out through the hitter's
//! own edge costs the hitter one point, applied before any other award).

use crate::game::ai::serve_direction;
use crate::game::config::ParticipantMode;
use crate::game::events::{self, NoScoreReason};
use crate::game::params::PhysicsParams;
use crate::game::state::{Ball, RallyState, SimulationState, Slot};

/// What a ball leaving the field means for the score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalOutcome {
    /// Edge the ball left through.
    pub conceded: Slot,
    /// Slot losing a point to the self-penalty.
    pub penalized: Option<Slot>,
    /// Slot credited with a point.
    pub scorer: Option<Slot>,
    /// Set when nothing changes.
    pub void: Option<NoScoreReason>,
}

impl GoalOutcome {
    fn void(conceded: Slot, reason: NoScoreReason) -> Self {
        Self { conceded, penalized: None, scorer: None, void: Some(reason) }
    }
}

/// Edge the ball has crossed, if any.
pub fn exited_edge(ball: &Ball, state: &SimulationState) -> Option<Slot> {
    let field = &state.field;
    if ball.position.x < -field.half_width {
        return Some(Slot::Left);
    }
    if ball.position.x > field.half_width {
        return Some(Slot::Right);
    }
    if state.participants == ParticipantMode::Four {
        if ball.position.z > field.half_depth {
            return Some(Slot::Bottom);
        }
        if ball.position.z < -field.half_depth {
            return Some(Slot::Top);
        }
    }
    None
}

/// Apply the goal rule for a ball that left through `conceded`.
pub fn judge(participants: ParticipantMode, rally: &RallyState, conceded: Slot) -> GoalOutcome {
    let hitter = match rally.last_hitter {
        Some(h) if rally.touched_once => h,
        _ => return GoalOutcome::void(conceded, NoScoreReason::Untouched),
    };
    let penalized = (rally.obstacle_after_hit && hitter == conceded).then_some(hitter);

    match participants {
        ParticipantMode::Two => GoalOutcome {
            conceded,
            penalized,
            scorer: Some(conceded.opposite()),
            void: None,
        },
        ParticipantMode::Four => {
            if hitter != conceded {
                GoalOutcome { conceded, penalized: None, scorer: Some(hitter), void: None }
            } else if penalized.is_some() {
                GoalOutcome { conceded, penalized, scorer: None, void: None }
            } else {
                GoalOutcome::void(conceded, NoScoreReason::OwnEdge)
            }
        }
    }
}

/// Write an outcome into the score vector and queue its events.
pub fn apply_outcome(state: &mut SimulationState, outcome: &GoalOutcome) {
    let tick = state.tick;

    if let Some(reason) = outcome.void {
        state.push_event(events::no_score(tick, outcome.conceded, reason));
        return;
    }
    if let Some(slot) = outcome.penalized {
        let new_score = state.scores.penalize(slot);
        state.push_event(events::penalty(tick, slot, new_score));
    }
    if let Some(scorer) = outcome.scorer {
        let new_score = state.scores.award(scorer);
        state.push_event(events::goal(tick, scorer, outcome.conceded, new_score));
    }
}

/// Reset the ball to the centre and launch it toward `toward` with a random
/// angle and speed. Clears the rally flags.
pub fn serve(state: &mut SimulationState, toward: Slot, params: &PhysicsParams) {
    let angle = state.rng.next_symmetric(params.max_serve_angle);
    let speed = state.rng.next_range(params.serve_speed_min, params.serve_speed_max);
    let velocity = serve_direction(toward, angle).scale(speed);

    state.ball = Ball::at_centre(params.serve_height, params.ball_radius);
    state.ball.velocity = velocity;
    state.rally = RallyState::default();

    let tick = state.tick;
    state.push_event(events::served(tick, toward, velocity));
}

// =============================================================================
// TESTS
// =============================================================================
