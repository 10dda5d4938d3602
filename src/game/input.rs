//! Input Aggregation
//!
//! Turns local key state, received guest input records and AI decisions into
//! one signed movement delta per paddle.
//!
//! Every paddle carries a `PaddleControl` matching its `ControlRole`. Calling
//! `compute_move` on it yields the axis delta for this tick; the controller
//! then applies it with clamping.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::ai::AiController;
use crate::game::config::Difficulty;
use crate::game::params::PhysicsParams;
use crate::game::state::{ControlRole, SimulationState, Slot};

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Directional input for one paddle: two buttons along the paddle's axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Negative-direction key held.
    pub neg: bool,
    /// Positive-direction key held.
    pub pos: bool,
}

impl InputFrame {
    /// No keys held.
    pub const IDLE: InputFrame = InputFrame { neg: false, pos: false };

    /// Create a frame.
    pub const fn new(neg: bool, pos: bool) -> Self {
        Self { neg, pos }
    }

    /// -1, 0 or +1. Both keys cancel out.
    #[inline]
    pub fn axis_value(self) -> f32 {
        (self.pos as i8 - self.neg as i8) as f32
    }
}

/// Local keyboard state, one frame per key binding set.
///
/// Binding 0 is the primary player's keys; a local multi-player match uses
/// one binding per slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Held keys per binding set.
    pub bindings: [InputFrame; 4],
}

impl KeyState {
    /// Nothing held.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Only binding 0 set.
    pub fn primary(frame: InputFrame) -> Self {
        let mut keys = Self::default();
        keys.bindings[0] = frame;
        keys
    }

    /// Frame for a binding set (idle if out of range).
    pub fn binding(&self, index: usize) -> InputFrame {
        self.bindings.get(index).copied().unwrap_or_default()
    }
}

/// Most recent remote input per slot. Later records overwrite earlier ones,
/// so loss, duplication and reordering never corrupt it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputTable {
    latest: BTreeMap<Slot, InputFrame>,
}

impl InputTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest snapshot for a slot.
    pub fn apply(&mut self, slot: Slot, frame: InputFrame) {
        self.latest.insert(slot, frame);
    }

    /// Latest snapshot for a slot (idle if none received).
    pub fn get(&self, slot: Slot) -> InputFrame {
        self.latest.get(&slot).copied().unwrap_or_default()
    }

    /// Forget a slot's input.
    pub fn clear_slot(&mut self, slot: Slot) {
        self.latest.remove(&slot);
    }
}

/// World-axis sign for a slot's keys. Top faces the opposite way from
/// Bottom, so its keys are mirrored.
#[inline]
pub fn slot_sign(slot: Slot) -> f32 {
    match slot {
        Slot::Top => -1.0,
        Slot::Left | Slot::Right | Slot::Bottom => 1.0,
    }
}

/// Axis delta produced by a key frame on a slot.
#[inline]
pub fn key_delta(slot: Slot, frame: InputFrame, params: &PhysicsParams) -> f32 {
    slot_sign(slot) * frame.axis_value() * params.paddle_step
}

// =============================================================================
// PADDLE CONTROL
// =============================================================================

/// Inputs visible to every paddle control this tick.
#[derive(Clone, Copy, Debug)]
pub struct InputContext<'a> {
    /// Local keyboard.
    pub keys: &'a KeyState,
    /// Remote input table; only the host has one.
    pub remote: Option<&'a InputTable>,
}

/// How one paddle decides its movement.
#[derive(Clone, Debug, PartialEq)]
pub enum PaddleControl {
    /// Local keys from a binding set.
    Human {
        /// Binding set index.
        binding: usize,
    },
    /// AI controller.
    Ai(AiController),
    /// Remote guest input from the host's table. No-op without one.
    RemoteGuest,
}

impl PaddleControl {
    /// Build the control for a role.
    pub fn from_role(role: ControlRole, difficulty: Difficulty, params: &PhysicsParams) -> Self {
        match role {
            ControlRole::Human { binding } => PaddleControl::Human { binding },
            ControlRole::AiControlled => PaddleControl::Ai(AiController::new(difficulty, params)),
            ControlRole::RemoteGuest => PaddleControl::RemoteGuest,
        }
    }

    /// Signed axis delta for this tick.
    pub fn compute_move(
        &mut self,
        slot: Slot,
        state: &SimulationState,
        ctx: &InputContext<'_>,
        params: &PhysicsParams,
    ) -> f32 {
        match self {
            PaddleControl::Human { binding } => key_delta(slot, ctx.keys.binding(*binding), params),
            PaddleControl::Ai(ai) => ai.compute_move(slot, state, params),
            PaddleControl::RemoteGuest => ctx
                .remote
                .map(|table| key_delta(slot, table.get(slot), params))
                .unwrap_or(0.0),
        }
    }

    /// AI controller, if this is one.
    pub fn as_ai_mut(&mut self) -> Option<&mut AiController> {
        match self {
            PaddleControl::Ai(ai) => Some(ai),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
