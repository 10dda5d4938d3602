//! Simulation State
//!
//! Everything the physics step reads and writes. `SimulationState` is owned by
//! whoever is authoritative for the match (the `MatchController` locally, or the
//! guest's render copy) and is passed by reference into every system.

use serde::{Serialize, Deserialize};

use crate::core::rng::MatchRng;
use crate::core::vec3::Vec3;
use crate::game::config::{FieldDims, MatchConfig, ParticipantMode};
use crate::game::events::GameEvent;
use crate::game::params::PhysicsParams;

// =============================================================================
// SLOTS
// =============================================================================

/// Paddle slot. Bottom and Top only exist in 4-participant mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Slot {
    /// Slot 0, guards the -X edge.
    Left = 0,
    /// Slot 1, guards the +X edge.
    Right = 1,
    /// Slot 2, guards the +Z edge.
    Bottom = 2,
    /// Slot 3, guards the -Z edge.
    Top = 3,
}

/// Horizontal axis a paddle slides along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// World X.
    X,
    /// World Z.
    Z,
}

impl Axis {
    /// Read this axis from a vector.
    #[inline]
    pub fn of(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    /// Write this axis into a vector.
    #[inline]
    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Z => v.z = value,
        }
    }

    /// The other horizontal axis.
    #[inline]
    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

impl Slot {
    /// All four slots in index order.
    pub const ALL: [Slot; 4] = [Slot::Left, Slot::Right, Slot::Bottom, Slot::Top];

    /// Numeric slot index.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot from its index.
    pub fn from_index(index: usize) -> Option<Slot> {
        Slot::ALL.get(index).copied()
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Slot::Left => "Left",
            Slot::Right => "Right",
            Slot::Bottom => "Bottom",
            Slot::Top => "Top",
        }
    }

    /// Axis the paddle moves along.
    #[inline]
    pub fn movement_axis(self) -> Axis {
        match self {
            Slot::Left | Slot::Right => Axis::Z,
            Slot::Bottom | Slot::Top => Axis::X,
        }
    }

    /// Axis the paddle faces (and the ball crosses to score on it).
    #[inline]
    pub fn facing_axis(self) -> Axis {
        self.movement_axis().other()
    }

    /// Unit normal pointing from this slot's edge into the field.
    pub fn inward(self) -> Vec3 {
        match self {
            Slot::Left => Vec3::horizontal(1.0, 0.0),
            Slot::Right => Vec3::horizontal(-1.0, 0.0),
            Slot::Bottom => Vec3::horizontal(0.0, -1.0),
            Slot::Top => Vec3::horizontal(0.0, 1.0),
        }
    }

    /// Sign of this slot's edge along its facing axis.
    #[inline]
    pub fn edge_sign(self) -> f32 {
        match self {
            Slot::Left | Slot::Top => -1.0,
            Slot::Right | Slot::Bottom => 1.0,
        }
    }

    /// Half extent of the field along this slot's facing axis.
    pub fn edge_distance(self, field: &FieldDims) -> f32 {
        match self.facing_axis() {
            Axis::X => field.half_width,
            Axis::Z => field.half_depth,
        }
    }

    /// Half extent of the field along this slot's movement axis.
    pub fn span(self, field: &FieldDims) -> f32 {
        match self.movement_axis() {
            Axis::X => field.half_width,
            Axis::Z => field.half_depth,
        }
    }

    /// The facing slot in 2-participant mode.
    pub fn opposite(self) -> Slot {
        match self {
            Slot::Left => Slot::Right,
            Slot::Right => Slot::Left,
            Slot::Bottom => Slot::Top,
            Slot::Top => Slot::Bottom,
        }
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Slot::from_index(v as usize).ok_or_else(|| format!("invalid slot {}", v))
    }
}

impl From<Slot> for u8 {
    fn from(s: Slot) -> u8 {
        s as u8
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Who drives a paddle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlRole {
    /// Local keyboard, using the given key binding set.
    Human {
        /// Index into `KeyState::bindings`.
        binding: usize,
    },
    /// Driven by the AI controller.
    AiControlled,
    /// Driven by a remote guest's input records.
    RemoteGuest,
}

/// The ball.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Centre position.
    pub position: Vec3,
    /// Velocity per tick.
    pub velocity: Vec3,
    /// Radius.
    pub radius: f32,
}

impl Ball {
    /// Ball at rest at the given height above the field centre.
    pub fn at_centre(height: f32, radius: f32) -> Self {
        Self {
            position: Vec3::new(0.0, height, 0.0),
            velocity: Vec3::ZERO,
            radius,
        }
    }
}

/// A paddle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paddle {
    /// Slot this paddle guards.
    pub slot: Slot,
    /// Centre position.
    pub position: Vec3,
    /// Control role.
    pub role: ControlRole,
}

impl Paddle {
    /// Paddle at its home position for the field.
    pub fn new(slot: Slot, role: ControlRole, field: &FieldDims, params: &PhysicsParams) -> Self {
        let mut position = Vec3::ZERO;
        let plane = slot.edge_sign() * (slot.edge_distance(field) - params.paddle_inset);
        slot.facing_axis().set(&mut position, plane);
        Self { slot, position, role }
    }

    /// Coordinate along the movement axis.
    #[inline]
    pub fn axis_position(&self) -> f32 {
        self.slot.movement_axis().of(self.position)
    }

    /// Coordinate along the facing axis (the paddle plane).
    #[inline]
    pub fn plane(&self) -> f32 {
        self.slot.facing_axis().of(self.position)
    }

    /// Set the movement-axis coordinate, clamped to `limit`.
    pub fn set_axis_position(&mut self, value: f32, limit: f32) {
        let clamped = value.clamp(-limit, limit);
        self.slot.movement_axis().set(&mut self.position, clamped);
    }
}

/// Static obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Centre on the floor plane.
    pub position: Vec3,
    /// Radius.
    pub radius: f32,
}

/// Score per slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreVector(Vec<u32>);

impl ScoreVector {
    /// All zeros for `slots` slots.
    pub fn new(slots: usize) -> Self {
        Self(vec![0; slots])
    }

    /// Build from raw values.
    pub fn from_vec(values: Vec<u32>) -> Self {
        Self(values)
    }

    /// Score of a slot.
    pub fn get(&self, slot: Slot) -> u32 {
        self.0.get(slot.index()).copied().unwrap_or(0)
    }

    /// Add one point.
    pub fn award(&mut self, slot: Slot) -> u32 {
        match self.0.get_mut(slot.index()) {
            Some(s) => {
                *s += 1;
                *s
            }
            None => 0,
        }
    }

    /// Remove one point, never going below zero.
    pub fn penalize(&mut self, slot: Slot) -> u32 {
        match self.0.get_mut(slot.index()) {
            Some(s) => {
                *s = s.saturating_sub(1);
                *s
            }
            None => 0,
        }
    }

    /// First slot at or above `target`, if any.
    pub fn reached(&self, target: u32) -> Option<Slot> {
        self.0
            .iter()
            .position(|s| *s >= target)
            .and_then(Slot::from_index)
    }

    /// Raw values in slot order.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

/// Rally bookkeeping since the last serve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RallyState {
    /// Last paddle to touch the ball.
    pub last_hitter: Option<Slot>,
    /// Any paddle touched the ball since the serve.
    pub touched_once: bool,
    /// The ball hit an obstacle after the last paddle hit.
    pub obstacle_after_hit: bool,
}

impl RallyState {
    /// Record a paddle hit.
    pub fn paddle_hit(&mut self, slot: Slot) {
        self.last_hitter = Some(slot);
        self.touched_once = true;
        self.obstacle_after_hit = false;
    }

    /// Record an obstacle contact.
    pub fn obstacle_hit(&mut self) {
        if self.touched_once {
            self.obstacle_after_hit = true;
        }
    }
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Match lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Set up, ball not served yet.
    Waiting,
    /// Ball in play.
    Running,
    /// A slot reached the win score.
    Ended,
}

/// Complete state of a match.
#[derive(Clone, Debug)]
pub struct SimulationState {
    /// Ticks simulated since start.
    pub tick: u32,
    /// Lifecycle phase.
    pub phase: MatchPhase,
    /// 2 or 4 paddles.
    pub participants: ParticipantMode,
    /// Field half extents.
    pub field: FieldDims,
    /// The ball.
    pub ball: Ball,
    /// Paddles in slot order.
    pub paddles: Vec<Paddle>,
    /// Obstacles; immutable once established.
    pub obstacles: Vec<Obstacle>,
    /// Score per slot.
    pub scores: ScoreVector,
    /// Rally flags since the last serve.
    pub rally: RallyState,
    /// Match RNG.
    pub rng: MatchRng,
    /// Events generated this tick (drained by the tick function).
    pub pending_events: Vec<GameEvent>,
}

impl SimulationState {
    /// Fresh state for a config: paddles at home, ball at rest, no obstacles.
    pub fn new(config: &MatchConfig, rng: MatchRng) -> Self {
        let paddles = config
            .participants
            .slots()
            .iter()
            .zip(config.control_roles())
            .map(|(slot, role)| Paddle::new(*slot, role, &config.field, &config.params))
            .collect();

        Self {
            tick: 0,
            phase: MatchPhase::Waiting,
            participants: config.participants,
            field: config.field,
            ball: Ball::at_centre(config.params.serve_height, config.params.ball_radius),
            paddles,
            obstacles: Vec::new(),
            scores: ScoreVector::new(config.participants.slot_count()),
            rally: RallyState::default(),
            rng,
            pending_events: Vec::new(),
        }
    }

    /// Paddle for a slot.
    pub fn paddle(&self, slot: Slot) -> Option<&Paddle> {
        self.paddles.get(slot.index())
    }

    /// Mutable paddle for a slot.
    pub fn paddle_mut(&mut self, slot: Slot) -> Option<&mut Paddle> {
        self.paddles.get_mut(slot.index())
    }

    /// Largest allowed |axis position| for a slot's paddle: the field span
    /// minus the corner-exclusion margin and the paddle's own half length.
    pub fn axis_limit(&self, slot: Slot, params: &PhysicsParams) -> f32 {
        (slot.span(&self.field) - params.corner_radius - params.paddle_half_length).max(0.0)
    }

    /// Move a paddle by `delta` along its axis, clamped to the field.
    pub fn move_paddle(&mut self, slot: Slot, delta: f32, params: &PhysicsParams) {
        let limit = self.axis_limit(slot, params);
        if let Some(paddle) = self.paddle_mut(slot) {
            let target = paddle.axis_position() + delta;
            paddle.set_axis_position(target, limit);
        }
    }

    /// Whether the match has ended.
    pub fn is_ended(&self) -> bool {
        self.phase == MatchPhase::Ended
    }

    /// Take all pending events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Queue an event for this tick.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================
