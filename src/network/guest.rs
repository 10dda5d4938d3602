//! Guest Session
//!
//! The render-only side of a networked match. A guest never simulates: it
//! asks for a slot, waits for the start, then mirrors the host's snapshots
//! into a local view and sends its own key state every frame.
//!
//! Phases: `Connecting -> WaitingForAssignment -> WaitingForStart -> Synced -> Ended`.
//!
//! Lost `start` messages are tolerated: a `state` while waiting for the start
//! implies it. Lost `assign` messages are recovered by re-sending `join` on
//! the retry timer; the host repeats the assignment for a known guest.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::rng::MatchRng;
use crate::game::config::MatchConfig;
use crate::game::input::KeyState;
use crate::game::state::{MatchPhase, ScoreVector, SimulationState, Slot};
use crate::game::tick::TickResult;
use crate::core::vec3::Vec3;
use crate::network::mailbox::{send_or_log, MessageSink};
use crate::network::protocol::{InputRecord, Join, ProtocolError, StateSnapshot, WireMessage};
use crate::network::session::{PhaseTimer, Role, SessionError, SessionSettings, TimerStep};

/// Guest lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestPhase {
    /// Transport not connected yet.
    Connecting,
    /// Join sent, no slot yet.
    WaitingForAssignment,
    /// Slot known, match not started.
    WaitingForStart,
    /// Mirroring host state.
    Synced,
    /// A slot reached the win score (or waiting gave up).
    Ended,
}

impl GuestPhase {
    fn name(self) -> &'static str {
        match self {
            GuestPhase::Connecting => "Connecting",
            GuestPhase::WaitingForAssignment => "WaitingForAssignment",
            GuestPhase::WaitingForStart => "WaitingForStart",
            GuestPhase::Synced => "Synced",
            GuestPhase::Ended => "Ended",
        }
    }
}

/// Render-only networked session.
pub struct GuestSession {
    room: String,
    guest_id: Uuid,
    phase: GuestPhase,
    slot: Option<Slot>,
    config: MatchConfig,
    view: SimulationState,
    obstacles_built: bool,
    sink: Box<dyn MessageSink>,
    timer: PhaseTimer,
    token: Option<String>,
}

impl GuestSession {
    /// Create a guest for `room`. Nothing is sent until the sink is open.
    pub fn new(
        config: MatchConfig,
        room: impl Into<String>,
        sink: Box<dyn MessageSink>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let view = SimulationState::new(&config, MatchRng::new(config.seed.unwrap_or_default()));

        Ok(Self {
            room: room.into(),
            guest_id: Uuid::new_v4(),
            phase: GuestPhase::Connecting,
            slot: None,
            token: config.session_token.clone(),
            config,
            view,
            obstacles_built: false,
            sink,
            timer: PhaseTimer::new(settings.retry),
        })
    }

    /// This guest's identifier.
    pub fn guest_id(&self) -> Uuid {
        self.guest_id
    }

    /// Current phase.
    pub fn phase(&self) -> GuestPhase {
        self.phase
    }

    /// Assigned slot.
    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    /// Mirrored state.
    pub fn view(&self) -> &SimulationState {
        &self.view
    }

    /// Slot that reached the win score, once ended.
    pub fn winner(&self) -> Option<Slot> {
        self.view.scores.reached(self.config.win_score)
    }

    /// Run one frame: handle this tick's messages, then advance the phase.
    pub fn on_frame(
        &mut self,
        keys: &KeyState,
        messages: Vec<WireMessage>,
    ) -> Result<TickResult, SessionError> {
        for msg in messages {
            self.handle(msg);
        }

        match self.phase {
            GuestPhase::Connecting => {
                if self.sink.is_open() {
                    self.send_join();
                    self.set_phase(GuestPhase::WaitingForAssignment);
                } else {
                    self.wait(false)?;
                }
            }
            GuestPhase::WaitingForAssignment | GuestPhase::WaitingForStart => self.wait(true)?,
            GuestPhase::Synced => self.send_input(keys),
            GuestPhase::Ended => {}
        }

        let match_ended = self.phase == GuestPhase::Ended;
        Ok(TickResult {
            events: Vec::new(),
            match_ended,
            winner: if match_ended { self.winner() } else { None },
        })
    }

    /// Apply one inbound message.
    pub fn handle(&mut self, msg: WireMessage) {
        match msg {
            WireMessage::Assign(assign) => {
                if assign.guest_id != self.guest_id {
                    return;
                }
                match self.slot {
                    Some(slot) if slot != assign.slot => {
                        warn!(held = ?slot, offered = ?assign.slot, "Conflicting assignment ignored");
                    }
                    Some(_) => debug!("Duplicate assignment"),
                    None => {
                        info!(slot = ?assign.slot, "Assigned slot");
                        self.slot = Some(assign.slot);
                        if self.phase == GuestPhase::WaitingForAssignment {
                            self.set_phase(GuestPhase::WaitingForStart);
                        }
                    }
                }
            }
            WireMessage::Start(_) => {
                if self.phase == GuestPhase::WaitingForStart {
                    self.set_phase(GuestPhase::Synced);
                }
            }
            WireMessage::State(snapshot) => {
                if self.slot.is_none() {
                    // Not ours to mirror yet, but the layout is only sent early.
                    self.adopt_layout(&snapshot);
                    return;
                }
                if self.phase == GuestPhase::WaitingForStart {
                    debug!("State before start, treating as started");
                    self.set_phase(GuestPhase::Synced);
                }
                if let Err(e) = self.apply_state(&snapshot) {
                    warn!("Dropping snapshot: {}", e);
                }
            }
            WireMessage::Hello(hello) => {
                if hello.room == self.room && hello.mode != self.config.participants {
                    warn!(host = ?hello.mode, local = ?self.config.participants, "Host mode differs");
                }
            }
            other => debug!(kind = other.kind(), "Guest ignoring message"),
        }
    }

    /// Overwrite the view with a host snapshot.
    ///
    /// Applying the same snapshot any number of times leaves the same view.
    pub fn apply_state(&mut self, snapshot: &StateSnapshot) -> Result<(), ProtocolError> {
        let expected = self.view.paddles.len();
        if snapshot.paddles.len() != expected || snapshot.scores.len() != expected {
            return Err(ProtocolError::ShapeMismatch { got: snapshot.paddles.len(), expected });
        }

        self.view.tick = snapshot.tick;
        self.view.ball.position = Vec3::from_array(snapshot.ball.position);
        self.view.ball.velocity = Vec3::from_array(snapshot.ball.velocity);
        for (paddle, position) in self.view.paddles.iter_mut().zip(&snapshot.paddles) {
            paddle.position = Vec3::from_array(*position);
        }
        self.view.scores = ScoreVector::from_vec(snapshot.scores.clone());

        self.adopt_layout(snapshot);

        if self.phase != GuestPhase::Ended {
            if let Some(winner) = self.view.scores.reached(self.config.win_score) {
                info!(?winner, scores = ?self.view.scores.as_slice(), "Match over");
                self.set_phase(GuestPhase::Ended);
            }
        }
        Ok(())
    }

    /// Build obstacles from the first snapshot that carries them.
    fn adopt_layout(&mut self, snapshot: &StateSnapshot) {
        if self.obstacles_built {
            return;
        }
        if let Some(layout) = snapshot.obstacle_layout() {
            debug!(count = layout.len(), "Obstacle layout received");
            self.view.obstacles = layout;
            self.obstacles_built = true;
        }
    }

    fn wait(&mut self, resend: bool) -> Result<(), SessionError> {
        match self.timer.step() {
            TimerStep::Waiting => Ok(()),
            TimerStep::Retry(attempt) => {
                debug!(attempt, phase = self.phase.name(), "Still waiting");
                if resend {
                    self.send_join();
                }
                Ok(())
            }
            TimerStep::GiveUp(attempts) => {
                let phase = self.phase.name();
                warn!(attempts, phase, "Giving up");
                self.set_phase(GuestPhase::Ended);
                Err(SessionError::PhaseTimedOut { role: Role::Guest, phase, attempts })
            }
        }
    }

    fn send_join(&self) {
        send_or_log(
            self.sink.as_ref(),
            &WireMessage::Join(Join {
                room: self.room.clone(),
                guest_id: self.guest_id,
                token: self.token.clone(),
            }),
        );
    }

    fn send_input(&self, keys: &KeyState) {
        if let Some(slot) = self.slot {
            let frame = keys.binding(0);
            send_or_log(
                self.sink.as_ref(),
                &WireMessage::Input(InputRecord {
                    slot,
                    neg: frame.neg,
                    pos: frame.pos,
                    token: self.token.clone(),
                }),
            );
        }
    }

    fn set_phase(&mut self, phase: GuestPhase) {
        if self.phase != phase {
            info!(from = self.phase.name(), to = phase.name(), "Guest phase");
            self.phase = phase;
            self.view.phase = match phase {
                GuestPhase::Synced => MatchPhase::Running,
                GuestPhase::Ended => MatchPhase::Ended,
                _ => MatchPhase::Waiting,
            };
            self.timer.reset();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use crate::game::config::{ConnectionMode, ParticipantMode};
    use crate::game::input::InputFrame;
    use crate::network::mailbox::TransportError;
    use crate::network::protocol::{Assign, BallSnapshot, ObstacleSnapshot, Start};
    use crate::network::session::RetryPolicy;

    #[derive(Clone)]
    struct Recorder {
        sent: Arc<Mutex<Vec<WireMessage>>>,
        open: Arc<AtomicBool>,
    }

    impl Recorder {
        fn new(open: bool) -> Self {
            Self { sent: Arc::default(), open: Arc::new(AtomicBool::new(open)) }
        }

        fn take(&self) -> Vec<WireMessage> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    impl MessageSink for Recorder {
        fn send(&self, msg: &WireMessage) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(msg.clone());
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }
    }

    fn guest(participants: ParticipantMode, settings: SessionSettings) -> (GuestSession, Recorder) {
        let cfg = MatchConfig::new(participants, ConnectionMode::RemoteGuest).with_win_score(3);
        let rec = Recorder::new(true);
        let session = GuestSession::new(cfg, "room-1", Box::new(rec.clone()), settings).unwrap();
        (session, rec)
    }

    fn assign(guest: &GuestSession, slot: Slot) -> WireMessage {
        WireMessage::Assign(Assign { guest_id: guest.guest_id(), slot, token: None })
    }

    fn snapshot(scores: Vec<u32>, with_obstacles: bool) -> StateSnapshot {
        let paddles = (0..scores.len()).map(|i| [i as f32, 0.0, 1.5]).collect();
        StateSnapshot {
            tick: 42,
            ball: BallSnapshot { position: [1.0, 0.5, -2.0], velocity: [0.1, 0.0, 0.2] },
            paddles,
            scores,
            obstacles: with_obstacles.then(|| {
                vec![ObstacleSnapshot { position: [2.0, 0.0, 1.0], radius: 0.6 }]
            }),
            token: None,
        }
    }

    #[test]
    fn test_joins_once_connected() {
        let cfg = MatchConfig::new(ParticipantMode::Two, ConnectionMode::RemoteGuest);
        let rec = Recorder::new(false);
        let mut g = GuestSession::new(cfg, "room-1", Box::new(rec.clone()), SessionSettings::default())
            .unwrap();

        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        assert_eq!(g.phase(), GuestPhase::Connecting);
        assert!(rec.take().is_empty());

        rec.open.store(true, Ordering::SeqCst);
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        assert_eq!(g.phase(), GuestPhase::WaitingForAssignment);
        let sent = rec.take();
        assert!(matches!(&sent[..], [WireMessage::Join(j)] if j.guest_id == g.guest_id() && j.room == "room-1"));
    }

    #[test]
    fn test_handshake_to_synced_sends_input() {
        let (mut g, rec) = guest(ParticipantMode::Two, SessionSettings::default());
        g.on_frame(&KeyState::idle(), vec![]).unwrap();

        let msgs = vec![assign(&g, Slot::Right)];
        g.on_frame(&KeyState::idle(), msgs).unwrap();
        assert_eq!(g.phase(), GuestPhase::WaitingForStart);
        assert_eq!(g.slot(), Some(Slot::Right));

        g.on_frame(&KeyState::idle(), vec![WireMessage::Start(Start::default())]).unwrap();
        assert_eq!(g.phase(), GuestPhase::Synced);
        assert_eq!(g.view().phase, MatchPhase::Running);
        rec.take();

        g.on_frame(&KeyState::primary(InputFrame::new(true, false)), vec![]).unwrap();
        let sent = rec.take();
        assert!(matches!(&sent[..], [WireMessage::Input(r)] if r.slot == Slot::Right && r.neg && !r.pos));
    }

    #[test]
    fn test_assign_for_other_guest_ignored() {
        let (mut g, _rec) = guest(ParticipantMode::Four, SessionSettings::default());
        g.on_frame(&KeyState::idle(), vec![]).unwrap();

        let other = WireMessage::Assign(Assign { guest_id: Uuid::new_v4(), slot: Slot::Bottom, token: None });
        g.on_frame(&KeyState::idle(), vec![other]).unwrap();
        assert_eq!(g.slot(), None);
        assert_eq!(g.phase(), GuestPhase::WaitingForAssignment);
    }

    #[test]
    fn test_conflicting_assignment_keeps_first() {
        let (mut g, _rec) = guest(ParticipantMode::Four, SessionSettings::default());
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        let msgs = vec![assign(&g, Slot::Bottom), assign(&g, Slot::Top), assign(&g, Slot::Bottom)];
        g.on_frame(&KeyState::idle(), msgs).unwrap();
        assert_eq!(g.slot(), Some(Slot::Bottom));
    }

    #[test]
    fn test_state_implies_start() {
        let (mut g, _rec) = guest(ParticipantMode::Two, SessionSettings::default());
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        let msgs = vec![assign(&g, Slot::Right)];
        g.on_frame(&KeyState::idle(), msgs).unwrap();

        g.on_frame(&KeyState::idle(), vec![WireMessage::State(snapshot(vec![0, 1], false))])
            .unwrap();
        assert_eq!(g.phase(), GuestPhase::Synced);
        assert_eq!(g.view().scores.as_slice(), &[0, 1]);
    }

    #[test]
    fn test_state_before_assignment_only_keeps_layout() {
        let (mut g, _rec) = guest(ParticipantMode::Two, SessionSettings::default());
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        g.on_frame(&KeyState::idle(), vec![WireMessage::State(snapshot(vec![2, 1], true))])
            .unwrap();
        assert_eq!(g.view().scores.as_slice(), &[0, 0]);
        assert_eq!(g.view().obstacles.len(), 1);
        assert_eq!(g.phase(), GuestPhase::WaitingForAssignment);
    }

    #[test]
    fn test_apply_state_is_idempotent() {
        let (mut g, _rec) = guest(ParticipantMode::Two, SessionSettings::default());
        let snap = snapshot(vec![1, 2], true);

        g.apply_state(&snap).unwrap();
        let once = (g.view().ball, g.view().paddles.clone(), g.view().scores.clone(), g.view().obstacles.clone());
        g.apply_state(&snap).unwrap();
        g.apply_state(&snap).unwrap();
        let thrice = (g.view().ball, g.view().paddles.clone(), g.view().scores.clone(), g.view().obstacles.clone());

        assert_eq!(once, thrice);
        assert_eq!(g.view().ball.position, Vec3::new(1.0, 0.5, -2.0));
        assert_eq!(g.view().paddles[1].position, Vec3::new(1.0, 0.0, 1.5));
        assert_eq!(g.view().tick, 42);
    }

    #[test]
    fn test_obstacles_built_once() {
        let (mut g, _rec) = guest(ParticipantMode::Two, SessionSettings::default());
        g.apply_state(&snapshot(vec![0, 0], true)).unwrap();
        assert_eq!(g.view().obstacles.len(), 1);

        let mut moved = snapshot(vec![0, 0], true);
        moved.obstacles = Some(vec![]);
        g.apply_state(&moved).unwrap();
        assert_eq!(g.view().obstacles.len(), 1);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let (mut g, _rec) = guest(ParticipantMode::Two, SessionSettings::default());
        let err = g.apply_state(&snapshot(vec![0, 0, 0, 0], false)).unwrap_err();
        assert!(matches!(err, ProtocolError::ShapeMismatch { got: 4, expected: 2 }));
        assert_eq!(g.view().scores.as_slice(), &[0, 0]);
    }

    #[test]
    fn test_ends_at_win_score() {
        let (mut g, rec) = guest(ParticipantMode::Two, SessionSettings::default());
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        let msgs = vec![assign(&g, Slot::Right), WireMessage::Start(Start::default())];
        g.on_frame(&KeyState::idle(), msgs).unwrap();
        rec.take();

        let result = g
            .on_frame(&KeyState::idle(), vec![WireMessage::State(snapshot(vec![3, 1], false))])
            .unwrap();
        assert!(result.match_ended);
        assert_eq!(result.winner, Some(Slot::Left));
        assert_eq!(g.phase(), GuestPhase::Ended);
        // No input once ended
        assert!(rec.take().is_empty());
    }

    #[test]
    fn test_retries_join_then_gives_up() {
        let settings = SessionSettings {
            retry: RetryPolicy {
                initial_timeout_ticks: 2,
                backoff_factor: 1,
                max_timeout_ticks: 2,
                max_attempts: Some(1),
            },
            ..SessionSettings::default()
        };
        let (mut g, rec) = guest(ParticipantMode::Two, settings);
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        assert_eq!(rec.take().len(), 1);

        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        let resent = rec.take();
        assert!(matches!(&resent[..], [WireMessage::Join(j)] if j.guest_id == g.guest_id()));

        g.on_frame(&KeyState::idle(), vec![]).unwrap();
        let err = g.on_frame(&KeyState::idle(), vec![]).unwrap_err();
        assert!(matches!(
            err,
            SessionError::PhaseTimedOut { role: Role::Guest, phase: "WaitingForAssignment", attempts: 1 }
        ));
        assert_eq!(g.phase(), GuestPhase::Ended);
    }
}
