//! Host Session
//!
//! The authoritative side of a networked match. Owns the `MatchController`,
//! hands out slots to joining guests, starts the match once every remote slot
//! is filled, folds guest input into the per-slot input table, and broadcasts
//! throttled state snapshots.
//!
//! Phases: `WaitingForGuests -> MatchReady -> Running -> Ended`.

use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::config::MatchConfig;
use crate::game::events::GameEvent;
use crate::game::input::{InputTable, KeyState};
use crate::game::state::{MatchPhase, SimulationState, Slot};
use crate::game::tick::{MatchController, TickResult};
use crate::network::mailbox::{send_or_log, MessageSink};
use crate::network::protocol::{Assign, Hello, InputRecord, Join, Start, StateSnapshot, WireMessage};
use crate::network::session::{
    BroadcastGate, PhaseTimer, Role, SessionError, SessionSettings, TimerStep,
};

/// Host lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// Announced, collecting guests.
    WaitingForGuests,
    /// Every remote slot assigned; starts on the next frame.
    MatchReady,
    /// Simulating and broadcasting.
    Running,
    /// Match over (or waiting gave up).
    Ended,
}

impl HostPhase {
    fn name(self) -> &'static str {
        match self {
            HostPhase::WaitingForGuests => "WaitingForGuests",
            HostPhase::MatchReady => "MatchReady",
            HostPhase::Running => "Running",
            HostPhase::Ended => "Ended",
        }
    }
}

/// Authoritative networked session.
pub struct HostSession {
    room: String,
    phase: HostPhase,
    controller: MatchController,
    guests: BTreeMap<Uuid, Slot>,
    inputs: InputTable,
    sink: Box<dyn MessageSink>,
    settings: SessionSettings,
    timer: PhaseTimer,
    gate: BroadcastGate,
    obstacle_broadcasts_left: u32,
    final_broadcasts_left: u32,
    token: Option<String>,
}

impl HostSession {
    /// Create the session and announce the room.
    pub fn new(
        config: MatchConfig,
        room: impl Into<String>,
        sink: Box<dyn MessageSink>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        let token = config.session_token.clone();
        let controller = MatchController::new(config)?;

        let session = Self {
            room: room.into(),
            phase: HostPhase::WaitingForGuests,
            controller,
            guests: BTreeMap::new(),
            inputs: InputTable::new(),
            sink,
            timer: PhaseTimer::new(settings.retry.clone()),
            gate: BroadcastGate::new(settings.broadcast_interval),
            obstacle_broadcasts_left: settings.obstacle_broadcasts,
            final_broadcasts_left: 0,
            settings,
            token,
        };

        info!(
            room = %session.room,
            required = session.required_guests(),
            "Hosting match"
        );
        session.announce();
        Ok(session)
    }

    /// Current phase.
    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    /// Guests holding a slot.
    pub fn connected_guests(&self) -> usize {
        self.guests.len()
    }

    /// Guests needed before the match can start.
    pub fn required_guests(&self) -> usize {
        self.controller.config().required_guests()
    }

    /// Slot held by a guest.
    pub fn guest_slot(&self, guest_id: &Uuid) -> Option<Slot> {
        self.guests.get(guest_id).copied()
    }

    /// Authoritative state.
    pub fn state(&self) -> &SimulationState {
        self.controller.state()
    }

    /// The match controller.
    pub fn controller(&self) -> &MatchController {
        &self.controller
    }

    /// Run one frame: handle this tick's messages, then advance the phase.
    pub fn on_frame(
        &mut self,
        keys: &KeyState,
        messages: Vec<WireMessage>,
        now: Instant,
    ) -> Result<TickResult, SessionError> {
        // Start one frame after the last assignment so the assign goes out first.
        let ready_at_start = self.phase == HostPhase::MatchReady;
        for msg in messages {
            self.handle(msg);
        }

        match self.phase {
            HostPhase::WaitingForGuests => {
                self.wait_for_guests()?;
                Ok(TickResult::default())
            }
            HostPhase::MatchReady if !ready_at_start => Ok(TickResult::default()),
            HostPhase::MatchReady => {
                let events = self.begin(now);
                Ok(TickResult { events, ..TickResult::default() })
            }
            HostPhase::Running => Ok(self.run(keys, now)),
            HostPhase::Ended => {
                let result = self.controller.tick(keys, Some(&self.inputs));
                self.repeat_final_state(now);
                Ok(result)
            }
        }
    }

    /// Apply one inbound message.
    pub fn handle(&mut self, msg: WireMessage) {
        match msg {
            WireMessage::Join(join) => self.on_join(join),
            WireMessage::Input(input) => self.on_input(input),
            WireMessage::Hello(hello) if hello.room == self.room => {
                warn!(room = %self.room, "Another host announced this room");
            }
            other => debug!(kind = other.kind(), "Host ignoring message"),
        }
    }

    fn on_join(&mut self, join: Join) {
        if join.room != self.room {
            debug!(room = %join.room, "Join for another room");
            return;
        }

        if let Some(slot) = self.guests.get(&join.guest_id).copied() {
            // Duplicate or retried join: repeat what the guest missed.
            debug!(guest = %join.guest_id, ?slot, "Re-sending assignment");
            self.send_assign(join.guest_id, slot);
            if matches!(self.phase, HostPhase::Running | HostPhase::Ended) {
                self.send(&WireMessage::Start(Start { token: self.token.clone() }));
                self.obstacle_broadcasts_left = self.settings.obstacle_broadcasts;
            }
            if self.controller.phase() == MatchPhase::Ended {
                self.final_broadcasts_left = self.settings.final_broadcasts;
            }
            return;
        }

        if self.guests.len() >= self.required_guests() {
            warn!(guest = %join.guest_id, "Room full, ignoring join");
            return;
        }

        let slots = self.controller.config().participants.slots();
        let slot = slots[self.guests.len() + 1];
        self.guests.insert(join.guest_id, slot);
        info!(
            guest = %join.guest_id,
            ?slot,
            connected = self.guests.len(),
            required = self.required_guests(),
            "Guest joined"
        );
        self.send_assign(join.guest_id, slot);

        if self.phase == HostPhase::WaitingForGuests && self.guests.len() == self.required_guests() {
            self.set_phase(HostPhase::MatchReady);
        }
    }

    fn on_input(&mut self, input: InputRecord) {
        if self.guests.values().any(|s| *s == input.slot) {
            self.inputs.apply(input.slot, input.frame());
        } else {
            debug!(slot = ?input.slot, "Input for unassigned slot");
        }
    }

    fn wait_for_guests(&mut self) -> Result<(), SessionError> {
        match self.timer.step() {
            TimerStep::Waiting => Ok(()),
            TimerStep::Retry(attempt) => {
                debug!(attempt, connected = self.guests.len(), "Re-announcing room");
                self.announce();
                Ok(())
            }
            TimerStep::GiveUp(attempts) => {
                warn!(attempts, "No guests, giving up");
                self.set_phase(HostPhase::Ended);
                Err(SessionError::PhaseTimedOut {
                    role: Role::Host,
                    phase: HostPhase::WaitingForGuests.name(),
                    attempts,
                })
            }
        }
    }

    fn begin(&mut self, now: Instant) -> Vec<GameEvent> {
        self.send(&WireMessage::Start(Start { token: self.token.clone() }));
        let events = self.controller.start();
        self.set_phase(HostPhase::Running);
        self.broadcast(now);
        events
    }

    fn run(&mut self, keys: &KeyState, now: Instant) -> TickResult {
        let result = self.controller.tick(keys, Some(&self.inputs));

        if result.match_ended {
            // Final scores go out regardless of the rate gate, then repeat
            // through it so a lost snapshot still ends every guest.
            self.broadcast(now);
            self.final_broadcasts_left = self.settings.final_broadcasts;
            self.set_phase(HostPhase::Ended);
        } else if self.gate.ready(now) {
            self.send_state();
        }
        result
    }

    fn repeat_final_state(&mut self, now: Instant) {
        if self.final_broadcasts_left > 0 && self.gate.ready(now) {
            self.final_broadcasts_left -= 1;
            self.send_state();
        }
    }

    fn broadcast(&mut self, now: Instant) {
        self.gate.mark(now);
        self.send_state();
    }

    fn send_state(&mut self) {
        let include_obstacles = self.obstacle_broadcasts_left > 0;
        self.obstacle_broadcasts_left = self.obstacle_broadcasts_left.saturating_sub(1);
        let snapshot = StateSnapshot::capture(self.controller.state(), include_obstacles, self.token.clone());
        self.send(&WireMessage::State(snapshot));
    }

    fn send_assign(&self, guest_id: Uuid, slot: Slot) {
        self.send(&WireMessage::Assign(Assign { guest_id, slot, token: self.token.clone() }));
    }

    fn announce(&self) {
        self.send(&WireMessage::Hello(Hello {
            room: self.room.clone(),
            mode: self.controller.config().participants,
            token: self.token.clone(),
        }));
    }

    fn send(&self, msg: &WireMessage) {
        send_or_log(self.sink.as_ref(), msg);
    }

    fn set_phase(&mut self, phase: HostPhase) {
        if self.phase != phase {
            info!(from = self.phase.name(), to = phase.name(), "Host phase");
            self.phase = phase;
            self.timer.reset();
        }
    }

    /// Session settings.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use crate::core::vec3::Vec3;
    use crate::game::config::{ConnectionMode, ParticipantMode};
    use crate::network::guest::{GuestPhase, GuestSession};
    use crate::network::mailbox::TransportError;
    use crate::network::session::RetryPolicy;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<WireMessage>>>);

    impl Recorder {
        fn take(&self) -> Vec<WireMessage> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl MessageSink for Recorder {
        fn send(&self, msg: &WireMessage) -> Result<(), TransportError> {
            self.0.lock().unwrap().push(msg.clone());
            Ok(())
        }
    }

    fn host(participants: ParticipantMode, settings: SessionSettings) -> (HostSession, Recorder) {
        let cfg = MatchConfig::new(participants, ConnectionMode::RemoteHost)
            .with_seed(77)
            .with_obstacles(2);
        let rec = Recorder::default();
        let session = HostSession::new(cfg, "room-1", Box::new(rec.clone()), settings).unwrap();
        (session, rec)
    }

    fn join(guest: Uuid) -> WireMessage {
        WireMessage::Join(Join { room: "room-1".into(), guest_id: guest, token: None })
    }

    fn input(slot: Slot, neg: bool, pos: bool) -> WireMessage {
        WireMessage::Input(InputRecord { slot, neg, pos, token: None })
    }

    fn assigns(msgs: &[WireMessage]) -> Vec<(Uuid, Slot)> {
        msgs.iter()
            .filter_map(|m| match m {
                WireMessage::Assign(a) => Some((a.guest_id, a.slot)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_announces_on_create() {
        let (_host, rec) = host(ParticipantMode::Two, SessionSettings::default());
        let sent = rec.take();
        assert!(matches!(&sent[..], [WireMessage::Hello(h)] if h.room == "room-1" && h.mode == ParticipantMode::Two));
    }

    #[test]
    fn test_surplus_joins_are_clamped() {
        let (mut host, rec) = host(ParticipantMode::Two, SessionSettings::default());
        rec.take();
        let now = Instant::now();
        let guests: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        host.on_frame(&KeyState::idle(), guests.iter().map(|g| join(*g)).collect(), now)
            .unwrap();

        assert_eq!(host.connected_guests(), 1);
        assert_eq!(host.required_guests(), 1);
        assert_eq!(host.guest_slot(&guests[0]), Some(Slot::Right));
        assert_eq!(host.guest_slot(&guests[1]), None);
        assert_eq!(assigns(&rec.take()), vec![(guests[0], Slot::Right)]);

        // More joins while running change nothing
        host.on_frame(&KeyState::idle(), vec![join(Uuid::new_v4())], now).unwrap();
        assert_eq!(host.connected_guests(), 1);
    }

    #[test]
    fn test_four_player_assigns_slots_in_order() {
        let (mut host, rec) = host(ParticipantMode::Four, SessionSettings::default());
        rec.take();
        let guests: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        host.on_frame(&KeyState::idle(), vec![join(guests[0]), join(guests[1])], Instant::now())
            .unwrap();
        assert_eq!(host.phase(), HostPhase::WaitingForGuests);

        host.on_frame(&KeyState::idle(), vec![join(guests[2])], Instant::now()).unwrap();
        assert_eq!(host.phase(), HostPhase::MatchReady);
        assert_eq!(
            assigns(&rec.take()),
            vec![(guests[0], Slot::Right), (guests[1], Slot::Bottom), (guests[2], Slot::Top)]
        );
    }

    #[test]
    fn test_duplicate_join_resends_same_slot() {
        let (mut host, rec) = host(ParticipantMode::Four, SessionSettings::default());
        rec.take();
        let guest = Uuid::new_v4();

        host.on_frame(&KeyState::idle(), vec![join(guest), join(guest), join(guest)], Instant::now())
            .unwrap();

        assert_eq!(host.connected_guests(), 1);
        assert_eq!(assigns(&rec.take()), vec![(guest, Slot::Right); 3]);
    }

    #[test]
    fn test_join_for_other_room_ignored() {
        let (mut host, _rec) = host(ParticipantMode::Two, SessionSettings::default());
        let msg = WireMessage::Join(Join { room: "elsewhere".into(), guest_id: Uuid::new_v4(), token: None });
        host.on_frame(&KeyState::idle(), vec![msg], Instant::now()).unwrap();
        assert_eq!(host.connected_guests(), 0);
    }

    #[test]
    fn test_start_broadcasts_state_with_obstacles() {
        let (mut host, rec) = host(ParticipantMode::Two, SessionSettings::default());
        let now = Instant::now();
        host.on_frame(&KeyState::idle(), vec![join(Uuid::new_v4())], now).unwrap();
        assert_eq!(host.phase(), HostPhase::MatchReady);
        rec.take();

        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        assert_eq!(host.phase(), HostPhase::Running);

        let sent = rec.take();
        assert!(matches!(sent[0], WireMessage::Start(_)));
        match &sent[1] {
            WireMessage::State(s) => {
                assert_eq!(s.paddles.len(), 2);
                assert!(s.obstacles.is_some());
            }
            other => panic!("Expected state, got {:?}", other),
        }
    }

    #[test]
    fn test_broadcasts_are_throttled() {
        let (mut host, rec) = host(ParticipantMode::Two, SessionSettings::default());
        let start = Instant::now();
        host.on_frame(&KeyState::idle(), vec![join(Uuid::new_v4())], start).unwrap();
        host.on_frame(&KeyState::idle(), vec![], start).unwrap();
        rec.take();

        let frame = Duration::from_micros(16_667);
        for i in 1..=60u32 {
            host.on_frame(&KeyState::idle(), vec![], start + frame * i).unwrap();
        }
        let states = rec
            .take()
            .into_iter()
            .filter(|m| matches!(m, WireMessage::State(_)))
            .count();
        assert!((28..=31).contains(&states), "sent {} states", states);
    }

    #[test]
    fn test_obstacles_only_in_first_broadcasts() {
        let settings = SessionSettings {
            obstacle_broadcasts: 2,
            broadcast_interval: Duration::ZERO,
            ..SessionSettings::default()
        };
        let (mut host, rec) = host(ParticipantMode::Two, settings);
        let now = Instant::now();
        host.on_frame(&KeyState::idle(), vec![join(Uuid::new_v4())], now).unwrap();
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        for _ in 0..3 {
            host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        }
        let with_layout: Vec<bool> = rec
            .take()
            .into_iter()
            .filter_map(|m| match m {
                WireMessage::State(s) => Some(s.obstacles.is_some()),
                _ => None,
            })
            .collect();
        assert_eq!(with_layout, vec![true, true, false, false]);
    }

    #[test]
    fn test_top_input_mirrors_bottom() {
        let (mut host, _rec) = host(ParticipantMode::Four, SessionSettings::default());
        let now = Instant::now();
        let guests: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        host.on_frame(&KeyState::idle(), guests.iter().map(|g| join(*g)).collect(), now)
            .unwrap();
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        assert_eq!(host.phase(), HostPhase::Running);

        let before_bottom = host.state().paddle(Slot::Bottom).unwrap().axis_position();
        let before_top = host.state().paddle(Slot::Top).unwrap().axis_position();

        host.on_frame(
            &KeyState::idle(),
            vec![input(Slot::Bottom, true, false), input(Slot::Top, true, false)],
            now,
        )
        .unwrap();

        let moved_bottom = host.state().paddle(Slot::Bottom).unwrap().axis_position() - before_bottom;
        let moved_top = host.state().paddle(Slot::Top).unwrap().axis_position() - before_top;
        assert!(moved_bottom != 0.0);
        assert_eq!(moved_top, -moved_bottom);
    }

    #[test]
    fn test_input_is_last_write_wins_and_sticky() {
        let (mut host, _rec) = host(ParticipantMode::Two, SessionSettings::default());
        let now = Instant::now();
        host.on_frame(&KeyState::idle(), vec![join(Uuid::new_v4())], now).unwrap();
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();

        let start = host.state().paddle(Slot::Right).unwrap().axis_position();
        host.on_frame(
            &KeyState::idle(),
            vec![input(Slot::Right, true, false), input(Slot::Right, false, true)],
            now,
        )
        .unwrap();
        // Lost frames reuse the latest snapshot
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();

        let step = host.controller().config().params.paddle_step;
        let moved = host.state().paddle(Slot::Right).unwrap().axis_position() - start;
        assert!((moved - 2.0 * step).abs() < 1e-5);
    }

    #[test]
    fn test_input_for_local_slot_ignored() {
        let (mut host, _rec) = host(ParticipantMode::Two, SessionSettings::default());
        let now = Instant::now();
        host.on_frame(&KeyState::idle(), vec![join(Uuid::new_v4())], now).unwrap();
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();

        host.on_frame(&KeyState::idle(), vec![input(Slot::Left, false, true)], now).unwrap();
        assert_eq!(host.state().paddle(Slot::Left).unwrap().axis_position(), 0.0);
    }

    #[test]
    fn test_reannounce_and_give_up() {
        let settings = SessionSettings {
            retry: RetryPolicy {
                initial_timeout_ticks: 2,
                backoff_factor: 1,
                max_timeout_ticks: 2,
                max_attempts: Some(1),
            },
            ..SessionSettings::default()
        };
        let (mut host, rec) = host(ParticipantMode::Two, settings);
        rec.take();
        let now = Instant::now();

        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        assert!(matches!(&rec.take()[..], [WireMessage::Hello(_)]));

        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        let err = host.on_frame(&KeyState::idle(), vec![], now).unwrap_err();
        assert!(matches!(err, SessionError::PhaseTimedOut { role: Role::Host, attempts: 1, .. }));
        assert_eq!(host.phase(), HostPhase::Ended);
    }

    /// A 2P host with one guest, running, one goal from the end.
    fn one_point_match() -> (HostSession, Recorder, GuestSession, Recorder, Instant) {
        let cfg = MatchConfig::new(ParticipantMode::Two, ConnectionMode::RemoteHost)
            .with_seed(5)
            .with_obstacles(0)
            .with_win_score(1);
        let rec = Recorder::default();
        let mut host = HostSession::new(cfg, "room-1", Box::new(rec.clone()), SessionSettings::default())
            .unwrap();

        let guest_cfg = MatchConfig::new(ParticipantMode::Two, ConnectionMode::RemoteGuest).with_win_score(1);
        let guest_rec = Recorder::default();
        let mut guest = GuestSession::new(
            guest_cfg,
            "room-1",
            Box::new(guest_rec.clone()),
            SessionSettings::default(),
        )
        .unwrap();

        let now = Instant::now();
        guest.on_frame(&KeyState::idle(), vec![]).unwrap();
        host.on_frame(&KeyState::idle(), guest_rec.take(), now).unwrap();
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        assert_eq!(host.phase(), HostPhase::Running);
        guest.on_frame(&KeyState::idle(), rec.take()).unwrap();
        assert_eq!(guest.phase(), GuestPhase::Synced);
        guest_rec.take();

        let state = host.controller.state_mut();
        state.rally.paddle_hit(Slot::Left);
        state.ball.position = Vec3::new(9.9, 1.0, 0.0);
        state.ball.velocity = Vec3::horizontal(0.3, 0.0);

        (host, rec, guest, guest_rec, now)
    }

    fn states(msgs: &[WireMessage]) -> Vec<&StateSnapshot> {
        msgs.iter()
            .filter_map(|m| match m {
                WireMessage::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_lost_final_state_is_repeated() {
        let (mut host, rec, mut guest, guest_rec, mut now) = one_point_match();
        let frame = Duration::from_micros(16_667);

        now += frame;
        let result = host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        assert!(result.match_ended);
        assert_eq!(host.phase(), HostPhase::Ended);
        // The winning snapshot never arrives
        assert_eq!(states(&rec.take()).len(), 1);

        for _ in 0..4 {
            now += frame;
            host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        }
        let repeated = rec.take();
        assert!(!states(&repeated).is_empty());
        assert!(states(&repeated).iter().all(|s| s.scores == vec![1, 0]));

        guest.on_frame(&KeyState::idle(), repeated).unwrap();
        assert_eq!(guest.phase(), GuestPhase::Ended);
        assert_eq!(guest.view().scores.as_slice(), &[1, 0]);
        assert_eq!(guest.winner(), Some(Slot::Left));

        // An ended guest stops sending input
        guest.on_frame(&KeyState::idle(), vec![]).unwrap();
        assert!(guest_rec.take().is_empty());
    }

    #[test]
    fn test_final_state_repeats_are_bounded_and_throttled() {
        let (mut host, rec, _guest, _guest_rec, mut now) = one_point_match();
        let frame = Duration::from_micros(16_667);
        let limit = host.settings().final_broadcasts as usize;

        for _ in 0..limit * 4 {
            now += frame;
            host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        }
        // One immediate final snapshot, then the repeats
        assert_eq!(states(&rec.take()).len(), 1 + limit);

        for _ in 0..10 {
            now += frame;
            host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        }
        assert!(rec.take().is_empty());
    }

    #[test]
    fn test_rejoin_after_end_gets_final_state() {
        let (mut host, rec, mut guest, guest_rec, mut now) = one_point_match();
        let frame = Duration::from_micros(16_667);
        let limit = host.settings().final_broadcasts;

        for _ in 0..limit * 4 {
            now += frame;
            host.on_frame(&KeyState::idle(), vec![], now).unwrap();
        }
        assert_eq!(host.phase(), HostPhase::Ended);
        rec.take();

        let rejoin = WireMessage::Join(Join { room: "room-1".into(), guest_id: guest.guest_id(), token: None });
        now += frame;
        host.on_frame(&KeyState::idle(), vec![rejoin], now).unwrap();
        now += frame * 2;
        host.on_frame(&KeyState::idle(), vec![], now).unwrap();

        let sent = rec.take();
        assert!(sent.iter().any(|m| matches!(m, WireMessage::Start(_))));
        assert!(states(&sent).iter().any(|s| s.scores == vec![1, 0]));

        guest.on_frame(&KeyState::idle(), sent).unwrap();
        assert_eq!(guest.phase(), GuestPhase::Ended);
        assert!(guest_rec.take().is_empty());
    }
}
