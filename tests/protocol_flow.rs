//! Host and guests talking over an in-memory relay that loses and duplicates
//! messages.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use arena_pong::game::config::{ConnectionMode, MatchConfig, ParticipantMode};
use arena_pong::game::input::{InputFrame, KeyState};
use arena_pong::game::state::{MatchPhase, Slot};
use arena_pong::network::guest::{GuestPhase, GuestSession};
use arena_pong::network::host::{HostPhase, HostSession};
use arena_pong::network::mailbox::{Inbox, LoopbackHub, LoopbackSink, MessageSink, TransportError};
use arena_pong::network::protocol::WireMessage;
use arena_pong::network::session::SessionSettings;

/// Drops every `drop_every`-th send and sends every `dup_every`-th twice.
struct Flaky {
    inner: LoopbackSink,
    sent: AtomicUsize,
    drop_every: usize,
    dup_every: usize,
}

impl Flaky {
    fn new(inner: LoopbackSink, drop_every: usize, dup_every: usize) -> Self {
        Self { inner, sent: AtomicUsize::new(0), drop_every, dup_every }
    }
}

impl MessageSink for Flaky {
    fn send(&self, msg: &WireMessage) -> Result<(), TransportError> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.drop_every == 0 {
            return Ok(());
        }
        self.inner.send(msg)?;
        if n % self.dup_every == 0 {
            self.inner.send(msg)?;
        }
        Ok(())
    }
}

struct Table {
    host: HostSession,
    host_inbox: Inbox,
    guests: Vec<(GuestSession, Inbox)>,
    now: Instant,
}

impl Table {
    fn new(participants: ParticipantMode) -> Self {
        let hub = LoopbackHub::new();
        let (host_sink, host_inbox) = hub.join();
        let host_cfg = MatchConfig::new(participants, ConnectionMode::RemoteHost)
            .with_seed(2024)
            .with_win_score(50);
        let host = HostSession::new(
            host_cfg,
            "arena",
            Box::new(Flaky::new(host_sink, 3, 2)),
            SessionSettings::default(),
        )
        .unwrap();

        let guests = (0..participants.slot_count() - 1)
            .map(|_| {
                let (sink, inbox) = hub.join();
                let cfg = MatchConfig::new(participants, ConnectionMode::RemoteGuest).with_win_score(50);
                let guest = GuestSession::new(
                    cfg,
                    "arena",
                    Box::new(Flaky::new(sink, 4, 3)),
                    SessionSettings::default(),
                )
                .unwrap();
                (guest, inbox)
            })
            .collect();

        Self { host, host_inbox, guests, now: Instant::now() }
    }

    fn frame(&mut self, guest_keys: &KeyState) {
        for (guest, inbox) in self.guests.iter_mut() {
            guest.on_frame(guest_keys, inbox.drain()).unwrap();
        }
        self.host
            .on_frame(&KeyState::idle(), self.host_inbox.drain(), self.now)
            .unwrap();
        self.now += Duration::from_micros(16_667);
    }

    fn all_synced(&self) -> bool {
        self.host.phase() == HostPhase::Running
            && self.guests.iter().all(|(g, _)| g.phase() == GuestPhase::Synced)
    }

    fn run_until_synced(&mut self, max_frames: usize) {
        for _ in 0..max_frames {
            if self.all_synced() && self.guests.iter().all(|(g, _)| g.view().tick > 0) {
                return;
            }
            self.frame(&KeyState::idle());
        }
        panic!(
            "Not synced: host {:?}, guests {:?}",
            self.host.phase(),
            self.guests.iter().map(|(g, _)| g.phase()).collect::<Vec<_>>()
        );
    }
}

#[test]
fn two_player_handshake_survives_loss() {
    let mut table = Table::new(ParticipantMode::Two);
    table.run_until_synced(2000);

    assert_eq!(table.host.connected_guests(), 1);
    assert_eq!(table.guests[0].0.slot(), Some(Slot::Right));
    assert_eq!(table.guests[0].0.view().phase, MatchPhase::Running);
}

#[test]
fn four_player_guests_get_distinct_slots_and_layout() {
    let mut table = Table::new(ParticipantMode::Four);
    table.run_until_synced(5000);

    assert_eq!(table.host.connected_guests(), 3);
    let slots: BTreeSet<Slot> = table.guests.iter().filter_map(|(g, _)| g.slot()).collect();
    let expected: BTreeSet<Slot> = [Slot::Right, Slot::Bottom, Slot::Top].into_iter().collect();
    assert_eq!(slots, expected);

    // Keep running long enough for a layout broadcast to land everywhere
    for _ in 0..120 {
        table.frame(&KeyState::idle());
    }
    for (guest, _) in &table.guests {
        assert_eq!(guest.view().obstacles, table.host.state().obstacles);
    }
}

#[test]
fn guest_views_track_host_ticks() {
    let mut table = Table::new(ParticipantMode::Two);
    table.run_until_synced(2000);

    for _ in 0..1200 {
        table.frame(&KeyState::idle());
    }
    let host_tick = table.host.state().tick;
    for (guest, _) in &table.guests {
        assert!(guest.view().tick <= host_tick);
        assert!(host_tick - guest.view().tick < 30);
        assert_eq!(guest.view().scores.as_slice().len(), 2);
    }
}

#[test]
fn guest_input_moves_its_paddle_on_host() {
    let mut table = Table::new(ParticipantMode::Four);
    table.run_until_synced(5000);

    let before: Vec<(Slot, f32)> = table
        .guests
        .iter()
        .filter_map(|(g, _)| g.slot())
        .map(|s| (s, table.host.state().paddle(s).unwrap().axis_position()))
        .collect();

    let keys = KeyState::primary(InputFrame::new(false, true));
    for _ in 0..10 {
        table.frame(&keys);
    }

    for (slot, start) in before {
        let now = table.host.state().paddle(slot).unwrap().axis_position();
        assert!(now != start, "{:?} did not move", slot);
    }
    // The host's own paddle stayed put
    assert_eq!(table.host.state().paddle(Slot::Left).unwrap().axis_position(), 0.0);
}
