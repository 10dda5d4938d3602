//! Match Runner
//!
//! Picks local, host or guest behaviour from a `MatchConfig` and drives one
//! rendered frame at a time:
//!
//! 1. drain the mailbox (networked modes)
//! 2. tick the simulation, or apply host snapshots on a guest
//! 3. broadcast or send input
//! 4. hand the current view to the `FrameSink`
//!
//! A networked connection mode without an endpoint falls back to a local
//! match against AI paddles.

use std::time::Instant;
use tracing::warn;

use crate::game::config::{ConnectionMode, MatchConfig};
use crate::game::events::GameEvent;
use crate::game::input::KeyState;
use crate::game::state::{MatchPhase, SimulationState, Slot};
use crate::game::tick::{MatchController, TickResult};
use crate::network::guest::GuestSession;
use crate::network::host::HostSession;
use crate::network::mailbox::Inbox;
use crate::network::session::{SessionError, SessionSettings};
use crate::network::transport::NetLink;

/// Rendering collaborator: receives the state to draw after every frame.
pub trait FrameSink {
    /// Present one frame.
    fn present(&mut self, state: &SimulationState, events: &[GameEvent]);
}

/// A `FrameSink` that draws nothing.
#[derive(Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _state: &SimulationState, _events: &[GameEvent]) {}
}

/// One running match, in whichever role the config selects.
pub enum MatchRunner {
    /// Everything simulated locally.
    Local(MatchController),
    /// Authoritative networked host.
    Host {
        /// Host state machine.
        session: HostSession,
        /// Inbound messages.
        inbox: Inbox,
    },
    /// Render-only networked guest.
    Guest {
        /// Guest state machine.
        session: GuestSession,
        /// Inbound messages.
        inbox: Inbox,
    },
}

impl MatchRunner {
    /// Build the runner for `config`.
    ///
    /// Networked modes use `link` when given, otherwise they connect to the
    /// configured endpoint over WebSocket. That connection needs a running
    /// tokio runtime and fails with `SessionError::Transport` without one.
    pub fn new(
        mut config: MatchConfig,
        link: Option<NetLink>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        if config.connection.is_networked() && config.network.is_none() {
            warn!(connection = ?config.connection, "No network endpoint, playing locally");
            config.connection = ConnectionMode::AiOpponent;
        }

        let endpoint = config.network.clone();
        match (config.connection, endpoint) {
            (ConnectionMode::Local | ConnectionMode::AiOpponent, _) => {
                Ok(MatchRunner::Local(MatchController::new(config)?))
            }
            (ConnectionMode::RemoteHost, Some(endpoint)) => {
                let link = match link {
                    Some(link) => link,
                    None => NetLink::websocket(endpoint.url.as_str())?,
                };
                let session = HostSession::new(config, endpoint.room, link.sink, settings)?;
                Ok(MatchRunner::Host { session, inbox: link.inbox })
            }
            (ConnectionMode::RemoteGuest, Some(endpoint)) => {
                let link = match link {
                    Some(link) => link,
                    None => NetLink::websocket(endpoint.url.as_str())?,
                };
                let session = GuestSession::new(config, endpoint.room, link.sink, settings)?;
                Ok(MatchRunner::Guest { session, inbox: link.inbox })
            }
            (ConnectionMode::RemoteHost | ConnectionMode::RemoteGuest, None) => {
                // Rewritten to AiOpponent above.
                Ok(MatchRunner::Local(MatchController::new(config)?))
            }
        }
    }

    /// Run one frame.
    pub fn frame(&mut self, keys: &KeyState, now: Instant) -> Result<TickResult, SessionError> {
        match self {
            MatchRunner::Local(controller) => {
                let mut served = Vec::new();
                if controller.phase() == MatchPhase::Waiting {
                    served = controller.start();
                }
                let mut result = controller.tick(keys, None);
                if !served.is_empty() {
                    served.append(&mut result.events);
                    result.events = served;
                }
                Ok(result)
            }
            MatchRunner::Host { session, inbox } => session.on_frame(keys, inbox.drain(), now),
            MatchRunner::Guest { session, inbox } => session.on_frame(keys, inbox.drain()),
        }
    }

    /// Run one frame and present the result.
    pub fn run_frame(
        &mut self,
        keys: &KeyState,
        now: Instant,
        sink: &mut dyn FrameSink,
    ) -> Result<TickResult, SessionError> {
        let result = self.frame(keys, now)?;
        sink.present(self.view(), &result.events);
        Ok(result)
    }

    /// State to render.
    pub fn view(&self) -> &SimulationState {
        match self {
            MatchRunner::Local(controller) => controller.state(),
            MatchRunner::Host { session, .. } => session.state(),
            MatchRunner::Guest { session, .. } => session.view(),
        }
    }

    /// Short role name for logging.
    pub fn role(&self) -> &'static str {
        match self {
            MatchRunner::Local(_) => "local",
            MatchRunner::Host { .. } => "host",
            MatchRunner::Guest { .. } => "guest",
        }
    }

    /// Slot driven by this process's primary keys, once known.
    pub fn local_slot(&self) -> Option<Slot> {
        match self {
            MatchRunner::Local(_) | MatchRunner::Host { .. } => Some(Slot::Left),
            MatchRunner::Guest { session, .. } => session.slot(),
        }
    }

    /// Whether the match is over.
    pub fn is_ended(&self) -> bool {
        self.view().phase == MatchPhase::Ended
    }
}

// =============================================================================
// TESTS
// =============================================================================
