//! Session Plumbing
//!
//! Pieces shared by the host and guest state machines: waiting-phase retry
//! timers, the broadcast rate gate, session settings and errors.

use std::time::{Duration, Instant};
use thiserror::Error;

use crate::game::config::ConfigError;
use crate::network::mailbox::TransportError;

/// Which side of the protocol a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Authoritative simulator.
    Host,
    /// Render-only participant.
    Guest,
}

// =============================================================================
// RETRY
// =============================================================================

/// Timeout and backoff for the waiting phases.
///
/// After `initial_timeout_ticks` without progress the session re-sends its
/// announcement (`hello` for a host, `join` for a guest) and the timeout grows
/// by `backoff_factor` up to `max_timeout_ticks`. With `max_attempts` set, the
/// session gives up after that many re-sends and reports the failure to the
/// caller instead of waiting forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Ticks before the first re-send.
    pub initial_timeout_ticks: u32,
    /// Timeout multiplier after each re-send.
    pub backoff_factor: u32,
    /// Upper bound on the timeout.
    pub max_timeout_ticks: u32,
    /// Re-sends before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_timeout_ticks: 120, // 2 seconds @ 60Hz
            backoff_factor: 2,
            max_timeout_ticks: 960, // 16 seconds @ 60Hz
            max_attempts: None,
        }
    }
}

/// Outcome of advancing a phase timer by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStep {
    /// Keep waiting.
    Waiting,
    /// Timed out; re-send. Carries the attempt number (1-based).
    Retry(u32),
    /// Retry limit reached.
    GiveUp(u32),
}

/// Tick-driven timer for one waiting phase.
#[derive(Debug, Clone)]
pub struct PhaseTimer {
    policy: RetryPolicy,
    waited: u32,
    timeout: u32,
    attempts: u32,
}

impl PhaseTimer {
    /// New timer at the initial timeout.
    pub fn new(policy: RetryPolicy) -> Self {
        let timeout = policy.initial_timeout_ticks.max(1);
        Self { policy, waited: 0, timeout, attempts: 0 }
    }

    /// Restart for a new phase.
    pub fn reset(&mut self) {
        self.waited = 0;
        self.timeout = self.policy.initial_timeout_ticks.max(1);
        self.attempts = 0;
    }

    /// Re-sends so far in this phase.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Advance by one tick.
    pub fn step(&mut self) -> TimerStep {
        self.waited += 1;
        if self.waited < self.timeout {
            return TimerStep::Waiting;
        }

        if let Some(max) = self.policy.max_attempts {
            if self.attempts >= max {
                return TimerStep::GiveUp(self.attempts);
            }
        }

        self.attempts += 1;
        self.waited = 0;
        self.timeout = self
            .timeout
            .saturating_mul(self.policy.backoff_factor.max(1))
            .min(self.policy.max_timeout_ticks.max(1));
        TimerStep::Retry(self.attempts)
    }
}

// =============================================================================
// BROADCAST GATE
// =============================================================================

/// Minimum-interval gate for state broadcasts, independent of tick rate.
#[derive(Debug, Clone)]
pub struct BroadcastGate {
    min_interval: Duration,
    last: Option<Instant>,
}

impl BroadcastGate {
    /// Gate allowing one send per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, last: None }
    }

    /// Whether a send is allowed at `now`; records the send if so.
    pub fn ready(&mut self, now: Instant) -> bool {
        let open = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };
        if open {
            self.last = Some(now);
        }
        open
    }

    /// Record a send that bypassed the gate.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

// =============================================================================
// SETTINGS & ERRORS
// =============================================================================

/// Network session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Waiting-phase retry policy.
    pub retry: RetryPolicy,
    /// Minimum time between state broadcasts (~30 Hz).
    pub broadcast_interval: Duration,
    /// Broadcasts after start that carry the obstacle layout.
    pub obstacle_broadcasts: u32,
    /// Broadcasts of the final state after the match ends.
    pub final_broadcasts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            broadcast_interval: Duration::from_millis(33),
            obstacle_broadcasts: 30,
            final_broadcasts: 60,
        }
    }
}

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Invalid match configuration.
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),

    /// The connection could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A waiting phase reached its retry limit.
    #[error("{role:?} gave up waiting in {phase} after {attempts} retries")]
    PhaseTimedOut {
        /// Side that gave up.
        role: Role,
        /// Phase name.
        phase: &'static str,
        /// Retries made.
        attempts: u32,
    },
}

// =============================================================================
// TESTS
// =============================================================================
