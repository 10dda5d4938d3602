//! Mailbox and Sinks
//!
//! Inbound messages from any transport task land in an unbounded channel and
//! are drained exactly once at the start of each tick, so the simulation never
//! awaits and never sees a message mid-tick.
//!
//! Outbound messages go through a `MessageSink`. Sends are fire-and-forget:
//! `send_or_log` logs a failure and drops the message.

use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

use crate::network::protocol::{ProtocolError, WireMessage};

// =============================================================================
// INBOX
// =============================================================================

/// Producer half of a mailbox. Cheap to clone into transport tasks.
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::UnboundedSender<WireMessage>,
}

impl InboxSender {
    /// Enqueue a decoded message. Returns false if the inbox is gone.
    pub fn deliver(&self, msg: WireMessage) -> bool {
        self.tx.send(msg).is_ok()
    }

    /// Decode and enqueue a text frame. Malformed frames are dropped.
    pub fn deliver_text(&self, text: &str) -> bool {
        match WireMessage::decode(text) {
            Some(msg) => self.deliver(msg),
            None => true,
        }
    }
}

/// Consumer half of a mailbox, owned by the frame loop.
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<WireMessage>,
}

impl Inbox {
    /// Take everything queued so far, in arrival order.
    pub fn drain(&mut self) -> Vec<WireMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

/// Create a mailbox.
pub fn mailbox() -> (InboxSender, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboxSender { tx }, Inbox { rx })
}

// =============================================================================
// SINKS
// =============================================================================

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection or channel is closed.
    #[error("Transport closed")]
    Closed,

    /// Message could not be encoded.
    #[error("Encode failed: {0}")]
    Encode(#[from] ProtocolError),

    /// No tokio runtime to run the connection on.
    #[error("No tokio runtime available for the connection")]
    NoRuntime,

    /// WebSocket failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Outbound side of a transport.
pub trait MessageSink: Send {
    /// Queue a message for delivery.
    fn send(&self, msg: &WireMessage) -> Result<(), TransportError>;

    /// Whether the transport is connected.
    fn is_open(&self) -> bool {
        true
    }
}

/// Fire-and-forget send: failures are logged and the message dropped.
pub fn send_or_log(sink: &dyn MessageSink, msg: &WireMessage) {
    if let Err(e) = sink.send(msg) {
        warn!(kind = msg.kind(), "Dropped outgoing message: {}", e);
    }
}

// =============================================================================
// LOOPBACK
// =============================================================================

/// In-process stand-in for the relay: every member's sends are encoded to
/// JSON and delivered to every other member's inbox.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub {
    members: Arc<Mutex<Vec<InboxSender>>>,
}

impl LoopbackHub {
    /// Empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member; returns its sink and inbox.
    pub fn join(&self) -> (LoopbackSink, Inbox) {
        let (tx, inbox) = mailbox();
        let index = match self.members.lock() {
            Ok(mut members) => {
                members.push(tx);
                members.len() - 1
            }
            Err(poisoned) => {
                let mut members = poisoned.into_inner();
                members.push(tx);
                members.len() - 1
            }
        };
        (LoopbackSink { hub: self.clone(), index }, inbox)
    }
}

/// A member's sink on a `LoopbackHub`.
#[derive(Debug, Clone)]
pub struct LoopbackSink {
    hub: LoopbackHub,
    index: usize,
}

impl MessageSink for LoopbackSink {
    fn send(&self, msg: &WireMessage) -> Result<(), TransportError> {
        let text = msg.to_json()?;
        let members = self.hub.members.lock().map_err(|_| TransportError::Closed)?;
        for (i, member) in members.iter().enumerate() {
            if i != self.index {
                member.deliver_text(&text);
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
