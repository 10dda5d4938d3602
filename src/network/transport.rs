//! WebSocket Transport
//!
//! Client connection to a relay. A background task connects, then a reader
//! task pushes decoded frames into the session's inbox while a writer loop
//! drains the outgoing channel. The frame loop never awaits: it only queues
//! with `try_send` and drains its inbox.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::network::mailbox::{mailbox, Inbox, InboxSender, MessageSink, TransportError};
use crate::network::protocol::WireMessage;

/// Outgoing frames buffered before sends start failing.
const OUTGOING_CAPACITY: usize = 256;

/// Sink half of a WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsTransport {
    outgoing: mpsc::Sender<String>,
    open: Arc<AtomicBool>,
}

impl WsTransport {
    /// Start connecting to `url` on the current tokio runtime. Inbound frames
    /// are delivered to `inbox`.
    ///
    /// Fails with `TransportError::NoRuntime` when called outside a runtime.
    pub fn connect(url: impl Into<String>, inbox: InboxSender) -> Result<Self, TransportError> {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let url = url.into();
        let (outgoing, mut outgoing_rx) = mpsc::channel::<String>(OUTGOING_CAPACITY);
        let open = Arc::new(AtomicBool::new(false));
        let open_flag = open.clone();

        runtime.spawn(async move {
            info!("Connecting to {}...", url);

            let ws_stream = match connect_async(url.as_str()).await {
                Ok((ws_stream, _)) => ws_stream,
                Err(e) => {
                    error!("Failed to connect to relay: {}", e);
                    return;
                }
            };
            info!("WebSocket connected");
            open_flag.store(true, Ordering::Release);

            let (mut write, mut read) = ws_stream.split();
            let reader_open = open_flag.clone();

            let reader_handle = tokio::spawn(async move {
                while let Some(msg_result) = read.next().await {
                    match msg_result {
                        Ok(Message::Text(text)) => {
                            if !inbox.deliver_text(&text) {
                                debug!("Inbox dropped, stopping reader");
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("Relay closed connection");
                            break;
                        }
                        Err(e) => {
                            warn!("WebSocket read error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }
                reader_open.store(false, Ordering::Release);
                debug!("Reader task ended");
            });

            while let Some(json) = outgoing_rx.recv().await {
                if let Err(e) = write.send(Message::Text(json)).await {
                    warn!("Failed to send message: {}", e);
                    break;
                }
            }

            open_flag.store(false, Ordering::Release);
            debug!("Writer loop ended");
            reader_handle.abort();
        });

        Ok(Self { outgoing, open })
    }
}

impl MessageSink for WsTransport {
    fn send(&self, msg: &WireMessage) -> Result<(), TransportError> {
        let json = msg.to_json()?;
        self.outgoing.try_send(json).map_err(|_| TransportError::Closed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// A session's two ends of a transport: where it sends and what it drains.
pub struct NetLink {
    /// Outbound sink.
    pub sink: Box<dyn MessageSink>,
    /// Inbound mailbox.
    pub inbox: Inbox,
}

impl NetLink {
    /// Pair a sink with an inbox.
    pub fn new(sink: Box<dyn MessageSink>, inbox: Inbox) -> Self {
        Self { sink, inbox }
    }

    /// Connect to a relay over WebSocket. Needs a running tokio runtime.
    pub fn websocket(url: impl Into<String>) -> Result<Self, TransportError> {
        let (tx, inbox) = mailbox();
        Ok(Self::new(Box::new(WsTransport::connect(url, tx)?), inbox))
    }
}
