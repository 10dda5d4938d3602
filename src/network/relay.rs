//! Room Relay
//!
//! A small WebSocket server that forwards text frames between peers in the
//! same room. It holds no game state and never decodes beyond routing: a
//! peer's room is learned from the first `hello` or `join` it sends, and every
//! later frame is forwarded verbatim to the other peers in that room.
//! Malformed frames are dropped.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::network::protocol::WireMessage;

/// Default relay port.
pub const DEFAULT_RELAY_PORT: u16 = 9001;

/// Per-peer outgoing buffer. Frames beyond it are dropped.
const PEER_BUFFER: usize = 128;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_RELAY_PORT)),
            max_connections: 256,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by `RELAY_BIND_ADDR` and `RELAY_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, RelayError> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("RELAY_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|_| RelayError::InvalidConfig(format!("RELAY_BIND_ADDR={}", addr)))?;
        }
        if let Ok(max) = std::env::var("RELAY_MAX_CONNECTIONS") {
            config.max_connections = max
                .parse()
                .map_err(|_| RelayError::InvalidConfig(format!("RELAY_MAX_CONNECTIONS={}", max)))?;
        }
        Ok(config)
    }
}

/// Relay errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Bad configuration value.
    #[error("Invalid relay config: {0}")]
    InvalidConfig(String),
}

/// A connected peer.
struct Peer {
    /// Room learned from the peer's first `hello` or `join`.
    room: Option<String>,
    /// Outgoing frames.
    sender: mpsc::Sender<String>,
}

type Peers = Arc<RwLock<BTreeMap<SocketAddr, Peer>>>;

/// The relay server.
pub struct RelayServer {
    config: RelayConfig,
    peers: Peers,
    shutdown_tx: broadcast::Sender<()>,
}

impl RelayServer {
    /// Create a relay.
    pub fn new(config: RelayConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            peers: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), RelayError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Relay listening on {}", self.config.bind_addr);
        self.serve(listener).await;
        Ok(())
    }

    /// Serve on an already-bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.peers.read().await.len() >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }
    }

    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let peers = self.peers.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (tx, mut rx) = mpsc::channel::<String>(PEER_BUFFER);

            peers.write().await.insert(addr, Peer { room: None, sender: tx });

            let sender_task = tokio::spawn(async move {
                while let Some(text) = rx.recv().await {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                Self::route(&peers, addr, text).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Peer {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                debug!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }

            sender_task.abort();
            if let Some(peer) = peers.write().await.remove(&addr) {
                if let Some(room) = peer.room {
                    info!(%room, "Peer {} left", addr);
                }
            }
        });
    }

    /// Learn the sender's room if this frame names one, then forward the
    /// frame to everyone else in that room.
    async fn route(peers: &Peers, from: SocketAddr, text: String) {
        let msg = match WireMessage::decode(&text) {
            Some(msg) => msg,
            None => return,
        };

        let room = {
            let mut peers = peers.write().await;
            let Some(peer) = peers.get_mut(&from) else { return };
            if let Some(named) = msg.room() {
                if peer.room.as_deref() != Some(named) {
                    info!(room = named, "Peer {} entered room", from);
                    peer.room = Some(named.to_string());
                }
            }
            match &peer.room {
                Some(room) => room.clone(),
                None => {
                    debug!(kind = msg.kind(), "Frame from {} before any room", from);
                    return;
                }
            }
        };

        let peers = peers.read().await;
        for (addr, peer) in peers.iter() {
            if *addr == from || peer.room.as_deref() != Some(room.as_str()) {
                continue;
            }
            if peer.sender.try_send(text.clone()).is_err() {
                debug!(kind = msg.kind(), "Dropped frame for {}", addr);
            }
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Connected peers.
    pub async fn connection_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Peers currently in `room`.
    pub async fn room_size(&self, room: &str) -> usize {
        self.peers
            .read()
            .await
            .values()
            .filter(|p| p.room.as_deref() == Some(room))
            .count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
