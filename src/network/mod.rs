//! Network Layer
//!
//! Host/guest sessions, the wire protocol, transports and the room relay.
//! Sessions never await: transports feed a mailbox that the frame loop
//! drains once per tick.

pub mod protocol;
pub mod session;
pub mod mailbox;
pub mod transport;
pub mod host;
pub mod guest;
pub mod relay;

pub use protocol::{WireMessage, StateSnapshot, InputRecord, ProtocolError};
pub use session::{RetryPolicy, SessionSettings, SessionError};
pub use mailbox::{mailbox, Inbox, InboxSender, MessageSink, LoopbackHub, TransportError};
pub use transport::{NetLink, WsTransport};
pub use host::{HostSession, HostPhase};
pub use guest::{GuestSession, GuestPhase};
pub use relay::{RelayServer, RelayConfig, RelayError};
