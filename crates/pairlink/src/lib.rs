//! # Pairlink
//!
//! Pairs a PC client with a mobile client through a short numeric code and
//! relays application messages between them over WebSockets.
//!
//! The flow, end to end:
//!
//! 1. A PC connects and sends `register-pc`. The server creates a session
//!    under a fresh 6-digit code and replies with the code plus a scannable
//!    artifact encoding `connect:<code>`.
//! 2. A mobile connects, scans the artifact, and sends
//!    `register-mobile` with the code. If the session exists and its mobile
//!    slot is free, the two are paired: the PC hears `peer-connected`, the
//!    mobile hears `connected`.
//! 3. Either side sends `message` payloads, which the server relays to the
//!    other side best-effort — no buffering, no retries.
//! 4. The pairing ends together: an explicit `logout` notifies the peer and
//!    closes both connections after a short grace delay; an abrupt
//!    disconnect does the same immediately. A background liveness monitor
//!    evicts connections that stop acknowledging probes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairlink::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PairlinkError> {
//!     let server = PairlinkServerBuilder::new()
//!         .bind("0.0.0.0:10000")
//!         .build(QrArtifactEncoder)
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod monitor;
mod relay;
mod server;

pub use error::PairlinkError;
pub use monitor::{LivenessHandle, LivenessMonitor};
pub use server::{PairlinkServer, PairlinkServerBuilder};

/// Everything needed to stand up a server or talk about its types.
pub mod prelude {
    pub use crate::{
        LivenessHandle, LivenessMonitor, PairlinkError, PairlinkServer,
        PairlinkServerBuilder,
    };
    pub use pairlink_pairing::{
        ArtifactEncoder, ClientDirectory, ClientHandle, Outbound,
        PairingConfig, PairingError, PassthroughEncoder, PeerHandle,
        QrArtifactEncoder, SessionRegistry,
    };
    pub use pairlink_protocol::{
        ClientMessage, Codec, JsonCodec, Role, ServerMessage, SessionCode,
    };
    pub use pairlink_transport::{
        Connection, ConnectionId, Incoming, Transport, WebSocketTransport,
    };
}
