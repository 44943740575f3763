//! Transport abstraction layer for Pairlink.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the network protocol carrying pairing traffic. The one shipping
//! implementation is WebSocket via `tokio-tungstenite`.
//!
//! Two details here exist specifically for the pairing relay on top:
//!
//! - A connection can be **written to from any task**, not just the task
//!   that reads it. Relayed messages originate in the *peer's* handler
//!   task, so `send` takes `&self` and locks only the sink half.
//! - Liveness probing is a **transport-level** primitive: [`Connection::ping`]
//!   emits a protocol-level ping frame, and the acknowledgment surfaces in
//!   [`Connection::recv`] as [`Incoming::Pong`]. This is deliberately
//!   separate from any application-level ping message the protocol layer
//!   may define — both exist at once.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One item received from a connection.
///
/// The pairing layer needs to see liveness acknowledgments (to reset the
/// connection's alive flag), so `recv` distinguishes them from data instead
/// of swallowing them inside the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// An application message (text or binary frame payload).
    Data(Vec<u8>),

    /// Acknowledgment of a [`Connection::ping`] liveness probe.
    Pong,
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Returns the local address the transport is bound to.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that can send and receive messages.
///
/// Send and receive operate on independent halves, so a writer task and a
/// reader task may use the same connection concurrently through a shared
/// reference.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next item from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Incoming>, Self::Error>;

    /// Sends a transport-level liveness probe.
    ///
    /// The remote endpoint is expected to acknowledge without application
    /// involvement; the acknowledgment arrives as [`Incoming::Pong`].
    async fn ping(&self) -> Result<(), Self::Error>;

    /// Closes the connection. Idempotent — closing an already-closed
    /// connection is a no-op.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns `true` while the connection is open and writable.
    fn is_open(&self) -> bool;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_equality() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(1);
        let c = ConnectionId::new(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        // ConnectionId derives Hash, so it should work as a HashMap key.
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "pc");
        map.insert(ConnectionId::new(2), "mobile");
        assert_eq!(map[&ConnectionId::new(1)], "pc");
    }

    #[test]
    fn test_incoming_data_and_pong_are_distinct() {
        assert_ne!(Incoming::Data(vec![1]), Incoming::Pong);
        assert_eq!(Incoming::Data(vec![1]), Incoming::Data(vec![1]));
    }
}
