//! Peer handles: how the registry and monitor reach a connection.
//!
//! Each connection gets one writer task that owns all socket writes; this
//! module defines the command channel feeding it. Everything that wants to
//! deliver something to a connection — the relay, a peer notification, a
//! liveness probe, a forced close — enqueues an [`Outbound`] and moves on.
//! If the writer is gone the send fails silently, which is exactly the
//! best-effort contract the relay wants.

use pairlink_protocol::ServerMessage;
use pairlink_transport::ConnectionId;
use tokio::sync::mpsc;

/// A command for a connection's writer task.
#[derive(Debug)]
pub enum Outbound {
    /// Encode and send a protocol message.
    Message(ServerMessage),

    /// Emit a transport-level liveness probe (ping frame).
    Probe,

    /// Close the connection and stop the writer.
    Close,
}

/// Channel sender feeding a connection's writer task.
pub type PeerSender = mpsc::UnboundedSender<Outbound>;

/// A non-owning reference to a connection, held by the [`SessionRegistry`]
/// while the connection is bound to a session.
///
/// Cheap to clone — it's a connection id plus an `mpsc::Sender` wrapper.
/// The handle never outlives its usefulness dangerously: once the writer
/// task exits, [`is_writable`](Self::is_writable) turns false and every
/// send becomes a no-op.
///
/// [`SessionRegistry`]: crate::SessionRegistry
#[derive(Debug, Clone)]
pub struct PeerHandle {
    conn_id: ConnectionId,
    sender: PeerSender,
}

impl PeerHandle {
    /// Creates a handle for the given connection and its writer channel.
    pub fn new(conn_id: ConnectionId, sender: PeerSender) -> Self {
        Self { conn_id, sender }
    }

    /// The id of the connection this handle points at.
    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Returns `true` while the connection's writer task is still draining
    /// the channel — the "open/writable" check the relay performs before
    /// delivering.
    pub fn is_writable(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Enqueues a protocol message. Silently dropped if the writer is gone.
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.sender.send(Outbound::Message(msg));
    }

    /// Enqueues a liveness probe. Silently dropped if the writer is gone.
    pub fn probe(&self) {
        let _ = self.sender.send(Outbound::Probe);
    }

    /// Tells the writer to close the connection and stop. Silently dropped
    /// (the connection is already gone) if the writer has exited.
    pub fn close(&self) {
        let _ = self.sender.send(Outbound::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairlink_protocol::ServerMessage;

    fn handle() -> (PeerHandle, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PeerHandle::new(ConnectionId::new(1), tx), rx)
    }

    #[test]
    fn test_send_enqueues_message() {
        let (h, mut rx) = handle();
        h.send(ServerMessage::Pong);
        assert!(matches!(
            rx.try_recv(),
            Ok(Outbound::Message(ServerMessage::Pong))
        ));
    }

    #[test]
    fn test_is_writable_turns_false_when_receiver_dropped() {
        let (h, rx) = handle();
        assert!(h.is_writable());
        drop(rx);
        assert!(!h.is_writable());
    }

    #[test]
    fn test_send_to_gone_writer_is_silent() {
        let (h, rx) = handle();
        drop(rx);
        // Must not panic or error — best-effort drop.
        h.send(ServerMessage::Logout);
        h.probe();
        h.close();
    }

    #[test]
    fn test_probe_and_close_enqueue_commands() {
        let (h, mut rx) = handle();
        h.probe();
        h.close();
        assert!(matches!(rx.try_recv(), Ok(Outbound::Probe)));
        assert!(matches!(rx.try_recv(), Ok(Outbound::Close)));
    }
}
