//! Liveness bookkeeping for every open connection.
//!
//! The registry only knows about *bound* connections; the liveness monitor
//! has to supervise all of them, bound or not. The [`ClientDirectory`] is
//! that second index: one [`ClientHandle`] per open connection, registered
//! at accept time and removed when the connection's handler exits.
//!
//! The probe cycle itself ([`ClientDirectory::sweep`]) is synchronous so it
//! can be unit-tested without a timer; the monitor task just calls it on an
//! interval.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pairlink_transport::ConnectionId;

use crate::{PeerHandle, PeerSender};

/// Liveness state for one open connection.
///
/// The `alive` flag is shared with the connection's reader task: the sweep
/// clears it just before probing, and the reader sets it back on receipt of
/// the transport-level acknowledgment. A connection that is still `false`
/// when the next sweep comes around missed a full cycle and is evicted.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    alive: Arc<AtomicBool>,
    peer: PeerHandle,
}

impl ClientHandle {
    /// Creates a handle for a freshly accepted connection. Starts alive —
    /// a connection is only evicted after failing a probe it was given a
    /// full cycle to answer.
    pub fn new(conn_id: ConnectionId, sender: PeerSender) -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
            peer: PeerHandle::new(conn_id, sender),
        }
    }

    /// The shared alive flag, for the reader task to set on pong receipt.
    pub fn alive_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alive)
    }

    /// Whether the connection acknowledged the last probe.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }
}

/// All currently open connections, keyed by connection id.
pub struct ClientDirectory {
    clients: HashMap<ConnectionId, ClientHandle>,
}

impl ClientDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
        }
    }

    /// Registers an open connection for supervision.
    pub fn insert(&mut self, conn_id: ConnectionId, handle: ClientHandle) {
        self.clients.insert(conn_id, handle);
    }

    /// Unregisters a connection. Idempotent — the sweep may already have
    /// evicted it.
    pub fn remove(&mut self, conn_id: &ConnectionId) {
        self.clients.remove(conn_id);
    }

    /// Runs one probe cycle over every tracked connection.
    ///
    /// For each connection: if it never acknowledged the previous cycle's
    /// probe, it is forcibly terminated (a `Close` command to its writer,
    /// which triggers the handler's normal close teardown) and dropped from
    /// the directory. Otherwise its alive flag is cleared and a fresh probe
    /// is sent. Entries whose writer task has already exited are pruned
    /// without ceremony.
    ///
    /// Returns the ids terminated this cycle.
    pub fn sweep(&mut self) -> Vec<ConnectionId> {
        let mut evicted = Vec::new();
        self.clients.retain(|conn_id, client| {
            if !client.peer.is_writable() {
                // Handler already gone; nothing left to supervise.
                return false;
            }
            if !client.is_alive() {
                tracing::warn!(
                    %conn_id,
                    "connection missed a probe cycle, terminating"
                );
                client.peer.close();
                evicted.push(*conn_id);
                return false;
            }
            client.alive.store(false, Ordering::Relaxed);
            client.peer.probe();
            true
        });
        evicted
    }

    /// Returns the number of tracked connections.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no connections are tracked.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientDirectory {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the probe cycle.
    //!
    //! The cycle's timing lives in the monitor; here we drive `sweep()` by
    //! hand, which makes the one-to-two-cycle eviction contract exact and
    //! deterministic: a fresh connection survives sweep 1 (probed), and is
    //! evicted on sweep 2 iff nothing set its alive flag in between.

    use super::*;
    use crate::Outbound;
    use tokio::sync::mpsc;

    fn tracked(
        id: u64,
    ) -> (
        ConnectionId,
        Arc<AtomicBool>,
        mpsc::UnboundedReceiver<Outbound>,
        ClientHandle,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn_id = ConnectionId::new(id);
        let handle = ClientHandle::new(conn_id, tx);
        let alive = handle.alive_flag();
        (conn_id, alive, rx, handle)
    }

    #[test]
    fn test_sweep_probes_alive_connection_and_clears_flag() {
        let mut dir = ClientDirectory::new();
        let (id, alive, mut rx, handle) = tracked(1);
        dir.insert(id, handle);

        let evicted = dir.sweep();

        assert!(evicted.is_empty());
        assert!(!alive.load(Ordering::Relaxed), "flag cleared before probe");
        assert!(matches!(rx.try_recv(), Ok(Outbound::Probe)));
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn test_sweep_evicts_connection_that_missed_a_cycle() {
        let mut dir = ClientDirectory::new();
        let (id, _alive, mut rx, handle) = tracked(1);
        dir.insert(id, handle);

        dir.sweep(); // probe sent, flag cleared
        // No acknowledgment arrives.
        let evicted = dir.sweep();

        assert_eq!(evicted, vec![id]);
        assert!(dir.is_empty());
        // First command was the probe, second the forced close.
        assert!(matches!(rx.try_recv(), Ok(Outbound::Probe)));
        assert!(matches!(rx.try_recv(), Ok(Outbound::Close)));
    }

    #[test]
    fn test_sweep_keeps_connection_that_acknowledged() {
        let mut dir = ClientDirectory::new();
        let (id, alive, mut rx, handle) = tracked(1);
        dir.insert(id, handle);

        dir.sweep();
        // The reader task observed a pong.
        alive.store(true, Ordering::Relaxed);
        let evicted = dir.sweep();

        assert!(evicted.is_empty());
        assert_eq!(dir.len(), 1);
        // Two probes, no close.
        assert!(matches!(rx.try_recv(), Ok(Outbound::Probe)));
        assert!(matches!(rx.try_recv(), Ok(Outbound::Probe)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_sweep_prunes_entries_whose_writer_exited() {
        let mut dir = ClientDirectory::new();
        let (id, _alive, rx, handle) = tracked(1);
        dir.insert(id, handle);
        drop(rx); // writer task gone

        let evicted = dir.sweep();

        // Pruned, but not reported as an eviction — it was already dead.
        assert!(evicted.is_empty());
        assert!(dir.is_empty());
    }

    #[test]
    fn test_sweep_handles_mixed_population_independently() {
        let mut dir = ClientDirectory::new();
        let (id_a, alive_a, mut rx_a, handle_a) = tracked(1);
        let (id_b, _alive_b, mut rx_b, handle_b) = tracked(2);
        dir.insert(id_a, handle_a);
        dir.insert(id_b, handle_b);

        dir.sweep();
        alive_a.store(true, Ordering::Relaxed); // only A acknowledges
        let evicted = dir.sweep();

        assert_eq!(evicted, vec![id_b]);
        assert_eq!(dir.len(), 1);
        assert!(matches!(rx_a.try_recv(), Ok(Outbound::Probe)));
        assert!(matches!(rx_a.try_recv(), Ok(Outbound::Probe)));
        assert!(matches!(rx_b.try_recv(), Ok(Outbound::Probe)));
        assert!(matches!(rx_b.try_recv(), Ok(Outbound::Close)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut dir = ClientDirectory::new();
        let (id, _alive, _rx, handle) = tracked(1);
        dir.insert(id, handle);

        dir.remove(&id);
        dir.remove(&id); // already gone — no-op

        assert!(dir.is_empty());
    }
}
