//! The liveness monitor: periodic eviction of unresponsive connections.
//!
//! Message dispatch never notices a silently-dead TCP peer; this task does.
//! On a fixed period it runs one probe cycle over the client directory
//! (see [`ClientDirectory::sweep`]): connections that acknowledged the
//! previous probe get a fresh one, connections that didn't are forcibly
//! closed — which funnels them into the same disconnect teardown as any
//! other close. Eviction therefore takes between one and two periods.
//!
//! The monitor runs independently of traffic, is started once per server,
//! and stops cleanly when its [`LivenessHandle`] is dropped or
//! [`stop`](LivenessHandle::stop)ped.

use std::sync::Arc;
use std::time::Duration;

use pairlink_pairing::ClientDirectory;
use tokio::sync::{Mutex, watch};

/// Spawns the monitor task.
pub struct LivenessMonitor;

impl LivenessMonitor {
    /// Starts supervising `directory`, probing every `period`.
    pub fn spawn(
        directory: Arc<Mutex<ClientDirectory>>,
        period: Duration,
    ) -> LivenessHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(
                tokio::time::MissedTickBehavior::Delay,
            );
            // The first interval tick fires immediately; consume it so
            // connections get a full period before their first probe.
            ticker.tick().await;

            tracing::debug!(?period, "liveness monitor started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = directory.lock().await.sweep();
                        if !evicted.is_empty() {
                            tracing::info!(
                                count = evicted.len(),
                                "evicted unresponsive connections"
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("liveness monitor stopped");
        });

        LivenessHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

/// Handle to a running liveness monitor.
///
/// The monitor stops when [`stop`](Self::stop) is called or the handle is
/// dropped — whichever comes first.
pub struct LivenessHandle {
    shutdown: watch::Sender<bool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl LivenessHandle {
    /// Signals the monitor to stop after its current cycle.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Signals the monitor to stop and waits for the task to finish.
    pub async fn stopped(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LivenessHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Timing tests for the monitor task. The probe-cycle *logic* is
    //! unit-tested synchronously in `pairlink-pairing::directory`; here we
    //! only verify that the timer actually drives it and that shutdown is
    //! clean.

    use super::*;
    use pairlink_pairing::{ClientHandle, Outbound};
    use pairlink_transport::ConnectionId;
    use tokio::sync::mpsc;

    const PERIOD: Duration = Duration::from_millis(20);

    fn tracked(
        directory: &mut ClientDirectory,
        id: u64,
    ) -> mpsc::UnboundedReceiver<Outbound> {
        let (tx, rx) = mpsc::unbounded_channel();
        directory.insert(
            ConnectionId::new(id),
            ClientHandle::new(ConnectionId::new(id), tx),
        );
        rx
    }

    #[tokio::test]
    async fn test_monitor_evicts_unresponsive_within_two_periods() {
        let mut dir = ClientDirectory::new();
        let mut rx = tracked(&mut dir, 1);
        let directory = Arc::new(Mutex::new(dir));

        let handle = LivenessMonitor::spawn(Arc::clone(&directory), PERIOD);

        // Never acknowledge. Within two periods (plus slack for a slow
        // scheduler) the close command must arrive.
        let deadline = Duration::from_millis(200);
        let close = tokio::time::timeout(deadline, async {
            loop {
                match rx.recv().await {
                    Some(Outbound::Close) => break,
                    Some(_) => continue,
                    None => panic!("channel closed without Close"),
                }
            }
        })
        .await;
        assert!(close.is_ok(), "unresponsive connection not evicted");
        assert!(directory.lock().await.is_empty());

        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_monitor_keeps_acknowledging_connection() {
        let mut dir = ClientDirectory::new();
        let (tx, _rx_keep) = mpsc::unbounded_channel();
        let client = ClientHandle::new(ConnectionId::new(1), tx);
        let alive = client.alive_flag();
        dir.insert(ConnectionId::new(1), client);
        let directory = Arc::new(Mutex::new(dir));
        let handle = LivenessMonitor::spawn(Arc::clone(&directory), PERIOD);

        // Acknowledge faster than the probe period for several cycles.
        for _ in 0..10 {
            alive.store(true, std::sync::atomic::Ordering::Relaxed);
            tokio::time::sleep(PERIOD / 2).await;
        }

        assert_eq!(
            directory.lock().await.len(),
            1,
            "responsive connection must not be evicted"
        );
        handle.stopped().await;
    }

    #[tokio::test]
    async fn test_monitor_stop_halts_probing() {
        let mut dir = ClientDirectory::new();
        let mut rx = tracked(&mut dir, 1);
        let directory = Arc::new(Mutex::new(dir));

        let handle = LivenessMonitor::spawn(Arc::clone(&directory), PERIOD);
        handle.stopped().await;

        // Drain anything sent before the stop, then confirm silence.
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(PERIOD * 3).await;
        assert!(
            rx.try_recv().is_err(),
            "no probes may arrive after shutdown"
        );
    }

    #[tokio::test]
    async fn test_monitor_drop_stops_task() {
        let directory = Arc::new(Mutex::new(ClientDirectory::new()));
        let handle = LivenessMonitor::spawn(Arc::clone(&directory), PERIOD);
        drop(handle);
        // Nothing to assert beyond "does not hang/panic" — the watch
        // channel closes and the task exits on its next select.
        tokio::time::sleep(PERIOD * 2).await;
    }
}
