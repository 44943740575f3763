//! Configuration for pairing behavior.

use std::time::Duration;

/// Tunables for session teardown and liveness supervision.
///
/// The defaults are what the production deployment runs; tests shrink both
/// values to keep themselves fast.
#[derive(Debug, Clone)]
pub struct PairingConfig {
    /// Pause between notifying a peer of a logout and closing the
    /// underlying connections. Long enough for the notification to be
    /// delivered before the sockets go away.
    ///
    /// Default: 400 ms.
    pub logout_grace: Duration,

    /// Period of the liveness probe cycle. A connection that fails to
    /// acknowledge one full cycle is terminated, so eviction takes between
    /// one and two of these periods.
    ///
    /// Default: 15 s.
    pub probe_interval: Duration,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            logout_grace: Duration::from_millis(400),
            probe_interval: Duration::from_secs(15),
        }
    }
}
