//! `PairlinkServer` builder and accept loop.
//!
//! This is the entry point for running a Pairlink server. It ties together
//! all the layers: transport → protocol → pairing, plus the liveness
//! monitor.
//!
//! Each accepted connection gets **two** tasks:
//!
//! - a *writer* task, the only place that writes to the socket. It drains
//!   the connection's [`Outbound`] channel — protocol messages, liveness
//!   probes, forced closes — so the relay and the monitor never touch the
//!   socket directly.
//! - a *handler* task (see [`crate::handler`]) that reads the socket and
//!   runs the pairing state machine.
//!
//! Everything else in the process is shared state behind `Arc`:
//! the session registry and client directory behind one `tokio::sync::Mutex`
//! each, which restores the atomicity a single-threaded event loop would
//! have given for free — every registry lookup + slot mutation +
//! notification happens under one lock acquisition.

use std::sync::Arc;

use pairlink_pairing::{
    ArtifactEncoder, ClientDirectory, ClientHandle, PairingConfig,
    SessionRegistry,
};
use pairlink_protocol::{Codec, JsonCodec};
use pairlink_transport::{Connection, Transport, WebSocketTransport};
use tokio::sync::{Mutex, mpsc};

use crate::handler::{handle_connection, write_outbound};
use crate::monitor::{LivenessHandle, LivenessMonitor};
use crate::PairlinkError;

/// Shared server state passed to each connection's tasks.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<E: ArtifactEncoder, C: Codec> {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) directory: Arc<Mutex<ClientDirectory>>,
    pub(crate) config: PairingConfig,
    pub(crate) encoder: E,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Pairlink server.
///
/// # Example
///
/// ```rust,no_run
/// use pairlink::prelude::*;
///
/// # async fn run() -> Result<(), PairlinkError> {
/// let server = PairlinkServerBuilder::new()
///     .bind("0.0.0.0:10000")
///     .build(QrArtifactEncoder)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PairlinkServerBuilder {
    bind_addr: String,
    config: PairingConfig,
}

impl PairlinkServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            config: PairingConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the pairing configuration (grace delay, probe interval).
    pub fn pairing_config(mut self, config: PairingConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the server with the given artifact encoder and starts the
    /// liveness monitor.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build(
        self,
        encoder: impl ArtifactEncoder,
    ) -> Result<PairlinkServer<impl ArtifactEncoder, JsonCodec>, PairlinkError>
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let directory = Arc::new(Mutex::new(ClientDirectory::new()));
        let monitor = LivenessMonitor::spawn(
            Arc::clone(&directory),
            self.config.probe_interval,
        );

        let state = Arc::new(ServerState {
            registry: Mutex::new(SessionRegistry::new()),
            directory,
            config: self.config,
            encoder,
            codec: JsonCodec,
        });

        Ok(PairlinkServer {
            transport,
            state,
            _monitor: monitor,
        })
    }
}

impl Default for PairlinkServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Pairlink server.
///
/// Call [`run()`](Self::run) to start accepting connections. Dropping the
/// server stops the liveness monitor cleanly.
pub struct PairlinkServer<E: ArtifactEncoder, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<E, C>>,
    /// Held for its lifetime — the monitor shuts down when this drops.
    _monitor: LivenessHandle,
}

impl<E, C> PairlinkServer<E, C>
where
    E: ArtifactEncoder,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> PairlinkServerBuilder {
        PairlinkServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns the writer and handler task
    /// pair for each. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PairlinkError> {
        tracing::info!("Pairlink server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    let conn_id = conn.id();
                    let state = Arc::clone(&self.state);

                    // The connection's outbound command channel. The
                    // directory entry makes it reachable by the monitor;
                    // the handler hands clones to the registry as it binds.
                    let (tx, rx) = mpsc::unbounded_channel();
                    let client = ClientHandle::new(conn_id, tx.clone());
                    let alive = client.alive_flag();
                    state.directory.lock().await.insert(conn_id, client);

                    tokio::spawn(write_outbound(
                        Arc::clone(&conn),
                        rx,
                        Arc::clone(&state),
                    ));
                    tokio::spawn(handle_connection(conn, state, tx, alive));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
