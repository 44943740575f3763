//! Per-connection handling: the pairing protocol state machine.
//!
//! Each accepted connection runs two tasks. The *writer*
//! ([`write_outbound`]) owns all socket writes and drains the connection's
//! command channel. The *handler* ([`handle_connection`]) owns all reads
//! and the connection's protocol state:
//!
//! ```text
//! Unbound ──register-pc──→ BoundAsPC ────┐
//! Unbound ──register-mobile──→ BoundAsMobile ──logout / disconnect──→ Closed
//! ```
//!
//! Both bound states are terminal until close; there is no mid-session
//! role change, and out-of-state messages are silently discarded — the
//! same treatment as payloads that fail to parse.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pairlink_pairing::{ArtifactEncoder, Outbound, PeerHandle, PeerSender};
use pairlink_protocol::{ClientMessage, Codec, Role, ServerMessage, SessionCode};
use pairlink_transport::{Connection, Incoming, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;

/// What a connection is bound to, once registered. `None` = Unbound.
type Binding = Option<(SessionCode, Role)>;

/// Drains a connection's outbound command channel into the socket.
///
/// Exits on a `Close` command, on a failed write, or when every sender is
/// gone (handler exited and the session released its handles). The socket
/// close at the end is idempotent, so racing the handler's own close is
/// harmless.
pub(crate) async fn write_outbound<E, C>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    state: Arc<ServerState<E, C>>,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    let conn_id = conn.id();
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Outbound::Message(msg) => {
                let bytes = match state.codec.encode(&msg) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(
                            %conn_id, error = %e,
                            "failed to encode outbound message"
                        );
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
            Outbound::Probe => {
                if conn.ping().await.is_err() {
                    break;
                }
            }
            Outbound::Close => break,
        }
    }
    let _ = conn.close().await;
    tracing::debug!(%conn_id, "writer task stopped");
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<E, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<E, C>>,
    outbound: PeerSender,
    alive: Arc<AtomicBool>,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    let conn_id = conn.id();
    let this = PeerHandle::new(conn_id, outbound);
    let mut binding: Binding = None;

    // A healthy connection produces at least one probe acknowledgment per
    // probe period, so a read this long without any traffic means the
    // socket is dead even if TCP hasn't noticed (e.g. the close handshake
    // after an eviction never completes).
    let idle_cap = state.config.probe_interval * 3;

    tracing::debug!(%conn_id, "handling new connection");

    loop {
        let incoming =
            match tokio::time::timeout(idle_cap, conn.recv()).await {
                Ok(Ok(Some(incoming))) => incoming,
                Ok(Ok(None)) => {
                    tracing::debug!(%conn_id, "connection closed");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
                Err(_) => {
                    tracing::debug!(%conn_id, "connection idle past cap");
                    break;
                }
            };

        match incoming {
            Incoming::Pong => {
                // Acknowledgment of the monitor's transport-level probe.
                alive.store(true, Ordering::Relaxed);
            }
            Incoming::Data(data) => {
                let msg: ClientMessage = match state.codec.decode(&data) {
                    Ok(msg) => msg,
                    Err(e) => {
                        // Protocol violation: no reply, no state change.
                        tracing::debug!(
                            %conn_id, error = %e,
                            "discarding unparseable payload"
                        );
                        continue;
                    }
                };
                handle_message(&state, &this, &mut binding, msg).await;
            }
        }
    }

    close_teardown(&state, &this, binding).await;
    let _ = conn.close().await;
}

/// Dispatches one parsed inbound message against the connection's state.
async fn handle_message<E, C>(
    state: &Arc<ServerState<E, C>>,
    this: &PeerHandle,
    binding: &mut Binding,
    msg: ClientMessage,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    match msg {
        // Application-level keep-alive: answered from any state.
        ClientMessage::Ping => {
            this.send(ServerMessage::Pong);
        }

        ClientMessage::RegisterPc => {
            if binding.is_some() {
                tracing::debug!(
                    conn_id = %this.conn_id(),
                    "ignoring register-pc from bound connection"
                );
                return;
            }
            register_pc(state, this, binding).await;
        }

        ClientMessage::RegisterMobile { code } => {
            if binding.is_some() {
                tracing::debug!(
                    conn_id = %this.conn_id(),
                    "ignoring register-mobile from bound connection"
                );
                return;
            }
            register_mobile(state, this, binding, code).await;
        }

        ClientMessage::Message {
            content,
            file,
            filename,
        } => {
            let Some((code, role)) = binding else {
                tracing::debug!(
                    conn_id = %this.conn_id(),
                    "ignoring message from unbound connection"
                );
                return;
            };
            crate::relay::relay(
                &state.registry,
                code,
                *role,
                content,
                file,
                filename,
            )
            .await;
        }

        ClientMessage::Logout => {
            let Some((code, role)) = binding else {
                tracing::debug!(
                    conn_id = %this.conn_id(),
                    "ignoring logout from unbound connection"
                );
                return;
            };
            logout(state, code, *role).await;
        }
    }
}

/// register-pc: create a session, produce the pairing artifact, reply.
async fn register_pc<E, C>(
    state: &Arc<ServerState<E, C>>,
    this: &PeerHandle,
    binding: &mut Binding,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    let created = {
        let mut registry = state.registry.lock().await;
        registry.create(this.clone())
    };
    let code = match created {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(
                conn_id = %this.conn_id(), error = %e,
                "could not create session"
            );
            return;
        }
    };

    // The one potentially slow step. The registry lock is NOT held here —
    // a slow encoder must not stall other connections.
    let payload = format!("connect:{code}");
    match state.encoder.encode(&payload).await {
        Ok(artifact) => {
            *binding = Some((code.clone(), Role::Pc));
            tracing::info!(
                conn_id = %this.conn_id(), %code,
                "pc registered"
            );
            this.send(ServerMessage::Registered { code, artifact });
        }
        Err(e) => {
            // Don't leave an unjoinable session behind, and don't reply
            // with a broken artifact. The error reply is reserved for the
            // rendezvous conflicts the protocol defines.
            tracing::warn!(
                conn_id = %this.conn_id(), %code, error = %e,
                "artifact encoding failed, discarding session"
            );
            state.registry.lock().await.delete(&code);
        }
    }
}

/// register-mobile: the checked rendezvous.
async fn register_mobile<E, C>(
    state: &Arc<ServerState<E, C>>,
    this: &PeerHandle,
    binding: &mut Binding,
    code: SessionCode,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    // Lookup, slot fill, and pc notification under one lock acquisition,
    // so a concurrent teardown or competing mobile can't interleave.
    let joined = {
        let mut registry = state.registry.lock().await;
        registry.join(&code, this.clone()).map(|pc| {
            pc.send(ServerMessage::PeerConnected);
        })
    };

    match joined {
        Ok(()) => {
            *binding = Some((code.clone(), Role::Mobile));
            tracing::info!(
                conn_id = %this.conn_id(), %code,
                "mobile connected"
            );
            this.send(ServerMessage::Connected);
        }
        Err(e) => {
            // The only checked, recoverable failure path: report it and
            // change nothing.
            tracing::debug!(
                conn_id = %this.conn_id(), %code, reason = %e,
                "register-mobile rejected"
            );
            this.send(ServerMessage::Error {
                message: e.to_string(),
            });
        }
    }
}

/// logout: notify the other party, then close both ends after the grace
/// delay.
async fn logout<E, C>(
    state: &Arc<ServerState<E, C>>,
    code: &SessionCode,
    role: Role,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    let session_exists = {
        let registry = state.registry.lock().await;
        match registry.get(code) {
            Some(session) => {
                // Only the *other* party hears the notification — the
                // initiator asked for this.
                if let Some(peer) = session.peer_of(role) {
                    if peer.is_writable() {
                        peer.send(ServerMessage::Logout);
                    }
                }
                true
            }
            None => false, // already torn down by the other trigger path
        }
    };
    if !session_exists {
        return;
    }

    tracing::info!(%code, %role, "logout requested");

    // Grace delay: let the notification reach the peer before the sockets
    // go away. The task re-looks-up the session because a disconnect may
    // tear it down first — both paths are idempotent.
    let state = Arc::clone(state);
    let code = code.clone();
    tokio::spawn(async move {
        tokio::time::sleep(state.config.logout_grace).await;
        let mut registry = state.registry.lock().await;
        if let Some(session) = registry.get(&code) {
            for member_role in [Role::Pc, Role::Mobile] {
                if let Some(member) = session.member(member_role) {
                    if member.is_writable() {
                        member.close();
                    }
                }
            }
            registry.delete(&code);
            tracing::info!(%code, "session closed after logout");
        }
    });
}

/// Teardown for an abrupt close (or any reader exit): the
/// disconnect-triggered equivalent of logout, with no grace delay.
async fn close_teardown<E, C>(
    state: &Arc<ServerState<E, C>>,
    this: &PeerHandle,
    binding: Binding,
) where
    E: ArtifactEncoder,
    C: Codec,
{
    if let Some((code, role)) = binding {
        let mut registry = state.registry.lock().await;
        if let Some(session) = registry.get(&code) {
            if let Some(peer) = session.peer_of(role) {
                if peer.is_writable() {
                    peer.send(ServerMessage::Logout);
                    peer.close();
                }
            }
            registry.delete(&code);
            tracing::info!(
                %code, %role,
                "session deleted after disconnect"
            );
        }
    }
    state.directory.lock().await.remove(&this.conn_id());
}
