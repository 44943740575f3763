//! Best-effort message relay between the two ends of a pairing.
//!
//! Deliberately stateless: the peer is looked up by code at send time,
//! every time. Caching the peer's handle on the sender's side would risk
//! delivering into a connection that has since closed and had its id
//! reused; a fresh lookup can at worst find the slot empty and drop.

use pairlink_pairing::SessionRegistry;
use pairlink_protocol::{Role, ServerMessage, SessionCode};
use tokio::sync::Mutex;

/// Forwards an application message to the sender's paired peer.
///
/// Delivery happens iff the session still exists, the other slot is bound,
/// and that connection's writer is still draining its channel. In every
/// other case the message is dropped with no error surfaced to the sender —
/// there is no delivery-confirmation contract, no retry, no buffering.
pub(crate) async fn relay(
    registry: &Mutex<SessionRegistry>,
    code: &SessionCode,
    from: Role,
    content: Option<String>,
    file: Option<String>,
    filename: Option<String>,
) {
    let registry = registry.lock().await;
    let Some(session) = registry.get(code) else {
        return;
    };
    let Some(peer) = session.peer_of(from) else {
        return;
    };
    if !peer.is_writable() {
        return;
    }
    peer.send(ServerMessage::Message {
        from,
        content,
        file,
        filename,
    });
}

#[cfg(test)]
mod tests {
    //! The relay's drop conditions, exercised directly against a registry.

    use super::*;
    use pairlink_pairing::{Outbound, PeerHandle};
    use pairlink_transport::ConnectionId;
    use tokio::sync::mpsc;

    fn handle(
        id: u64,
    ) -> (PeerHandle, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PeerHandle::new(ConnectionId::new(id), tx), rx)
    }

    /// Builds a registry with one fully paired session.
    fn paired() -> (
        Mutex<SessionRegistry>,
        SessionCode,
        mpsc::UnboundedReceiver<Outbound>,
        mpsc::UnboundedReceiver<Outbound>,
    ) {
        let mut registry = SessionRegistry::new();
        let (pc, pc_rx) = handle(1);
        let (mobile, mobile_rx) = handle(2);
        let code = registry.create(pc).unwrap();
        registry.join(&code, mobile).unwrap();
        (Mutex::new(registry), code, pc_rx, mobile_rx)
    }

    #[tokio::test]
    async fn test_relay_delivers_to_peer_with_sender_role() {
        let (registry, code, _pc_rx, mut mobile_rx) = paired();

        relay(
            &registry,
            &code,
            Role::Pc,
            Some("hi".into()),
            None,
            None,
        )
        .await;

        match mobile_rx.try_recv() {
            Ok(Outbound::Message(ServerMessage::Message {
                from,
                content,
                file,
                filename,
            })) => {
                assert_eq!(from, Role::Pc);
                assert_eq!(content.as_deref(), Some("hi"));
                assert!(file.is_none());
                assert!(filename.is_none());
            }
            other => panic!("expected relayed message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_mobile_to_pc_direction() {
        let (registry, code, mut pc_rx, _mobile_rx) = paired();

        relay(&registry, &code, Role::Mobile, None, Some("f".into()), Some("a.txt".into())).await;

        match pc_rx.try_recv() {
            Ok(Outbound::Message(ServerMessage::Message {
                from, file, ..
            })) => {
                assert_eq!(from, Role::Mobile);
                assert_eq!(file.as_deref(), Some("f"));
            }
            other => panic!("expected relayed message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_drops_when_peer_absent() {
        // PC is bound but no mobile has joined: message goes nowhere and
        // nothing errors.
        let mut registry = SessionRegistry::new();
        let (pc, mut pc_rx) = handle(1);
        let code = registry.create(pc).unwrap();
        let registry = Mutex::new(registry);

        relay(&registry, &code, Role::Pc, Some("hi".into()), None, None)
            .await;

        assert!(pc_rx.try_recv().is_err(), "sender must not get an echo");
    }

    #[tokio::test]
    async fn test_relay_drops_when_peer_not_writable() {
        let (registry, code, _pc_rx, mobile_rx) = paired();
        drop(mobile_rx); // mobile's writer task is gone

        // Must not panic, must not surface an error.
        relay(&registry, &code, Role::Pc, Some("hi".into()), None, None)
            .await;
    }

    #[tokio::test]
    async fn test_relay_drops_when_session_gone() {
        let (registry, code, _pc_rx, mut mobile_rx) = paired();
        registry.lock().await.delete(&code);

        relay(&registry, &code, Role::Pc, Some("hi".into()), None, None)
            .await;

        assert!(mobile_rx.try_recv().is_err());
    }
}
