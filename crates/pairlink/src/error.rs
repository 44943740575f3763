//! Unified error type for the Pairlink framework.

use pairlink_pairing::PairingError;
use pairlink_protocol::ProtocolError;
use pairlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `pairlink` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairlinkError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A pairing-level error (rendezvous conflicts, code generation,
    /// artifact encoding).
    #[error(transparent)]
    Pairing(#[from] PairingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairlink_protocol::{Codec, SessionCode};

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("conn-9".into());
        let top: PairlinkError = err.into();
        assert!(matches!(top, PairlinkError::Transport(_)));
        assert!(top.to_string().contains("conn-9"));
    }

    #[test]
    fn test_from_pairing_error() {
        let err = PairingError::UnknownCode(SessionCode::new("000000"));
        let top: PairlinkError = err.into();
        assert!(matches!(top, PairlinkError::Pairing(_)));
        assert!(top.to_string().contains("000000"));
    }

    #[test]
    fn test_from_protocol_error() {
        let bad: Result<pairlink_protocol::ClientMessage, _> =
            pairlink_protocol::JsonCodec.decode(b"not json");
        let top: PairlinkError = bad.unwrap_err().into();
        assert!(matches!(top, PairlinkError::Protocol(_)));
    }
}
