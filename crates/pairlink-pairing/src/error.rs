//! Error types for the pairing layer.

use pairlink_protocol::SessionCode;

/// Errors that can occur during pairing operations.
///
/// The first three are the checked rendezvous conflicts — the `#[error]`
/// strings double as the client-facing `error.message` text, so they are
/// written for humans holding a phone, not for logs.
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    /// No live session is registered under this code.
    #[error("no session with code {0}")]
    UnknownCode(SessionCode),

    /// The session exists but has no PC bound — nothing to pair with.
    #[error("session {0} has no pc registered")]
    PeerMissing(SessionCode),

    /// The session's mobile slot is already taken.
    #[error("session {0} already has a mobile connected")]
    SlotOccupied(SessionCode),

    /// Code generation kept colliding with live sessions. With a 900 000
    /// code space this means the registry is effectively full.
    #[error("could not allocate an unused pairing code")]
    CodeSpaceExhausted,

    /// The artifact encoder rejected the pairing payload.
    #[error("artifact encoding failed: {0}")]
    ArtifactFailed(String),
}
