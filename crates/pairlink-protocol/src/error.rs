//! Error types for the protocol layer.
//!
//! Each crate in Pairlink defines its own error enum. This keeps errors
//! specific and meaningful — a `ProtocolError` is always about
//! serialization, never about networking or session state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unrecognized `type` tag, missing
    /// required fields. Inbound, the server answers all of these with
    /// silence.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
