//! Artifact encoding: turning a pairing payload into something scannable.
//!
//! Pairlink doesn't care what the artifact looks like — the server hands
//! the encoder the payload string (`connect:<code>`) and forwards whatever
//! bytes come back, opaquely, inside the `registered` reply.
//!
//! The trait seam exists because deployments differ: the default
//! [`QrArtifactEncoder`] renders a QR code, a web deployment might produce
//! a PNG data URL, and tests want the deterministic
//! [`PassthroughEncoder`]. Swapping one in is a builder argument, not a
//! framework change.

use crate::PairingError;

/// Encodes a pairing payload string into opaque image bytes.
///
/// # Trait bounds
///
/// - `Send + Sync` → the encoder is shared across connection tasks.
/// - `'static` → it lives as long as the server.
///
/// Encoding is async because it is the one potentially non-instantaneous
/// step in registration; the server awaits it *outside* the registry lock
/// so a slow encode never stalls other connections.
pub trait ArtifactEncoder: Send + Sync + 'static {
    /// Encodes the given payload into artifact bytes.
    ///
    /// # Errors
    /// Returns [`PairingError::ArtifactFailed`] if the payload can't be
    /// encoded. The server then discards the half-created session rather
    /// than replying with a broken artifact.
    fn encode(
        &self,
        payload: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, PairingError>> + Send;
}

// ---------------------------------------------------------------------------
// QrArtifactEncoder
// ---------------------------------------------------------------------------

/// The default encoder: a QR code rendered as Unicode half-block text.
///
/// Each output character covers two modules vertically, so the result
/// displays correctly in any monospace context (terminal, `<pre>` tag) and
/// scans from a phone camera. Behind the `qr` feature flag (enabled by
/// default).
#[cfg(feature = "qr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct QrArtifactEncoder;

#[cfg(feature = "qr")]
impl ArtifactEncoder for QrArtifactEncoder {
    async fn encode(&self, payload: &str) -> Result<Vec<u8>, PairingError> {
        use qrcode::QrCode;
        use qrcode::render::unicode;

        let code = QrCode::new(payload.as_bytes())
            .map_err(|e| PairingError::ArtifactFailed(e.to_string()))?;
        let rendered = code.render::<unicode::Dense1x2>().build();
        Ok(rendered.into_bytes())
    }
}

// ---------------------------------------------------------------------------
// PassthroughEncoder
// ---------------------------------------------------------------------------

/// An encoder that returns the payload bytes verbatim.
///
/// For tests (the artifact becomes trivially assertable) and for headless
/// deployments where the client renders the code itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEncoder;

impl ArtifactEncoder for PassthroughEncoder {
    async fn encode(&self, payload: &str) -> Result<Vec<u8>, PairingError> {
        Ok(payload.as_bytes().to_vec())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_returns_payload_verbatim() {
        let artifact = PassthroughEncoder
            .encode("connect:482913")
            .await
            .expect("should encode");
        assert_eq!(artifact, b"connect:482913");
    }

    #[cfg(feature = "qr")]
    #[tokio::test]
    async fn test_qr_encoder_produces_nonempty_utf8() {
        let artifact = QrArtifactEncoder
            .encode("connect:482913")
            .await
            .expect("should encode");
        assert!(!artifact.is_empty());
        // The unicode rendering is valid UTF-8 by construction.
        let text = String::from_utf8(artifact).expect("utf-8");
        assert!(text.lines().count() > 1, "should render multiple rows");
    }

    #[cfg(feature = "qr")]
    #[tokio::test]
    async fn test_qr_encoder_is_deterministic_per_payload() {
        let a = QrArtifactEncoder.encode("connect:111111").await.unwrap();
        let b = QrArtifactEncoder.encode("connect:111111").await.unwrap();
        let c = QrArtifactEncoder.encode("connect:222222").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
