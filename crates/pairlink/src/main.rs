//! The `pairlink-server` binary: bootstrap and run.
//!
//! Configuration is one environment variable: `PORT` (default 10000).
//! The server binds on all interfaces — it is meant to sit behind a
//! hosting provider's edge. Log verbosity follows `RUST_LOG`.

use pairlink::prelude::*;

#[tokio::main]
async fn main() -> Result<(), PairlinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(10000);

    let server = PairlinkServerBuilder::new()
        .bind(&format!("0.0.0.0:{port}"))
        .build(QrArtifactEncoder)
        .await?;

    tracing::info!(port, "pairlink server starting");
    server.run().await
}
