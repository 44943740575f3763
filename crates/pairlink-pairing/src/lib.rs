//! Pairing-session management for Pairlink.
//!
//! This crate owns the state behind the protocol:
//!
//! 1. **Rendezvous** — the [`SessionRegistry`] maps a 6-digit
//!    [`SessionCode`](pairlink_protocol::SessionCode) to a [`PairSession`]
//!    holding up to one PC and one mobile, and is the only place codes are
//!    generated (collision-checked) or sessions created/joined/deleted.
//! 2. **Peer delivery** — a [`PeerHandle`] is the registry's *non-owning*
//!    reference to a connection: the connection id plus the outbound
//!    command channel its writer task drains. Sends to a gone peer are
//!    silently dropped.
//! 3. **Liveness bookkeeping** — the [`ClientDirectory`] tracks every open
//!    connection's alive flag and implements the probe/evict cycle the
//!    monitor runs on a timer.
//! 4. **Artifact encoding** — the [`ArtifactEncoder`] trait turns a pairing
//!    payload string into scannable image bytes; the framework treats the
//!    output as opaque.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server layer (above)  ← handler mutates sessions, monitor sweeps the directory
//!     ↕
//! Pairing layer (this crate)  ← sessions, codes, peer channels, alive flags
//!     ↕
//! Protocol layer (below)  ← SessionCode, Role, ServerMessage types
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod directory;
mod encoder;
mod error;
mod peer;
mod registry;

pub use config::PairingConfig;
pub use directory::{ClientDirectory, ClientHandle};
pub use encoder::{ArtifactEncoder, PassthroughEncoder};
#[cfg(feature = "qr")]
pub use encoder::QrArtifactEncoder;
pub use error::PairingError;
pub use peer::{Outbound, PeerHandle, PeerSender};
pub use registry::{PairSession, SessionRegistry};
