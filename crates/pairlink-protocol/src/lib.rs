//! Wire protocol for Pairlink.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Role`],
//!   [`SessionCode`]) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and pairing
//! (session registry). It doesn't know about connections or sessions — it
//! only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage/ServerMessage) → Pairing (sessions)
//! ```
//!
//! # Wire format
//!
//! Every message is a JSON object with a `type` tag and type-specific
//! fields, e.g. `{"type":"register-mobile","code":"482913"}`. A payload
//! that fails to parse — including one with an unrecognized `type` — is
//! dropped by the server without a reply; that contract lives in the
//! handler, but the decode error it keys on originates here.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, Role, ServerMessage, SessionCode};
