//! Core protocol types for Pairlink's wire format.
//!
//! This module defines every type that travels "on the wire" — the
//! structures that get serialized to JSON, sent over the message channel,
//! and deserialized on the other side.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Which side of a pairing a connection is.
///
/// A role is assigned exactly once, when the connection successfully
/// registers (PC) or joins (mobile); there is no mid-session role change.
/// An unbound connection simply has no `Role` yet — that absence is modeled
/// as `Option<Role>` by the layers above, not as a third variant here,
/// because "unbound" never appears on the wire.
///
/// `#[serde(rename_all = "lowercase")]` makes the JSON representation
/// `"pc"` / `"mobile"`, which is what the relayed message's `from` field
/// carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pc,
    Mobile,
}

impl Role {
    /// The other side of the pairing. `pc ↔ mobile`.
    pub fn peer(self) -> Role {
        match self {
            Self::Pc => Self::Mobile,
            Self::Mobile => Self::Pc,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pc => write!(f, "pc"),
            Self::Mobile => write!(f, "mobile"),
        }
    }
}

/// The pairing code — a 6-digit numeric string, the sole lookup key for a
/// session.
///
/// A "newtype wrapper" around `String`, same pattern as the ids elsewhere
/// in the workspace: you can't accidentally pass an arbitrary string where
/// a code is expected, and function signatures stay readable.
///
/// `#[serde(transparent)]` means the code serializes as a plain JSON
/// string (`"482913"`), not as a wrapper object.
///
/// Note that a `SessionCode` deserialized from the wire is *untrusted* —
/// a mobile can send any string as `code`. Lookup simply fails for values
/// that never came out of the registry's generator; [`is_well_formed`]
/// exists for tests and diagnostics, not as an admission check.
///
/// [`is_well_formed`]: SessionCode::is_well_formed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Wraps a string as a session code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the code has the shape the generator produces:
    /// exactly six ASCII digits.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 6 && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ClientMessage — what clients send
// ---------------------------------------------------------------------------

/// Messages a client can send to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "register-mobile", "code": "482913" }` rather than a nested
/// wrapper. `rename_all = "kebab-case"` turns `RegisterPc` into
/// `"register-pc"` and so on, matching what the browser clients emit.
///
/// Any JSON whose `type` is not one of these tags fails to deserialize,
/// which the server treats as "silently discard".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Application-level keep-alive. Answered immediately with
    /// [`ServerMessage::Pong`], in any connection state. Distinct from the
    /// transport-level liveness probe — both run at the same time.
    Ping,

    /// "I am a PC; create a session for me." No payload — the server
    /// invents the code.
    RegisterPc,

    /// "I am a mobile; attach me to the session with this code."
    RegisterMobile { code: SessionCode },

    /// An application message to relay to the paired peer. All fields are
    /// optional on the wire; missing ones are forwarded as explicit nulls.
    Message {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        file: Option<String>,
        #[serde(default)]
        filename: Option<String>,
    },

    /// "End the pairing for both of us."
    Logout,
}

// ---------------------------------------------------------------------------
// ServerMessage — what the server sends
// ---------------------------------------------------------------------------

/// Messages the server sends to a client, as replies or peer notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Reply to [`ClientMessage::Ping`].
    Pong,

    /// Reply to a successful `register-pc`: the pairing code plus the
    /// scannable artifact encoding `connect:<code>`. The artifact bytes are
    /// opaque to this layer — whatever the configured encoder produced.
    Registered { code: SessionCode, artifact: Vec<u8> },

    /// Reply to the mobile after a successful `register-mobile`.
    Connected,

    /// Reply to the mobile when `register-mobile` hits a pairing conflict:
    /// unknown code, no PC bound, or the mobile slot already taken. The
    /// only checked, recoverable failure in the protocol.
    Error { message: String },

    /// A relayed application message. `from` is the *sender's* role, so the
    /// receiver knows which side produced it. Absent fields are serialized
    /// as explicit nulls.
    Message {
        from: Role,
        content: Option<String>,
        file: Option<String>,
        filename: Option<String>,
    },

    /// Notification that the pairing is ending — sent to the party that did
    /// *not* initiate the logout (or whose peer disconnected abruptly).
    Logout,

    /// Notification to the PC that its mobile has joined.
    PeerConnected,
}

// =========================================================================
// Tests
// =========================================================================
