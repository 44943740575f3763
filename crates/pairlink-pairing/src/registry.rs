//! The session registry: every live pairing, keyed by its code.
//!
//! This is the central piece of the pairing layer. It's responsible for:
//! - Generating pairing codes that are unique among live sessions
//! - Creating a session when a PC registers
//! - The checked rendezvous when a mobile joins
//! - Idempotent deletion, so racing teardown paths are safe
//!
//! # Concurrency note
//!
//! `SessionRegistry` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. The server wraps it in a single
//! `tokio::sync::Mutex` and performs each lookup + slot mutation +
//! notification enqueue under one lock acquisition, which re-establishes
//! the atomicity the protocol needs on a multithreaded runtime. Keeping
//! the registry itself synchronous makes that property easy to audit.

use std::collections::HashMap;

use pairlink_protocol::{Role, SessionCode};
use rand::Rng;

use crate::{PairingError, PeerHandle};

/// How many generation attempts before giving up on finding a free code.
///
/// With 900 000 possible codes this only trips when the registry is
/// essentially full; the bound exists so a pathological deployment fails
/// with a real error instead of spinning.
const MAX_CODE_ATTEMPTS: u32 = 1024;

/// One pairing: at most one PC and one mobile under one code.
///
/// ```text
/// register-pc ──→ { pc: Some, mobile: None } ──register-mobile──→ { pc: Some, mobile: Some }
///                        │                                               │
///                        └──────────── logout / disconnect ──────────────┘
///                                           │
///                                           ▼
///                                       (deleted)
/// ```
///
/// Slots only ever go `None → Some`; the session is deleted as a whole
/// rather than ever un-binding a member.
#[derive(Debug, Clone)]
pub struct PairSession {
    code: SessionCode,
    pc: Option<PeerHandle>,
    mobile: Option<PeerHandle>,
}

impl PairSession {
    fn new(code: SessionCode, pc: PeerHandle) -> Self {
        Self {
            code,
            pc: Some(pc),
            mobile: None,
        }
    }

    /// The session's code.
    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    /// The member bound under the given role, if any.
    pub fn member(&self, role: Role) -> Option<&PeerHandle> {
        match role {
            Role::Pc => self.pc.as_ref(),
            Role::Mobile => self.mobile.as_ref(),
        }
    }

    /// The *other* member relative to the given role — who a message from
    /// `role` should be relayed to.
    pub fn peer_of(&self, role: Role) -> Option<&PeerHandle> {
        self.member(role.peer())
    }
}

/// Process-wide store mapping pairing codes to live sessions.
///
/// All session mutation goes through [`create`](Self::create),
/// [`join`](Self::join), and [`delete`](Self::delete) — the relay and the
/// liveness monitor only ever read.
pub struct SessionRegistry {
    sessions: HashMap<SessionCode, PairSession>,
}

impl SessionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Creates a session for a registering PC and returns its fresh code.
    ///
    /// The code is guaranteed not to be in use by any live session at the
    /// time of creation: generation retries on collision. (The original
    /// deployment skipped this check — a collision would silently alias two
    /// PCs under one code and let a stranger's mobile hijack the pairing.)
    ///
    /// # Errors
    /// Returns [`PairingError::CodeSpaceExhausted`] if no free code is
    /// found within the attempt bound.
    pub fn create(
        &mut self,
        pc: PeerHandle,
    ) -> Result<SessionCode, PairingError> {
        let code = self.generate_code()?;
        self.sessions
            .insert(code.clone(), PairSession::new(code.clone(), pc));
        tracing::info!(%code, "session created");
        Ok(code)
    }

    /// The checked rendezvous: binds a mobile into the session for `code`.
    ///
    /// Succeeds iff the session exists, has a PC, and its mobile slot is
    /// empty. On success returns a clone of the PC's handle so the caller
    /// can notify it; on failure nothing changes.
    ///
    /// # Errors
    /// - [`PairingError::UnknownCode`] — no session under this code
    /// - [`PairingError::PeerMissing`] — session has no PC bound
    /// - [`PairingError::SlotOccupied`] — a mobile is already bound
    pub fn join(
        &mut self,
        code: &SessionCode,
        mobile: PeerHandle,
    ) -> Result<PeerHandle, PairingError> {
        let session = self
            .sessions
            .get_mut(code)
            .ok_or_else(|| PairingError::UnknownCode(code.clone()))?;

        let pc = session
            .pc
            .as_ref()
            .ok_or_else(|| PairingError::PeerMissing(code.clone()))?
            .clone();

        if session.mobile.is_some() {
            return Err(PairingError::SlotOccupied(code.clone()));
        }

        session.mobile = Some(mobile);
        tracing::info!(%code, "mobile joined session");
        Ok(pc)
    }

    /// Looks up a session by code.
    pub fn get(&self, code: &SessionCode) -> Option<&PairSession> {
        self.sessions.get(code)
    }

    /// Removes a session. Idempotent — deleting an absent code is a no-op,
    /// so the logout grace task and a racing disconnect can both run this.
    pub fn delete(&mut self, code: &SessionCode) {
        if self.sessions.remove(code).is_some() {
            tracing::info!(%code, "session deleted");
        }
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no live sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Generates a 6-digit code not currently in use by any live session.
    fn generate_code(&self) -> Result<SessionCode, PairingError> {
        let mut rng = rand::rng();
        for _ in 0..MAX_CODE_ATTEMPTS {
            // 100000..=999999 — always six digits, no leading zero.
            let candidate =
                SessionCode::new(rng.random_range(100_000..1_000_000).to_string());
            if !self.sessions.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(PairingError::CodeSpaceExhausted)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
