//! Identifier types for the credit ledger domain.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditEventId(Uuid);

impl CreditEventId {
    /// Creates a new random ledger line identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ledger line identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CreditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for CreditEventId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CreditEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic key guaranteeing a ledger effect is applied at most once.
///
/// The key is a SHA-256 digest over the event type tag and the reference
/// entity identifier, so the same logical action always derives the same
/// key regardless of which worker performs it or how many times the
/// triggering event is redelivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Derives the key for an `(event type, reference id)` pair.
    #[must_use]
    pub fn derive(event_type_tag: &str, reference_id: Uuid) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(event_type_tag.as_bytes());
        hasher.update(b":");
        hasher.update(reference_id.as_bytes());
        let digest = hasher.finalize();
        let mut encoded = String::with_capacity(64);
        for byte in digest {
            encoded.push_str(&format!("{byte:02x}"));
        }
        Self(encoded)
    }

    /// Reconstructs a key from its persisted string form.
    #[must_use]
    pub const fn from_persisted(value: String) -> Self {
        Self(value)
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
