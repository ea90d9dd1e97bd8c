//! Identifier newtypes shared across engine modules.
//!
//! Per-module identifiers (task, message, saga, ledger) live in their
//! owning domain modules; the types here are the cross-cutting ones that
//! almost every component references.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a platform member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID.
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for UserId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when an agent kind string is empty or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid agent kind: '{0}'")]
pub struct InvalidAgentKind(
    /// The rejected raw value.
    pub String,
);

/// Normalized identifier for a class of decision-making agent.
///
/// Agent kinds name the worker type that owns a task or authored an
/// outbound message (for example `research`, `matchmaker`, `concierge`).
/// They are lower-case, non-empty, and contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentKind(String);

impl AgentKind {
    /// Creates a validated agent kind.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidAgentKind`] when the value is empty or contains
    /// whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidAgentKind> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(InvalidAgentKind(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the agent kind as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creates an agent kind for an engine-internal component.
    ///
    /// Component names are compile-time constants that already satisfy
    /// the validation rules, so this path skips them.
    pub(crate) fn internal(value: &'static str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for AgentKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentKind, UserId};

    #[test]
    fn user_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn agent_kind_normalizes_case_and_padding() {
        let kind = AgentKind::new("  Matchmaker ").expect("valid agent kind");
        assert_eq!(kind.as_str(), "matchmaker");
    }

    #[test]
    fn agent_kind_rejects_empty_and_spaced_values() {
        assert!(AgentKind::new("   ").is_err());
        assert!(AgentKind::new("two words").is_err());
    }
}
