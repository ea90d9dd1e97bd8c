//! Shared value objects for saga variants.

use super::SagaDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display name of the person at the centre of a saga.
///
/// One representation serves every variant; historical schemas that
/// split or duplicated name fields across variants are deliberately not
/// mirrored here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectName(String);

impl SubjectName {
    /// Creates a validated subject name.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::InvalidSubject`] when the trimmed name
    /// is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, SagaDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(SagaDomainError::InvalidSubject(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubjectName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credit amount awarded to the facilitating party on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounty(i64);

impl Bounty {
    /// Creates a validated positive bounty.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::InvalidBounty`] when the amount is not
    /// positive.
    pub const fn new(amount: i64) -> Result<Self, SagaDomainError> {
        if amount <= 0 {
            return Err(SagaDomainError::InvalidBounty(amount));
        }
        Ok(Self(amount))
    }

    /// Returns the amount in credit units.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Bounty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
