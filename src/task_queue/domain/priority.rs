//! Dispatch priority shared by the task queue and message orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when parsing an invalid priority string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid dispatch priority: '{0}'")]
pub struct ParseDispatchPriorityError(
    /// The rejected raw value.
    pub String,
);

/// Dispatch priority band.
///
/// Declaration order doubles as dispatch order: urgent rows go first,
/// and the derived `Ord` matches the persisted rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPriority {
    /// Dispatch ahead of everything else.
    Urgent,
    /// Dispatch before routine work.
    High,
    /// Routine work.
    Medium,
    /// Dispatch only when nothing else is due.
    Low,
}

impl DispatchPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Returns the persisted rank; lower ranks dispatch first.
    #[must_use]
    pub const fn rank(self) -> i16 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }

    /// Reconstructs a priority from its persisted rank.
    ///
    /// # Errors
    ///
    /// Returns [`ParseDispatchPriorityError`] for unknown ranks.
    pub fn from_rank(rank: i16) -> Result<Self, ParseDispatchPriorityError> {
        match rank {
            0 => Ok(Self::Urgent),
            1 => Ok(Self::High),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Low),
            _ => Err(ParseDispatchPriorityError(rank.to_string())),
        }
    }
}

impl TryFrom<&str> for DispatchPriority {
    type Error = ParseDispatchPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseDispatchPriorityError(value.to_owned())),
        }
    }
}

impl fmt::Display for DispatchPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
