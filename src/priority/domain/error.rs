//! Domain error types for the priority ledger.

use super::{PriorityItemId, PriorityStatus};
use thiserror::Error;

/// Errors raised by priority ledger domain transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriorityDomainError {
    /// The item has already reached a terminal state.
    #[error("priority item {id} is already resolved ({status})")]
    AlreadyResolved {
        /// The resolved item.
        id: PriorityItemId,
        /// Its terminal status.
        status: PriorityStatus,
    },

    /// A dormant item cannot be proactively surfaced again.
    #[error("priority item {0} is dormant and suppressed from presentation")]
    DormancySuppressed(PriorityItemId),

    /// Reactivation requires a dormant item.
    #[error("priority item {id} is {status}, not dormant")]
    NotDormant {
        /// The item that was not dormant.
        id: PriorityItemId,
        /// Its current status.
        status: PriorityStatus,
    },

    /// An item type string did not match a known variant.
    #[error("invalid priority item type: '{0}'")]
    InvalidItemType(String),

    /// A status string did not match a known variant.
    #[error("invalid priority status: '{0}'")]
    InvalidStatus(String),
}
