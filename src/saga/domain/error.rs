//! Domain error types for the introduction sagas.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by saga domain transitions and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SagaDomainError {
    /// A lifecycle transition was attempted from an incompatible live
    /// state.
    #[error("{entity} {id} cannot move from {from} to {attempted}")]
    InvalidTransition {
        /// Saga variant name.
        entity: &'static str,
        /// The instance that rejected the transition.
        id: Uuid,
        /// Its current status.
        from: &'static str,
        /// The requested target status.
        attempted: &'static str,
    },

    /// The instance already reached a terminal state; redelivered
    /// transitions resolve to no-ops at the service layer.
    #[error("{entity} {id} is already terminal ({status})")]
    AlreadyTerminal {
        /// Saga variant name.
        entity: &'static str,
        /// The terminal instance.
        id: Uuid,
        /// Its terminal status.
        status: &'static str,
    },

    /// A subject name was empty.
    #[error("invalid subject name: '{0}'")]
    InvalidSubject(String),

    /// A bounty amount was zero or negative.
    #[error("invalid bounty amount: {0}")]
    InvalidBounty(i64),

    /// A status string did not match a known variant.
    #[error("invalid saga status: '{0}'")]
    InvalidStatus(String),
}
