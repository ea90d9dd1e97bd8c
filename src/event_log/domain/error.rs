//! Domain error types for the event log.

use thiserror::Error;

/// Errors raised by event log domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventDomainError {
    /// An aggregate type string did not match a known variant.
    #[error("invalid aggregate type: '{0}'")]
    InvalidAggregateType(String),

    /// A dead-letter kind string did not match a known variant.
    #[error("invalid dead letter kind: '{0}'")]
    InvalidDeadLetterKind(String),
}
