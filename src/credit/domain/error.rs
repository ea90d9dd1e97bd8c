//! Domain error types for the credit ledger.

use thiserror::Error;

/// Errors raised by credit ledger domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreditDomainError {
    /// Ledger lines must move the balance; zero-amount lines are rejected.
    #[error("credit amount must be non-zero")]
    ZeroAmount,

    /// An event type string did not match a known variant.
    #[error("invalid credit event type: '{0}'")]
    InvalidEventType(String),

    /// A reference type string did not match a known variant.
    #[error("invalid credit reference type: '{0}'")]
    InvalidReferenceType(String),
}
