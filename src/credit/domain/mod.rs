//! Domain model for the credit ledger.
//!
//! Ledger lines are write-once; the cached per-user balance is a read
//! optimization derived from processed lines and is never authoritative.

mod error;
mod event;
mod ids;

pub use error::CreditDomainError;
pub use event::{
    CreditAmount, CreditEvent, CreditEventType, CreditReferenceType, NewCreditEvent,
    PersistedCreditEventData,
};
pub use ids::{CreditEventId, IdempotencyKey};
