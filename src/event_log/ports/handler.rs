//! Subscriber contract for at-least-once event delivery.

use crate::event_log::domain::Event;
use async_trait::async_trait;
use thiserror::Error;

/// Errors a handler reports back to the log.
///
/// Transient failures are retried up to the delivery bound; business
/// failures skip straight to the dead-letter store since retrying cannot
/// fix them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler hit a recoverable condition (store or service
    /// unavailable).
    #[error("transient handler failure: {0}")]
    Transient(String),

    /// The handler hit an unrecoverable business condition.
    #[error("business rule violation: {0}")]
    Business(String),
}

/// Event subscriber.
///
/// Delivery is at-least-once and unordered relative to other aggregates,
/// so implementations must be idempotent: handling the same event twice
/// must produce the state of handling it once.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name used in logs and dead-letter error history.
    fn name(&self) -> &str;

    /// Returns `true` when the handler wants the event.
    fn interested_in(&self, event: &Event) -> bool;

    /// Processes one event.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Transient`] to request a retry or
    /// [`HandlerError::Business`] to park the event immediately.
    async fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}
