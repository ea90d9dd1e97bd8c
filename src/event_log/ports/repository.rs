//! Repository ports for event and dead-letter persistence.

use crate::event_log::domain::{DeadLetter, DeadLetterId, Event, EventId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for event log repository operations.
pub type EventLogResult<T> = Result<T, EventLogRepositoryError>;

/// Event persistence contract. Append-only: there is no update or
/// delete.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogRepositoryError::DuplicateEvent`] when the event
    /// identifier already exists.
    async fn append(&self, event: &Event) -> EventLogResult<()>;

    /// Finds an event by identifier.
    ///
    /// Returns `None` when the event does not exist.
    async fn find_by_id(&self, id: EventId) -> EventLogResult<Option<Event>>;

    /// Returns the ordered event history for one aggregate, oldest
    /// first.
    async fn list_for_aggregate(&self, aggregate_id: Uuid) -> EventLogResult<Vec<Event>>;
}

/// Dead-letter persistence contract.
#[async_trait]
pub trait DeadLetterRepository: Send + Sync {
    /// Stores a dead-letter entry.
    async fn store(&self, letter: &DeadLetter) -> EventLogResult<()>;

    /// Finds an entry by identifier.
    ///
    /// Returns `None` when the entry does not exist.
    async fn find_by_id(&self, id: DeadLetterId) -> EventLogResult<Option<DeadLetter>>;

    /// Lists entries, oldest first, up to `limit`.
    async fn list(&self, limit: u32) -> EventLogResult<Vec<DeadLetter>>;

    /// Removes an entry after a successful manual replay.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogRepositoryError::DeadLetterNotFound`] when the
    /// entry does not exist.
    async fn remove(&self, id: DeadLetterId) -> EventLogResult<()>;
}

/// Errors returned by event log repository implementations.
#[derive(Debug, Clone, Error)]
pub enum EventLogRepositoryError {
    /// An event with the same identifier already exists.
    #[error("duplicate event identifier: {0}")]
    DuplicateEvent(EventId),

    /// The dead-letter entry was not found.
    #[error("dead letter not found: {0}")]
    DeadLetterNotFound(DeadLetterId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EventLogRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
