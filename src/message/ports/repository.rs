//! Repository port for queued message persistence and dispatch lookup.

use crate::identity::UserId;
use crate::message::domain::{
    MessageContext, MessageId, MessagePriority, QueuedMessage, SequenceId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for message repository operations.
pub type MessageRepositoryResult<T> = Result<T, MessageRepositoryError>;

/// Active-queue depth for one priority band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQueueDepth {
    /// Priority band.
    pub priority: MessagePriority,
    /// Number of queued or approved messages.
    pub count: u64,
}

/// Queued message persistence contract.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stores a new message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::DuplicateMessage`] when the
    /// identifier already exists.
    async fn store(&self, message: &QueuedMessage) -> MessageRepositoryResult<()>;

    /// Persists changes to an existing message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageRepositoryError::NotFound`] when the message does
    /// not exist.
    async fn update(&self, message: &QueuedMessage) -> MessageRepositoryResult<()>;

    /// Finds a message by identifier.
    ///
    /// Returns `None` when the message does not exist.
    async fn find_by_id(&self, id: MessageId) -> MessageRepositoryResult<Option<QueuedMessage>>;

    /// Returns due sendable messages, highest priority first, oldest
    /// schedule first within a band, up to `limit`.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>>;

    /// Attempts the dispatch lease: flips a sendable row to
    /// `processing` only when it is still sendable.
    ///
    /// Returns `true` when this caller won the lease.
    async fn claim(&self, id: MessageId, now: DateTime<Utc>) -> MessageRepositoryResult<bool>;

    /// Counts send units for a user with `sent_at` at or after `since`.
    ///
    /// A multi-part sequence counts as one unit regardless of how many
    /// members have gone out.
    async fn sent_unit_count_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> MessageRepositoryResult<u64>;

    /// Returns all members of a sequence ordered by position.
    async fn sequence_members(
        &self,
        sequence_id: SequenceId,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>>;

    /// Returns a user's still-sendable messages about the given entity.
    async fn find_active_for_context(
        &self,
        user_id: UserId,
        context: MessageContext,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>>;

    /// Returns active-queue depths grouped by priority.
    async fn queued_depths(&self) -> MessageRepositoryResult<Vec<MessageQueueDepth>>;
}

/// Errors returned by message repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MessageRepositoryError {
    /// A message with the same identifier already exists.
    #[error("duplicate message identifier: {0}")]
    DuplicateMessage(MessageId),

    /// The message was not found.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MessageRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
