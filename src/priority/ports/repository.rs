//! Repository port for priority item persistence and queue lookup.

use crate::identity::UserId;
use crate::priority::domain::{PriorityItem, PriorityItemId, PriorityKey};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for priority repository operations.
pub type PriorityRepositoryResult<T> = Result<T, PriorityRepositoryError>;

/// Priority item persistence contract.
#[async_trait]
pub trait PriorityRepository: Send + Sync {
    /// Stores a new item.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityRepositoryError::DuplicateKey`] when an item with
    /// the same `(user, item type, item id)` key already exists.
    async fn insert(&self, item: &PriorityItem) -> PriorityRepositoryResult<()>;

    /// Persists changes to an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityRepositoryError::NotFound`] when the item does
    /// not exist.
    async fn update(&self, item: &PriorityItem) -> PriorityRepositoryResult<()>;

    /// Finds an item by identifier.
    ///
    /// Returns `None` when the item does not exist.
    async fn find_by_id(&self, id: PriorityItemId) -> PriorityRepositoryResult<Option<PriorityItem>>;

    /// Finds an item by its natural key.
    ///
    /// Returns `None` when no item carries the key.
    async fn find_by_key(&self, key: &PriorityKey)
    -> PriorityRepositoryResult<Option<PriorityItem>>;

    /// Returns a user's surfaceable items (active or presented), highest
    /// score first, oldest first within equal scores.
    async fn list_surfaceable_for_user(
        &self,
        user_id: UserId,
    ) -> PriorityRepositoryResult<Vec<PriorityItem>>;
}

/// Errors returned by priority repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PriorityRepositoryError {
    /// An item with the same natural key already exists.
    #[error("duplicate priority key for user {user_id}", user_id = .0.user_id)]
    DuplicateKey(PriorityKey),

    /// The item was not found.
    #[error("priority item not found: {0}")]
    NotFound(PriorityItemId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PriorityRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
