//! Queue maintenance and presentation tracking for priority items.

use crate::identity::UserId;
use crate::priority::{
    domain::{
        ItemSummary, PriorityDomainError, PriorityItem, PriorityItemId, PriorityItemType,
        PriorityKey, Score, ScoreInputs,
    },
    ports::{PriorityRepository, PriorityRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Request payload for deriving or refreshing a priority item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertPriorityRequest {
    /// User whose queue the item belongs to.
    pub user_id: UserId,
    /// Kind of referenced entity.
    pub item_type: PriorityItemType,
    /// Identifier of the referenced entity.
    pub item_id: Uuid,
    /// Weighted scoring inputs.
    pub score: ScoreInputs,
    /// Denormalized display fields.
    pub summary: ItemSummary,
}

impl UpsertPriorityRequest {
    /// Returns the natural key the request targets.
    #[must_use]
    pub const fn key(&self) -> PriorityKey {
        PriorityKey {
            user_id: self.user_id,
            item_type: self.item_type,
            item_id: self.item_id,
        }
    }
}

/// Outcome of an upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// A new item entered the queue.
    Inserted(PriorityItem),
    /// An existing item's score and summary were refreshed.
    Refreshed(PriorityItem),
    /// The key was already resolved; nothing changed.
    AlreadyResolved(PriorityItem),
}

impl UpsertOutcome {
    /// Returns the item the outcome refers to.
    #[must_use]
    pub const fn item(&self) -> &PriorityItem {
        match self {
            Self::Inserted(item) | Self::Refreshed(item) | Self::AlreadyResolved(item) => item,
        }
    }
}

/// Service-level errors for priority ledger operations.
#[derive(Debug, Error)]
pub enum PriorityServiceError {
    /// Domain transition failed.
    #[error(transparent)]
    Domain(#[from] PriorityDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] PriorityRepositoryError),
    /// The referenced item does not exist.
    #[error("priority item not found: {0}")]
    NotFound(PriorityItemId),
}

/// Result type for priority ledger service operations.
pub type PriorityServiceResult<T> = Result<T, PriorityServiceError>;

/// Priority ledger orchestration service.
#[derive(Clone)]
pub struct PriorityLedgerService<R, C>
where
    R: PriorityRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> PriorityLedgerService<R, C>
where
    R: PriorityRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new priority ledger service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Derives an item into the queue, or refreshes the existing row.
    ///
    /// Re-deriving a resolved key is a no-op; re-deriving a live key
    /// refreshes score and summary while preserving presentation state.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::Repository`] when persistence
    /// fails.
    pub async fn upsert_priority(
        &self,
        request: UpsertPriorityRequest,
    ) -> PriorityServiceResult<UpsertOutcome> {
        let key = request.key();
        let score = Score::weigh(request.score);

        if let Some(existing) = self.repository.find_by_key(&key).await? {
            return self.refresh_existing(existing, score, request.summary).await;
        }

        let item = PriorityItem::new(key, score, request.summary.clone(), &*self.clock);
        match self.repository.insert(&item).await {
            Ok(()) => Ok(UpsertOutcome::Inserted(item)),
            Err(PriorityRepositoryError::DuplicateKey(_)) => {
                // Lost a derivation race; fall back to refreshing the row
                // the winner inserted.
                let existing = self
                    .repository
                    .find_by_key(&key)
                    .await?
                    .ok_or(PriorityServiceError::NotFound(item.id()))?;
                self.refresh_existing(existing, score, request.summary).await
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn refresh_existing(
        &self,
        mut existing: PriorityItem,
        score: Score,
        summary: ItemSummary,
    ) -> PriorityServiceResult<UpsertOutcome> {
        if existing.status().is_terminal() {
            return Ok(UpsertOutcome::AlreadyResolved(existing));
        }
        existing.refresh(score, summary, &*self.clock);
        self.repository.update(&existing).await?;
        Ok(UpsertOutcome::Refreshed(existing))
    }

    /// Records one presentation of an item to its user.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::NotFound`] for unknown items and
    /// [`PriorityServiceError::Domain`] for terminal or dormant items.
    pub async fn mark_presented(
        &self,
        id: PriorityItemId,
    ) -> PriorityServiceResult<PriorityItem> {
        let mut item = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(PriorityServiceError::NotFound(id))?;
        item.record_presentation(&*self.clock)?;
        self.repository.update(&item).await?;
        Ok(item)
    }

    /// Marks an item as acted upon. A no-op for already-resolved items.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::NotFound`] for unknown items.
    pub async fn mark_actioned(&self, id: PriorityItemId) -> PriorityServiceResult<PriorityItem> {
        let mut item = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(PriorityServiceError::NotFound(id))?;
        item.action(&*self.clock);
        self.repository.update(&item).await?;
        Ok(item)
    }

    /// Marks an item as expired. A no-op for already-resolved items.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::NotFound`] for unknown items.
    pub async fn mark_expired(&self, id: PriorityItemId) -> PriorityServiceResult<PriorityItem> {
        let mut item = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(PriorityServiceError::NotFound(id))?;
        item.expire(&*self.clock);
        self.repository.update(&item).await?;
        Ok(item)
    }

    /// Marks the item with the given natural key as acted upon.
    ///
    /// Saga completion uses this path; a missing key resolves to `None`
    /// so redelivered completion events stay safe.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::Repository`] when persistence
    /// fails.
    pub async fn mark_actioned_by_key(
        &self,
        key: &PriorityKey,
    ) -> PriorityServiceResult<Option<PriorityItem>> {
        let Some(mut item) = self.repository.find_by_key(key).await? else {
            return Ok(None);
        };
        item.action(&*self.clock);
        self.repository.update(&item).await?;
        Ok(Some(item))
    }

    /// Marks the item with the given natural key as expired, if present.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::Repository`] when persistence
    /// fails.
    pub async fn mark_expired_by_key(
        &self,
        key: &PriorityKey,
    ) -> PriorityServiceResult<Option<PriorityItem>> {
        let Some(mut item) = self.repository.find_by_key(key).await? else {
            return Ok(None);
        };
        item.expire(&*self.clock);
        self.repository.update(&item).await?;
        Ok(Some(item))
    }

    /// Returns a dormant item to the active pool after a new signal.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::NotFound`] for unknown items and
    /// [`PriorityServiceError::Domain`] when the item is not dormant.
    pub async fn reactivate(&self, id: PriorityItemId) -> PriorityServiceResult<PriorityItem> {
        let mut item = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(PriorityServiceError::NotFound(id))?;
        item.reactivate(&*self.clock)?;
        self.repository.update(&item).await?;
        Ok(item)
    }

    /// Re-ranks and returns a user's surfaceable queue, highest value
    /// first.
    ///
    /// Rank assignment is an explicit service step so storage stays free
    /// of implicit side effects.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityServiceError::Repository`] when persistence
    /// fails.
    pub async fn ranked_queue(&self, user_id: UserId) -> PriorityServiceResult<Vec<PriorityItem>> {
        let mut items = self.repository.list_surfaceable_for_user(user_id).await?;
        for (position, item) in items.iter_mut().enumerate() {
            let rank = u32::try_from(position.saturating_add(1)).unwrap_or(u32::MAX);
            if item.rank() != rank {
                item.assign_rank(rank, &*self.clock);
                self.repository.update(item).await?;
            }
        }
        Ok(items)
    }
}
