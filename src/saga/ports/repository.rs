//! Repository ports for saga persistence.

use crate::saga::domain::{
    ConnectionRequest, ConnectionRequestId, Offer, OfferId, OfferStatus, Opportunity,
    OpportunityId, SubjectName,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for saga repository operations.
pub type SagaRepositoryResult<T> = Result<T, SagaRepositoryError>;

/// Opportunity persistence contract.
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// Stores a new opportunity.
    ///
    /// # Errors
    ///
    /// Returns [`SagaRepositoryError::DuplicateInstance`] when the
    /// identifier already exists.
    async fn store(&self, opportunity: &Opportunity) -> SagaRepositoryResult<()>;

    /// Persists changes to an existing opportunity.
    ///
    /// # Errors
    ///
    /// Returns [`SagaRepositoryError::NotFound`] when the instance does
    /// not exist.
    async fn update(&self, opportunity: &Opportunity) -> SagaRepositoryResult<()>;

    /// Finds an opportunity by identifier.
    ///
    /// Returns `None` when the instance does not exist.
    async fn find_by_id(&self, id: OpportunityId) -> SagaRepositoryResult<Option<Opportunity>>;

    /// Returns open opportunities referencing the given prospect.
    ///
    /// Used to prevent double-booking one prospect across connectors.
    async fn list_open_by_subject(
        &self,
        subject: &SubjectName,
    ) -> SagaRepositoryResult<Vec<Opportunity>>;

    /// Returns live opportunities past their expiry deadline.
    async fn list_overdue(&self, now: DateTime<Utc>) -> SagaRepositoryResult<Vec<Opportunity>>;
}

/// Connection-request persistence contract.
#[async_trait]
pub trait ConnectionRequestRepository: Send + Sync {
    /// Stores a new connection request.
    ///
    /// # Errors
    ///
    /// Returns [`SagaRepositoryError::DuplicateInstance`] when the
    /// identifier already exists.
    async fn store(&self, request: &ConnectionRequest) -> SagaRepositoryResult<()>;

    /// Persists changes to an existing connection request.
    ///
    /// # Errors
    ///
    /// Returns [`SagaRepositoryError::NotFound`] when the instance does
    /// not exist.
    async fn update(&self, request: &ConnectionRequest) -> SagaRepositoryResult<()>;

    /// Finds a connection request by identifier.
    ///
    /// Returns `None` when the instance does not exist.
    async fn find_by_id(
        &self,
        id: ConnectionRequestId,
    ) -> SagaRepositoryResult<Option<ConnectionRequest>>;

    /// Returns live connection requests past their expiry deadline.
    async fn list_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> SagaRepositoryResult<Vec<ConnectionRequest>>;
}

/// Offer persistence contract.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Stores a new offer.
    ///
    /// # Errors
    ///
    /// Returns [`SagaRepositoryError::DuplicateInstance`] when the
    /// identifier already exists.
    async fn store(&self, offer: &Offer) -> SagaRepositoryResult<()>;

    /// Persists changes to an existing offer.
    ///
    /// # Errors
    ///
    /// Returns [`SagaRepositoryError::NotFound`] when the instance does
    /// not exist.
    async fn update(&self, offer: &Offer) -> SagaRepositoryResult<()>;

    /// Finds an offer by identifier.
    ///
    /// Returns `None` when the instance does not exist.
    async fn find_by_id(&self, id: OfferId) -> SagaRepositoryResult<Option<Offer>>;

    /// Returns offers currently in the given status.
    async fn list_by_status(&self, status: OfferStatus) -> SagaRepositoryResult<Vec<Offer>>;
}

/// Errors returned by saga repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SagaRepositoryError {
    /// An instance with the same identifier already exists.
    #[error("duplicate saga instance: {0}")]
    DuplicateInstance(Uuid),

    /// The instance was not found.
    #[error("saga instance not found: {0}")]
    NotFound(Uuid),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SagaRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
