//! In-memory repositories for saga tests and single-process use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::saga::{
    domain::{
        ConnectionRequest, ConnectionRequestId, Offer, OfferId, OfferStatus, Opportunity,
        OpportunityId, OpportunityStatus, SubjectName,
    },
    ports::{
        ConnectionRequestRepository, OfferRepository, OpportunityRepository, SagaRepositoryError,
        SagaRepositoryResult,
    },
};

fn lock_error(err: impl std::fmt::Display) -> SagaRepositoryError {
    SagaRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Thread-safe in-memory opportunity repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOpportunityRepository {
    state: Arc<RwLock<HashMap<OpportunityId, Opportunity>>>,
}

impl InMemoryOpportunityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OpportunityRepository for InMemoryOpportunityRepository {
    async fn store(&self, opportunity: &Opportunity) -> SagaRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&opportunity.id()) {
            return Err(SagaRepositoryError::DuplicateInstance(
                opportunity.id().into_inner(),
            ));
        }
        state.insert(opportunity.id(), opportunity.clone());
        Ok(())
    }

    async fn update(&self, opportunity: &Opportunity) -> SagaRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&opportunity.id()) {
            return Err(SagaRepositoryError::NotFound(opportunity.id().into_inner()));
        }
        state.insert(opportunity.id(), opportunity.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OpportunityId) -> SagaRepositoryResult<Option<Opportunity>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_open_by_subject(
        &self,
        subject: &SubjectName,
    ) -> SagaRepositoryResult<Vec<Opportunity>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|opportunity| {
                opportunity.status() == OpportunityStatus::Open
                    && opportunity.subject() == subject
            })
            .cloned()
            .collect())
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> SagaRepositoryResult<Vec<Opportunity>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|opportunity| opportunity.is_overdue(now))
            .cloned()
            .collect())
    }
}

/// Thread-safe in-memory connection-request repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectionRequestRepository {
    state: Arc<RwLock<HashMap<ConnectionRequestId, ConnectionRequest>>>,
}

impl InMemoryConnectionRequestRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRequestRepository for InMemoryConnectionRequestRepository {
    async fn store(&self, request: &ConnectionRequest) -> SagaRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&request.id()) {
            return Err(SagaRepositoryError::DuplicateInstance(
                request.id().into_inner(),
            ));
        }
        state.insert(request.id(), request.clone());
        Ok(())
    }

    async fn update(&self, request: &ConnectionRequest) -> SagaRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&request.id()) {
            return Err(SagaRepositoryError::NotFound(request.id().into_inner()));
        }
        state.insert(request.id(), request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: ConnectionRequestId,
    ) -> SagaRepositoryResult<Option<ConnectionRequest>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_overdue(
        &self,
        now: DateTime<Utc>,
    ) -> SagaRepositoryResult<Vec<ConnectionRequest>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|request| request.is_overdue(now))
            .cloned()
            .collect())
    }
}

/// Thread-safe in-memory offer repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOfferRepository {
    state: Arc<RwLock<HashMap<OfferId, Offer>>>,
}

impl InMemoryOfferRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfferRepository for InMemoryOfferRepository {
    async fn store(&self, offer: &Offer) -> SagaRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&offer.id()) {
            return Err(SagaRepositoryError::DuplicateInstance(
                offer.id().into_inner(),
            ));
        }
        state.insert(offer.id(), offer.clone());
        Ok(())
    }

    async fn update(&self, offer: &Offer) -> SagaRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&offer.id()) {
            return Err(SagaRepositoryError::NotFound(offer.id().into_inner()));
        }
        state.insert(offer.id(), offer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OfferId) -> SagaRepositoryResult<Option<Offer>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_by_status(&self, status: OfferStatus) -> SagaRepositoryResult<Vec<Offer>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|offer| offer.status() == status)
            .cloned()
            .collect())
    }
}
