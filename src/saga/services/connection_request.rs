//! Connection-request lifecycle orchestration.

use super::{SagaServiceError, SagaServiceResult};
use crate::config::SagaConfig;
use crate::credit::domain::{CreditEventType, CreditReferenceType};
use crate::event_log::domain::{AggregateType, EventPayload};
use crate::identity::UserId;
use crate::priority::domain::{ItemSummary, PriorityItemType, ScoreInputs};
use crate::saga::{
    domain::{
        Bounty, ConnectionRequest, ConnectionRequestId, NewConnectionRequest, SagaDomainError,
        SubjectName,
    },
    ports::{ConnectionRequestRepository, PriorityDerivation, SagaEffects},
};
use crate::task_queue::domain::DispatchPriority;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for opening a connection request.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenConnectionRequest {
    /// Member being asked for an introduction.
    pub target_id: UserId,
    /// Display name of the requesting third party.
    pub requester: String,
    /// Bounty override; `None` takes the configured default.
    pub bounty: Option<i64>,
}

/// Connection-request saga orchestration service.
#[derive(Clone)]
pub struct ConnectionRequestService<R, E, C>
where
    R: ConnectionRequestRepository,
    E: SagaEffects,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    effects: Arc<E>,
    clock: Arc<C>,
    config: SagaConfig,
}

impl<R, E, C> ConnectionRequestService<R, E, C>
where
    R: ConnectionRequestRepository,
    E: SagaEffects,
    C: Clock + Send + Sync,
{
    /// Creates a new connection-request service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        effects: Arc<E>,
        clock: Arc<C>,
        config: SagaConfig,
    ) -> Self {
        Self {
            repository,
            effects,
            clock,
            config,
        }
    }

    /// Opens a connection request and derives the member's priority
    /// item.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] when validation, persistence, or a
    /// side effect fails.
    pub async fn open(
        &self,
        request: OpenConnectionRequest,
    ) -> SagaServiceResult<ConnectionRequest> {
        let requester = SubjectName::new(request.requester)?;
        let bounty = Bounty::new(request.bounty.unwrap_or(self.config.default_bounty))?;
        let ttl = i64::try_from(self.config.opportunity_ttl_secs).unwrap_or(i64::MAX);
        let connection_request = ConnectionRequest::new(
            NewConnectionRequest {
                target_id: request.target_id,
                requester: requester.clone(),
                bounty,
                expires_at: self.clock.utc() + Duration::seconds(ttl),
            },
            &*self.clock,
        );
        self.repository.store(&connection_request).await?;

        self.effects
            .publish(
                EventPayload::ConnectionRequestOpened {
                    request_id: connection_request.id().into_inner(),
                    target_id: connection_request.target_id(),
                },
                connection_request.id().into_inner(),
                AggregateType::ConnectionRequest,
            )
            .await?;
        self.effects
            .upsert_priority(PriorityDerivation {
                user_id: connection_request.target_id(),
                item_type: PriorityItemType::ConnectionRequest,
                item_id: connection_request.id().into_inner(),
                score: ScoreInputs {
                    base: bounty.amount(),
                    ..ScoreInputs::default()
                },
                summary: ItemSummary {
                    headline: format!("{requester} asked to be introduced to you"),
                    counterpart_name: Some(requester.as_str().to_owned()),
                    bounty: Some(bounty.amount()),
                },
            })
            .await?;
        Ok(connection_request)
    }

    /// The member accepts the request.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn accept(&self, id: ConnectionRequestId) -> SagaServiceResult<ConnectionRequest> {
        let mut request = self.load(id).await?;
        match request.accept(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(request),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&request).await?;
        self.effects
            .publish(
                EventPayload::ConnectionRequestResolved {
                    request_id: id.into_inner(),
                    accepted: true,
                },
                id.into_inner(),
                AggregateType::ConnectionRequest,
            )
            .await?;
        Ok(request)
    }

    /// The member declines; the priority item is resolved.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn decline(&self, id: ConnectionRequestId) -> SagaServiceResult<ConnectionRequest> {
        let mut request = self.load(id).await?;
        match request.decline(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(request),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&request).await?;
        self.effects
            .publish(
                EventPayload::ConnectionRequestResolved {
                    request_id: id.into_inner(),
                    accepted: false,
                },
                id.into_inner(),
                AggregateType::ConnectionRequest,
            )
            .await?;
        self.effects
            .mark_priority_actioned(
                request.target_id(),
                PriorityItemType::ConnectionRequest,
                id.into_inner(),
            )
            .await?;
        Ok(request)
    }

    /// The introduction happened: applies the completion unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances, live-state
    /// violations, or failed side effects.
    pub async fn complete(&self, id: ConnectionRequestId) -> SagaServiceResult<ConnectionRequest> {
        let mut request = self.load(id).await?;
        match request.complete(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => {
                tracing::debug!(request = %id, "completion replay on terminal instance");
                return Ok(request);
            }
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&request).await?;

        self.effects
            .mark_priority_actioned(
                request.target_id(),
                PriorityItemType::ConnectionRequest,
                id.into_inner(),
            )
            .await?;
        self.effects
            .award_bounty(
                request.target_id(),
                CreditEventType::ConnectionBounty,
                CreditReferenceType::ConnectionRequest,
                id.into_inner(),
                request.bounty().amount(),
            )
            .await?;
        self.effects
            .notify(
                request.target_id(),
                format!(
                    "Your introduction to {} is complete; {} credits are on the way.",
                    request.requester(),
                    request.bounty()
                ),
                DispatchPriority::High,
            )
            .await?;
        self.effects
            .publish(
                EventPayload::ConnectionRequestCompleted {
                    request_id: id.into_inner(),
                    bounty: request.bounty().amount(),
                },
                id.into_inner(),
                AggregateType::ConnectionRequest,
            )
            .await?;
        Ok(request)
    }

    /// Expires live requests past their deadline. Returns how many were
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] when selection, persistence, or a
    /// side effect fails.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> SagaServiceResult<u32> {
        let overdue = self.repository.list_overdue(now).await?;
        let mut expired = 0;
        for mut request in overdue {
            match request.expire(&*self.clock) {
                Ok(()) => {}
                Err(SagaDomainError::AlreadyTerminal { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
            self.repository.update(&request).await?;
            self.effects
                .mark_priority_expired(
                    request.target_id(),
                    PriorityItemType::ConnectionRequest,
                    request.id().into_inner(),
                )
                .await?;
            expired += 1;
        }
        Ok(expired)
    }

    /// Operator surface: force-closes a stuck instance as expired.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances.
    pub async fn force_close(&self, id: ConnectionRequestId) -> SagaServiceResult<ConnectionRequest> {
        let mut request = self.load(id).await?;
        match request.expire(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(request),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&request).await?;
        self.effects
            .mark_priority_expired(
                request.target_id(),
                PriorityItemType::ConnectionRequest,
                id.into_inner(),
            )
            .await?;
        tracing::warn!(request = %id, "connection request force-closed by operator");
        Ok(request)
    }

    async fn load(&self, id: ConnectionRequestId) -> SagaServiceResult<ConnectionRequest> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(SagaServiceError::NotFound(id.into_inner()))
    }
}
