//! Opportunity lifecycle orchestration.

use super::{SagaServiceError, SagaServiceResult};
use crate::config::SagaConfig;
use crate::credit::domain::{CreditEventType, CreditReferenceType};
use crate::event_log::domain::{AggregateType, EventPayload};
use crate::identity::UserId;
use crate::priority::domain::{ItemSummary, PriorityItemType, ScoreInputs};
use crate::saga::{
    domain::{Bounty, NewOpportunity, Opportunity, OpportunityId, SagaDomainError, SubjectName},
    ports::{OpportunityRepository, PriorityDerivation, SagaEffects},
};
use crate::task_queue::domain::DispatchPriority;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for opening an opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenOpportunityRequest {
    /// Connector being asked to make the introduction.
    pub connector_id: UserId,
    /// Member the introduction is requested on behalf of.
    pub requester_id: UserId,
    /// Prospect display name.
    pub subject: String,
    /// Bounty override; `None` takes the configured default.
    pub bounty: Option<i64>,
}

/// Opportunity saga orchestration service.
#[derive(Clone)]
pub struct OpportunityService<R, E, C>
where
    R: OpportunityRepository,
    E: SagaEffects,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    effects: Arc<E>,
    clock: Arc<C>,
    config: SagaConfig,
}

impl<R, E, C> OpportunityService<R, E, C>
where
    R: OpportunityRepository,
    E: SagaEffects,
    C: Clock + Send + Sync,
{
    /// Creates a new opportunity service.
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

    /// Opens an opportunity and derives the connector's priority item.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] when validation, persistence, or a
    /// side effect fails.
    pub async fn open(&self, request: OpenOpportunityRequest) -> SagaServiceResult<Opportunity> {
        let subject = SubjectName::new(request.subject)?;
        let bounty = Bounty::new(request.bounty.unwrap_or(self.config.default_bounty))?;
        let ttl = i64::try_from(self.config.opportunity_ttl_secs).unwrap_or(i64::MAX);
        let opportunity = Opportunity::new(
            NewOpportunity {
                connector_id: request.connector_id,
                requester_id: request.requester_id,
                subject: subject.clone(),
                bounty,
                expires_at: self.clock.utc() + Duration::seconds(ttl),
            },
            &*self.clock,
        );
        self.repository.store(&opportunity).await?;

        self.effects
            .publish(
                EventPayload::OpportunityOpened {
                    opportunity_id: opportunity.id().into_inner(),
                    connector_id: opportunity.connector_id(),
                    subject: subject.as_str().to_owned(),
                },
                opportunity.id().into_inner(),
                AggregateType::Opportunity,
            )
            .await?;
        self.effects
            .upsert_priority(PriorityDerivation {
                user_id: opportunity.connector_id(),
                item_type: PriorityItemType::Opportunity,
                item_id: opportunity.id().into_inner(),
                score: ScoreInputs {
                    base: bounty.amount(),
                    ..ScoreInputs::default()
                },
                summary: ItemSummary {
                    headline: format!("Introduce {subject} to a member who asked for them"),
                    counterpart_name: Some(subject.as_str().to_owned()),
                    bounty: Some(bounty.amount()),
                },
            })
            .await?;
        Ok(opportunity)
    }

    /// The connector accepts the opportunity.
    ///
    /// Redelivered transitions on a terminal instance resolve to
    /// no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn accept(&self, id: OpportunityId) -> SagaServiceResult<Opportunity> {
        let mut opportunity = self.load(id).await?;
        match opportunity.accept(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(opportunity),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&opportunity).await?;
        self.effects
            .publish(
                EventPayload::OpportunityAccepted {
                    opportunity_id: id.into_inner(),
                },
                id.into_inner(),
                AggregateType::Opportunity,
            )
            .await?;
        Ok(opportunity)
    }

    /// The connector declines; the priority item is resolved.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn decline(&self, id: OpportunityId) -> SagaServiceResult<Opportunity> {
        let mut opportunity = self.load(id).await?;
        match opportunity.decline(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(opportunity),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&opportunity).await?;
        self.effects
            .publish(
                EventPayload::OpportunityDeclined {
                    opportunity_id: id.into_inner(),
                },
                id.into_inner(),
                AggregateType::Opportunity,
            )
            .await?;
        self.effects
            .mark_priority_actioned(
                opportunity.connector_id(),
                PriorityItemType::Opportunity,
                id.into_inner(),
            )
            .await?;
        Ok(opportunity)
    }

    /// The introduction happened: applies the completion unit of work.
    ///
    /// The unit marks the originating priority item actioned, expires
    /// rival open opportunities for the same prospect, awards the
    /// bounty idempotently, and queues close-loop notifications. Every
    /// piece is safe to re-run, so a redelivered completion resolves to
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances, live-state
    /// violations, or failed side effects.
    pub async fn complete(&self, id: OpportunityId) -> SagaServiceResult<Opportunity> {
        let mut opportunity = self.load(id).await?;
        match opportunity.complete(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => {
                tracing::debug!(opportunity = %id, "completion replay on terminal instance");
                return Ok(opportunity);
            }
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&opportunity).await?;

        self.effects
            .mark_priority_actioned(
                opportunity.connector_id(),
                PriorityItemType::Opportunity,
                id.into_inner(),
            )
            .await?;
        self.expire_rivals(&opportunity).await?;
        self.effects
            .award_bounty(
                opportunity.connector_id(),
                CreditEventType::IntroductionBounty,
                CreditReferenceType::Opportunity,
                id.into_inner(),
                opportunity.bounty().amount(),
            )
            .await?;
        self.effects
            .notify(
                opportunity.connector_id(),
                format!(
                    "Your introduction of {} is complete; {} credits are on the way.",
                    opportunity.subject(),
                    opportunity.bounty()
                ),
                DispatchPriority::High,
            )
            .await?;
        self.effects
            .notify(
                opportunity.requester_id(),
                format!("You are now connected with {}.", opportunity.subject()),
                DispatchPriority::High,
            )
            .await?;
        self.effects
            .publish(
                EventPayload::OpportunityCompleted {
                    opportunity_id: id.into_inner(),
                    bounty: opportunity.bounty().amount(),
                },
                id.into_inner(),
                AggregateType::Opportunity,
            )
            .await?;
        Ok(opportunity)
    }

    /// Withdraws an accepted opportunity.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn cancel(&self, id: OpportunityId) -> SagaServiceResult<Opportunity> {
        let mut opportunity = self.load(id).await?;
        match opportunity.cancel(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(opportunity),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&opportunity).await?;
        self.effects
            .mark_priority_expired(
                opportunity.connector_id(),
                PriorityItemType::Opportunity,
                id.into_inner(),
            )
            .await?;
        Ok(opportunity)
    }

    /// Expires live opportunities past their deadline. Returns how many
    /// were expired.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] when selection, persistence, or a
    /// side effect fails.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> SagaServiceResult<u32> {
        let overdue = self.repository.list_overdue(now).await?;
        let mut expired = 0;
        for mut opportunity in overdue {
            match opportunity.expire(&*self.clock) {
                Ok(()) => {}
                Err(SagaDomainError::AlreadyTerminal { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
            self.repository.update(&opportunity).await?;
            self.finish_expiry(&opportunity).await?;
            expired += 1;
        }
        Ok(expired)
    }

    /// Operator surface: force-closes a stuck instance as expired.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances.
    pub async fn force_close(&self, id: OpportunityId) -> SagaServiceResult<Opportunity> {
        let mut opportunity = self.load(id).await?;
        match opportunity.expire(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(opportunity),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&opportunity).await?;
        self.finish_expiry(&opportunity).await?;
        tracing::warn!(opportunity = %id, "opportunity force-closed by operator");
        Ok(opportunity)
    }

    async fn expire_rivals(&self, winner: &Opportunity) -> SagaServiceResult<()> {
        let rivals = self
            .repository
            .list_open_by_subject(winner.subject())
            .await?;
        for mut rival in rivals {
            if rival.id() == winner.id() {
                continue;
            }
            match rival.expire(&*self.clock) {
                Ok(()) => {}
                Err(SagaDomainError::AlreadyTerminal { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
            self.repository.update(&rival).await?;
            self.finish_expiry(&rival).await?;
            tracing::info!(
                rival = %rival.id(),
                winner = %winner.id(),
                subject = %winner.subject(),
                "rival opportunity expired to prevent double-booking"
            );
        }
        Ok(())
    }

    async fn finish_expiry(&self, opportunity: &Opportunity) -> SagaServiceResult<()> {
        self.effects
            .publish(
                EventPayload::OpportunityExpired {
                    opportunity_id: opportunity.id().into_inner(),
                },
                opportunity.id().into_inner(),
                AggregateType::Opportunity,
            )
            .await?;
        self.effects
            .mark_priority_expired(
                opportunity.connector_id(),
                PriorityItemType::Opportunity,
                opportunity.id().into_inner(),
            )
            .await?;
        Ok(())
    }

    async fn load(&self, id: OpportunityId) -> SagaServiceResult<Opportunity> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(SagaServiceError::NotFound(id.into_inner()))
    }
}
