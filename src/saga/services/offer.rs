//! Offer lifecycle orchestration: the two-step handshake.

use super::{SagaServiceError, SagaServiceResult};
use crate::config::SagaConfig;
use crate::credit::domain::{CreditEventType, CreditReferenceType};
use crate::event_log::domain::{AggregateType, EventPayload};
use crate::identity::UserId;
use crate::priority::domain::{ItemSummary, PriorityItemType, ScoreInputs};
use crate::saga::{
    domain::{Bounty, NewOffer, Offer, OfferId, OfferStatus, SagaDomainError, SubjectName},
    ports::{OfferRepository, PriorityDerivation, SagaEffects},
};
use crate::task_queue::domain::DispatchPriority;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOfferRequest {
    /// Person being offered the introduction.
    pub introducee_id: UserId,
    /// Facilitating connector.
    pub connector_id: UserId,
    /// Display name of the person to be introduced.
    pub subject: String,
    /// Bounty override; `None` resolves against provider rates, then
    /// the configured default.
    pub bounty: Option<i64>,
}

/// Offer saga orchestration service.
#[derive(Clone)]
pub struct OfferService<R, E, C>
where
    R: OfferRepository,
    E: SagaEffects,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    effects: Arc<E>,
    clock: Arc<C>,
    config: SagaConfig,
}

impl<R, E, C> OfferService<R, E, C>
where
    R: OfferRepository,
    E: SagaEffects,
    C: Clock + Send + Sync,
{
    /// Creates a new offer service.
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

    /// Creates an offer awaiting the introducee's response.
    ///
    /// The bounty is resolved once, here: an explicit override wins,
    /// then the recipient's solution-provider rate, then the default.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] when validation, persistence, or a
    /// side effect fails.
    pub async fn create(&self, request: CreateOfferRequest) -> SagaServiceResult<Offer> {
        let subject = SubjectName::new(request.subject)?;
        let amount = request
            .bounty
            .unwrap_or_else(|| self.config.bounty_for_recipient(request.introducee_id));
        let bounty = Bounty::new(amount)?;
        let ttl = i64::try_from(self.config.offer_response_ttl_secs).unwrap_or(i64::MAX);
        let offer = Offer::new(
            NewOffer {
                introducee_id: request.introducee_id,
                connector_id: request.connector_id,
                subject: subject.clone(),
                bounty,
                expires_at: self.clock.utc() + Duration::seconds(ttl),
            },
            &*self.clock,
        );
        self.repository.store(&offer).await?;

        self.effects
            .publish(
                EventPayload::OfferCreated {
                    offer_id: offer.id().into_inner(),
                    introducee_id: offer.introducee_id(),
                    connector_id: offer.connector_id(),
                    bounty: bounty.amount(),
                },
                offer.id().into_inner(),
                AggregateType::Offer,
            )
            .await?;
        self.effects
            .upsert_priority(PriorityDerivation {
                user_id: offer.introducee_id(),
                item_type: PriorityItemType::Offer,
                item_id: offer.id().into_inner(),
                score: ScoreInputs {
                    base: bounty.amount(),
                    ..ScoreInputs::default()
                },
                summary: ItemSummary {
                    headline: format!("An introduction to {subject} is on offer"),
                    counterpart_name: Some(subject.as_str().to_owned()),
                    bounty: Some(bounty.amount()),
                },
            })
            .await?;
        Ok(offer)
    }

    /// First handshake step: the introducee accepts.
    ///
    /// Schedules exactly one connector reminder at the end of the first
    /// grace period.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn introducee_accept(&self, id: OfferId) -> SagaServiceResult<Offer> {
        let mut offer = self.load(id).await?;
        match offer.introducee_accept(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(offer),
            Err(err) => return Err(err.into()),
        }

        if !offer.reminder_scheduled() {
            let grace =
                i64::try_from(self.config.confirmation_grace_secs).unwrap_or(i64::MAX);
            let due = offer.accepted_at().unwrap_or_else(|| self.clock.utc())
                + Duration::seconds(grace);
            self.effects.schedule_reminder(id, due).await?;
            offer.mark_reminder_scheduled(&*self.clock);
        }
        self.repository.update(&offer).await?;
        self.effects
            .publish(
                EventPayload::OfferIntroduceeAccepted {
                    offer_id: id.into_inner(),
                },
                id.into_inner(),
                AggregateType::Offer,
            )
            .await?;
        Ok(offer)
    }

    /// The introducee declines; the offer never reaches confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or live-state
    /// violations.
    pub async fn introducee_decline(&self, id: OfferId) -> SagaServiceResult<Offer> {
        let mut offer = self.load(id).await?;
        match offer.introducee_decline(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(offer),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&offer).await?;
        self.effects
            .publish(
                EventPayload::OfferIntroduceeDeclined {
                    offer_id: id.into_inner(),
                },
                id.into_inner(),
                AggregateType::Offer,
            )
            .await?;
        self.effects
            .mark_priority_actioned(
                offer.introducee_id(),
                PriorityItemType::Offer,
                id.into_inner(),
            )
            .await?;
        Ok(offer)
    }

    /// Second handshake step: the connector confirms, completing the
    /// offer and applying the completion unit of work.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances, live-state
    /// violations, or failed side effects.
    pub async fn connector_confirm(&self, id: OfferId) -> SagaServiceResult<Offer> {
        let mut offer = self.load(id).await?;
        match offer.connector_confirm(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => {
                tracing::debug!(offer = %id, "confirmation replay on terminal instance");
                return Ok(offer);
            }
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&offer).await?;

        self.effects
            .mark_priority_actioned(
                offer.introducee_id(),
                PriorityItemType::Offer,
                id.into_inner(),
            )
            .await?;
        self.effects
            .award_bounty(
                offer.connector_id(),
                CreditEventType::OfferBounty,
                CreditReferenceType::Offer,
                id.into_inner(),
                offer.bounty().amount(),
            )
            .await?;
        self.effects
            .notify(
                offer.connector_id(),
                format!(
                    "Your introduction of {} is confirmed; {} credits are on the way.",
                    offer.subject(),
                    offer.bounty()
                ),
                DispatchPriority::High,
            )
            .await?;
        self.effects
            .notify(
                offer.introducee_id(),
                format!("You are now connected with {}.", offer.subject()),
                DispatchPriority::High,
            )
            .await?;
        self.effects
            .publish(
                EventPayload::OfferConfirmed {
                    offer_id: id.into_inner(),
                },
                id.into_inner(),
                AggregateType::Offer,
            )
            .await?;
        Ok(offer)
    }

    /// Executes the scheduled connector reminder.
    ///
    /// Returns `true` when a reminder was sent; an offer that has moved
    /// on resolves to `false` without sending.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances or failed
    /// side effects.
    pub async fn send_reminder(&self, id: OfferId) -> SagaServiceResult<bool> {
        let offer = self.load(id).await?;
        if offer.status() != OfferStatus::PendingConnectorConfirmation {
            tracing::debug!(offer = %id, status = %offer.status(), "reminder skipped");
            return Ok(false);
        }
        self.effects
            .notify(
                offer.connector_id(),
                format!(
                    "Did your introduction of {} happen? Confirm it to release the bounty.",
                    offer.subject()
                ),
                DispatchPriority::Medium,
            )
            .await?;
        Ok(true)
    }

    /// Expires offers that ran out of time: unanswered offers past
    /// their response deadline, and accepted offers unconfirmed past
    /// both grace periods. Returns how many were expired.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] when selection, persistence, or a
    /// side effect fails.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> SagaServiceResult<u32> {
        let mut expired = 0;

        let unanswered = self
            .repository
            .list_by_status(OfferStatus::PendingIntroduceeResponse)
            .await?;
        for offer in unanswered {
            if offer.expires_at() <= now {
                self.expire_one(offer).await?;
                expired += 1;
            }
        }

        let grace = i64::try_from(self.config.confirmation_grace_secs).unwrap_or(i64::MAX);
        let final_grace =
            i64::try_from(self.config.confirmation_final_grace_secs).unwrap_or(i64::MAX);
        let unconfirmed = self
            .repository
            .list_by_status(OfferStatus::PendingConnectorConfirmation)
            .await?;
        for offer in unconfirmed {
            let Some(accepted_at) = offer.accepted_at() else {
                continue;
            };
            let deadline =
                accepted_at + Duration::seconds(grace) + Duration::seconds(final_grace);
            if deadline <= now {
                self.expire_one(offer).await?;
                expired += 1;
            }
        }
        Ok(expired)
    }

    /// Operator surface: force-closes a stuck instance as expired.
    ///
    /// # Errors
    ///
    /// Returns [`SagaServiceError`] for unknown instances.
    pub async fn force_close(&self, id: OfferId) -> SagaServiceResult<Offer> {
        let offer = self.load(id).await?;
        if offer.status().is_terminal() {
            return Ok(offer);
        }
        let expired = self.expire_one(offer).await?;
        tracing::warn!(offer = %id, "offer force-closed by operator");
        Ok(expired)
    }

    async fn expire_one(&self, mut offer: Offer) -> SagaServiceResult<Offer> {
        match offer.expire(&*self.clock) {
            Ok(()) => {}
            Err(SagaDomainError::AlreadyTerminal { .. }) => return Ok(offer),
            Err(err) => return Err(err.into()),
        }
        self.repository.update(&offer).await?;
        self.effects
            .publish(
                EventPayload::OfferExpired {
                    offer_id: offer.id().into_inner(),
                },
                offer.id().into_inner(),
                AggregateType::Offer,
            )
            .await?;
        self.effects
            .mark_priority_expired(
                offer.introducee_id(),
                PriorityItemType::Offer,
                offer.id().into_inner(),
            )
            .await?;
        Ok(offer)
    }

    async fn load(&self, id: OfferId) -> SagaServiceResult<Offer> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(SagaServiceError::NotFound(id.into_inner()))
    }
}
