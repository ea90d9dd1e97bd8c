//! Production wiring of the saga effects port.
//!
//! Routes each side effect to the owning engine service: appends to the
//! event log, derivations to the priority ledger, bounties to the
//! credit ledger, notifications to the message orchestrator, and
//! reminders to the task queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use uuid::Uuid;

use crate::credit::domain::{CreditEventType, CreditReferenceType};
use crate::credit::ports::CreditLedgerRepository;
use crate::credit::services::{AppendCreditRequest, CreditLedgerService};
use crate::event_log::domain::{AggregateType, EventMetadata, EventPayload, NewEvent};
use crate::event_log::ports::{DeadLetterRepository, EventRepository};
use crate::event_log::services::EventLogService;
use crate::identity::{AgentKind, UserId};
use crate::message::domain::MessageContent;
use crate::message::ports::{ContentRenderer, DeliveryGateway, MessageRepository};
use crate::message::services::{EnqueueMessageRequest, MessageOrchestratorService};
use crate::priority::domain::{PriorityItemType, PriorityKey};
use crate::priority::ports::PriorityRepository;
use crate::priority::services::{PriorityLedgerService, UpsertPriorityRequest};
use crate::saga::domain::OfferId;
use crate::saga::ports::{EffectError, PriorityDerivation, SagaEffects};
use crate::task_queue::domain::{DispatchPriority, TaskContext, TaskPayload};
use crate::task_queue::ports::TaskRepository;
use crate::task_queue::services::{EnqueueTaskRequest, TaskQueueService};

/// Saga effects backed by the engine's own services.
#[derive(Clone)]
pub struct EngineEffects<ER, DR, PR, CR, MR, G, T, TQ, C>
where
    ER: EventRepository,
    DR: DeadLetterRepository,
    PR: PriorityRepository,
    CR: CreditLedgerRepository,
    MR: MessageRepository,
    G: DeliveryGateway,
    T: ContentRenderer,
    TQ: TaskRepository,
    C: Clock + Send + Sync,
{
    event_log: Arc<EventLogService<ER, DR, C>>,
    priority: Arc<PriorityLedgerService<PR, C>>,
    credit: Arc<CreditLedgerService<CR, C>>,
    messages: Arc<MessageOrchestratorService<MR, G, T, C>>,
    tasks: Arc<TaskQueueService<TQ, ER, DR, C>>,
}

impl<ER, DR, PR, CR, MR, G, T, TQ, C> EngineEffects<ER, DR, PR, CR, MR, G, T, TQ, C>
where
    ER: EventRepository,
    DR: DeadLetterRepository,
    PR: PriorityRepository,
    CR: CreditLedgerRepository,
    MR: MessageRepository,
    G: DeliveryGateway,
    T: ContentRenderer,
    TQ: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates the production effects wiring.
    #[must_use]
    pub const fn new(
        event_log: Arc<EventLogService<ER, DR, C>>,
        priority: Arc<PriorityLedgerService<PR, C>>,
        credit: Arc<CreditLedgerService<CR, C>>,
        messages: Arc<MessageOrchestratorService<MR, G, T, C>>,
        tasks: Arc<TaskQueueService<TQ, ER, DR, C>>,
    ) -> Self {
        Self {
            event_log,
            priority,
            credit,
            messages,
            tasks,
        }
    }
}

#[async_trait]
impl<ER, DR, PR, CR, MR, G, T, TQ, C> SagaEffects
    for EngineEffects<ER, DR, PR, CR, MR, G, T, TQ, C>
where
    ER: EventRepository,
    DR: DeadLetterRepository,
    PR: PriorityRepository,
    CR: CreditLedgerRepository,
    MR: MessageRepository,
    G: DeliveryGateway,
    T: ContentRenderer,
    TQ: TaskRepository,
    C: Clock + Send + Sync,
{
    async fn publish(
        &self,
        payload: EventPayload,
        aggregate_id: Uuid,
        aggregate_type: AggregateType,
    ) -> Result<(), EffectError> {
        self.event_log
            .append(NewEvent {
                payload,
                aggregate_id,
                aggregate_type,
                metadata: EventMetadata::default(),
                created_by: AgentKind::internal("saga"),
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }

    async fn upsert_priority(&self, derivation: PriorityDerivation) -> Result<(), EffectError> {
        self.priority
            .upsert_priority(UpsertPriorityRequest {
                user_id: derivation.user_id,
                item_type: derivation.item_type,
                item_id: derivation.item_id,
                score: derivation.score,
                summary: derivation.summary,
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }

    async fn mark_priority_actioned(
        &self,
        user_id: UserId,
        item_type: PriorityItemType,
        item_id: Uuid,
    ) -> Result<(), EffectError> {
        self.priority
            .mark_actioned_by_key(&PriorityKey {
                user_id,
                item_type,
                item_id,
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }

    async fn mark_priority_expired(
        &self,
        user_id: UserId,
        item_type: PriorityItemType,
        item_id: Uuid,
    ) -> Result<(), EffectError> {
        self.priority
            .mark_expired_by_key(&PriorityKey {
                user_id,
                item_type,
                item_id,
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }

    async fn award_bounty(
        &self,
        user_id: UserId,
        event_type: CreditEventType,
        reference_type: CreditReferenceType,
        reference_id: Uuid,
        amount: i64,
    ) -> Result<(), EffectError> {
        self.credit
            .append_credit(AppendCreditRequest {
                user_id,
                event_type,
                amount,
                reference_type,
                reference_id,
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }

    async fn notify(
        &self,
        user_id: UserId,
        text: String,
        priority: DispatchPriority,
    ) -> Result<(), EffectError> {
        self.messages
            .enqueue_message(EnqueueMessageRequest {
                user_id,
                source_agent: AgentKind::internal("saga"),
                content: MessageContent::text(text),
                priority,
                scheduled_for: None,
                context: None,
                requires_fresh_context: false,
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }

    async fn schedule_reminder(
        &self,
        offer_id: OfferId,
        at: DateTime<Utc>,
    ) -> Result<(), EffectError> {
        self.tasks
            .enqueue(EnqueueTaskRequest {
                payload: TaskPayload::OfferReminder {
                    offer_id: offer_id.into_inner(),
                },
                agent_type: AgentKind::internal("concierge"),
                user_id: None,
                context: Some(TaskContext {
                    context_type: AggregateType::Offer,
                    context_id: offer_id.into_inner(),
                }),
                priority: DispatchPriority::High,
                scheduled_for: Some(at),
                max_retries: None,
            })
            .await
            .map_err(EffectError::wrap)?;
        Ok(())
    }
}
