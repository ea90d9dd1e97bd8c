//! Boundary through which sagas touch the rest of the engine.
//!
//! Every externally visible side effect of a saga transition goes
//! through this port: event appends, priority ledger updates, bounty
//! credits, outbound notifications, and reminder scheduling. Each
//! operation is individually idempotent (or no-op safe), which is what
//! lets completion side effects behave as a unit under at-least-once
//! delivery.

use crate::credit::domain::{CreditEventType, CreditReferenceType};
use crate::event_log::domain::{AggregateType, EventPayload};
use crate::identity::UserId;
use crate::priority::domain::{ItemSummary, PriorityItemType, ScoreInputs};
use crate::saga::domain::OfferId;
use crate::task_queue::domain::DispatchPriority;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Failure raised by a saga side effect.
#[derive(Debug, Clone, Error)]
#[error("saga effect failed: {0}")]
pub struct EffectError(
    /// The underlying failure.
    pub Arc<dyn std::error::Error + Send + Sync>,
);

impl EffectError {
    /// Wraps an underlying effect failure.
    pub fn wrap(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Inputs for deriving a priority item from a saga instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityDerivation {
    /// User whose queue receives the item.
    pub user_id: UserId,
    /// Kind of referenced entity.
    pub item_type: PriorityItemType,
    /// Identifier of the referenced saga instance.
    pub item_id: Uuid,
    /// Weighted scoring inputs.
    pub score: ScoreInputs,
    /// Denormalized display fields.
    pub summary: ItemSummary,
}

/// Side-effect boundary for saga transitions.
#[async_trait]
pub trait SagaEffects: Send + Sync {
    /// Appends a saga event to the log.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the append fails.
    async fn publish(
        &self,
        payload: EventPayload,
        aggregate_id: Uuid,
        aggregate_type: AggregateType,
    ) -> Result<(), EffectError>;

    /// Derives or refreshes a priority item.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the ledger rejects the upsert.
    async fn upsert_priority(&self, derivation: PriorityDerivation) -> Result<(), EffectError>;

    /// Marks the priority item for a saga instance as acted upon.
    /// Missing items are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the ledger fails.
    async fn mark_priority_actioned(
        &self,
        user_id: UserId,
        item_type: PriorityItemType,
        item_id: Uuid,
    ) -> Result<(), EffectError>;

    /// Marks the priority item for a saga instance as expired. Missing
    /// items are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the ledger fails.
    async fn mark_priority_expired(
        &self,
        user_id: UserId,
        item_type: PriorityItemType,
        item_id: Uuid,
    ) -> Result<(), EffectError>;

    /// Credits a bounty with the idempotency key derived from the event
    /// type and saga reference. Duplicate awards are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the ledger fails for a
    /// non-duplicate reason.
    async fn award_bounty(
        &self,
        user_id: UserId,
        event_type: CreditEventType,
        reference_type: CreditReferenceType,
        reference_id: Uuid,
        amount: i64,
    ) -> Result<(), EffectError>;

    /// Queues a close-loop notification through the message
    /// orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the enqueue fails.
    async fn notify(
        &self,
        user_id: UserId,
        text: String,
        priority: DispatchPriority,
    ) -> Result<(), EffectError>;

    /// Schedules the single connector reminder task for an offer.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError`] when the enqueue fails.
    async fn schedule_reminder(
        &self,
        offer_id: OfferId,
        at: DateTime<Utc>,
    ) -> Result<(), EffectError>;
}
