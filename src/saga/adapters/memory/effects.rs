//! Recording effects sink for saga service tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::credit::domain::{CreditEventType, CreditReferenceType};
use crate::event_log::domain::{AggregateType, EventPayload};
use crate::identity::UserId;
use crate::priority::domain::PriorityItemType;
use crate::saga::domain::OfferId;
use crate::saga::ports::{EffectError, PriorityDerivation, SagaEffects};
use crate::task_queue::domain::DispatchPriority;

/// One recorded side effect, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEffect {
    /// An event append.
    Published {
        /// Event type tag.
        event_type: String,
        /// Aggregate identifier.
        aggregate_id: Uuid,
        /// Aggregate kind.
        aggregate_type: AggregateType,
    },
    /// A priority item derivation.
    PriorityUpserted(PriorityDerivation),
    /// A priority item actioned by key.
    PriorityActioned {
        /// Queue owner.
        user_id: UserId,
        /// Item kind.
        item_type: PriorityItemType,
        /// Referenced saga instance.
        item_id: Uuid,
    },
    /// A priority item expired by key.
    PriorityExpired {
        /// Queue owner.
        user_id: UserId,
        /// Item kind.
        item_type: PriorityItemType,
        /// Referenced saga instance.
        item_id: Uuid,
    },
    /// A bounty credit.
    BountyAwarded {
        /// Credited account.
        user_id: UserId,
        /// Ledger event classification.
        event_type: CreditEventType,
        /// Reference kind.
        reference_type: CreditReferenceType,
        /// Referenced saga instance.
        reference_id: Uuid,
        /// Amount in credit units.
        amount: i64,
    },
    /// A close-loop notification.
    Notified {
        /// Recipient.
        user_id: UserId,
        /// Message text.
        text: String,
        /// Dispatch priority.
        priority: DispatchPriority,
    },
    /// A reminder task.
    ReminderScheduled {
        /// The offer to remind about.
        offer_id: OfferId,
        /// When the reminder is due.
        at: DateTime<Utc>,
    },
}

/// Effects sink that records every call instead of applying it.
#[derive(Debug, Clone, Default)]
pub struct RecordingEffects {
    recorded: Arc<Mutex<Vec<RecordedEffect>>>,
}

impl RecordingEffects {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded effects in call order.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedEffect> {
        self.recorded
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }

    fn record(&self, effect: RecordedEffect) -> Result<(), EffectError> {
        let mut recorded = self
            .recorded
            .lock()
            .map_err(|err| EffectError::wrap(std::io::Error::other(err.to_string())))?;
        recorded.push(effect);
        Ok(())
    }
}

#[async_trait]
impl SagaEffects for RecordingEffects {
    async fn publish(
        &self,
        payload: EventPayload,
        aggregate_id: Uuid,
        aggregate_type: AggregateType,
    ) -> Result<(), EffectError> {
        self.record(RecordedEffect::Published {
            event_type: payload.event_type().to_owned(),
            aggregate_id,
            aggregate_type,
        })
    }

    async fn upsert_priority(&self, derivation: PriorityDerivation) -> Result<(), EffectError> {
        self.record(RecordedEffect::PriorityUpserted(derivation))
    }

    async fn mark_priority_actioned(
        &self,
        user_id: UserId,
        item_type: PriorityItemType,
        item_id: Uuid,
    ) -> Result<(), EffectError> {
        self.record(RecordedEffect::PriorityActioned {
            user_id,
            item_type,
            item_id,
        })
    }

    async fn mark_priority_expired(
        &self,
        user_id: UserId,
        item_type: PriorityItemType,
        item_id: Uuid,
    ) -> Result<(), EffectError> {
        self.record(RecordedEffect::PriorityExpired {
            user_id,
            item_type,
            item_id,
        })
    }

    async fn award_bounty(
        &self,
        user_id: UserId,
        event_type: CreditEventType,
        reference_type: CreditReferenceType,
        reference_id: Uuid,
        amount: i64,
    ) -> Result<(), EffectError> {
        self.record(RecordedEffect::BountyAwarded {
            user_id,
            event_type,
            reference_type,
            reference_id,
            amount,
        })
    }

    async fn notify(
        &self,
        user_id: UserId,
        text: String,
        priority: DispatchPriority,
    ) -> Result<(), EffectError> {
        self.record(RecordedEffect::Notified {
            user_id,
            text,
            priority,
        })
    }

    async fn schedule_reminder(
        &self,
        offer_id: OfferId,
        at: DateTime<Utc>,
    ) -> Result<(), EffectError> {
        self.record(RecordedEffect::ReminderScheduled { offer_id, at })
    }
}
