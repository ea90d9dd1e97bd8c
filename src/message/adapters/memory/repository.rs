//! In-memory repository for message orchestrator tests and
//! single-process use.
//!
//! The dispatch lease holds the state lock for the whole check-and-set,
//! mirroring the conditional update in the `PostgreSQL` adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::UserId;
use crate::message::{
    domain::{MessageContext, MessageId, QueuedMessage, SequenceId},
    ports::{
        MessageQueueDepth, MessageRepository, MessageRepositoryError, MessageRepositoryResult,
    },
};

/// Thread-safe in-memory message repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageRepository {
    state: Arc<RwLock<HashMap<MessageId, QueuedMessage>>>,
}

impl InMemoryMessageRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> MessageRepositoryError {
    MessageRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn store(&self, message: &QueuedMessage) -> MessageRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&message.id()) {
            return Err(MessageRepositoryError::DuplicateMessage(message.id()));
        }
        state.insert(message.id(), message.clone());
        Ok(())
    }

    async fn update(&self, message: &QueuedMessage) -> MessageRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&message.id()) {
            return Err(MessageRepositoryError::NotFound(message.id()));
        }
        state.insert(message.id(), message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: MessageId) -> MessageRepositoryResult<Option<QueuedMessage>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut due: Vec<QueuedMessage> = state
            .values()
            .filter(|message| message.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.scheduled_for().cmp(&b.scheduled_for()))
                .then_with(|| a.created_at().cmp(&b.created_at()))
        });
        due.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(due)
    }

    async fn claim(&self, id: MessageId, now: DateTime<Utc>) -> MessageRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(message) = state.get_mut(&id) else {
            return Ok(false);
        };
        if message.claim(&FixedClock(now)).is_err() {
            return Ok(false);
        }
        Ok(true)
    }

    async fn sent_unit_count_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> MessageRepositoryResult<u64> {
        let state = self.state.read().map_err(lock_error)?;
        let mut sequences_counted: Vec<SequenceId> = Vec::new();
        let mut units = 0;
        for message in state.values() {
            if message.user_id() != user_id {
                continue;
            }
            let Some(sent_at) = message.sent_at() else {
                continue;
            };
            if sent_at < since {
                continue;
            }
            match message.sequence() {
                Some(slot) => {
                    if !sequences_counted.contains(&slot.sequence_id) {
                        sequences_counted.push(slot.sequence_id);
                        units += 1;
                    }
                }
                None => units += 1,
            }
        }
        Ok(units)
    }

    async fn sequence_members(
        &self,
        sequence_id: SequenceId,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut members: Vec<QueuedMessage> = state
            .values()
            .filter(|message| {
                message
                    .sequence()
                    .is_some_and(|slot| slot.sequence_id == sequence_id)
            })
            .cloned()
            .collect();
        members.sort_by_key(|message| message.sequence().map_or(0, |slot| slot.position));
        Ok(members)
    }

    async fn find_active_for_context(
        &self,
        user_id: UserId,
        context: MessageContext,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .values()
            .filter(|message| {
                message.user_id() == user_id
                    && message.status().is_sendable()
                    && message.context() == Some(context)
            })
            .cloned()
            .collect())
    }

    async fn queued_depths(&self) -> MessageRepositoryResult<Vec<MessageQueueDepth>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut counts: HashMap<i16, MessageQueueDepth> = HashMap::new();
        for message in state.values() {
            if !message.status().is_sendable() {
                continue;
            }
            counts
                .entry(message.priority().rank())
                .and_modify(|depth| depth.count += 1)
                .or_insert(MessageQueueDepth {
                    priority: message.priority(),
                    count: 1,
                });
        }
        let mut depths: Vec<MessageQueueDepth> = counts.into_values().collect();
        depths.sort_by_key(|depth| depth.priority.rank());
        Ok(depths)
    }
}

/// Clock pinned to the claim instant so lease timestamps match the
/// dispatcher's view of now.
struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<chrono::Local> {
        self.0.with_timezone(&chrono::Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
