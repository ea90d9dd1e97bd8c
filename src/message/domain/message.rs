//! Queued message aggregate and its delivery lifecycle.

use super::{MessageContent, MessageDomainError, MessageId, MessagePriority, SequenceId};
use crate::event_log::domain::AggregateType;
use crate::identity::{AgentKind, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message delivery lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Waiting for dispatch.
    Queued,
    /// Approved for dispatch by a human or policy gate.
    Approved,
    /// Leased by exactly one dispatcher.
    Processing,
    /// Handed to the delivery gateway.
    Sent,
    /// Replaced by a newer message before sending.
    Superseded,
    /// Withdrawn before sending.
    Cancelled,
}

impl MessageStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Approved => "approved",
            Self::Processing => "processing",
            Self::Sent => "sent",
            Self::Superseded => "superseded",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when the message is still on the active send path.
    #[must_use]
    pub const fn is_sendable(self) -> bool {
        matches!(self, Self::Queued | Self::Approved)
    }

    /// Returns `true` for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Superseded | Self::Cancelled)
    }
}

impl TryFrom<&str> for MessageStatus {
    type Error = MessageDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "queued" => Ok(Self::Queued),
            "approved" => Ok(Self::Approved),
            "processing" => Ok(Self::Processing),
            "sent" => Ok(Self::Sent),
            "superseded" => Ok(Self::Superseded),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(MessageDomainError::InvalidStatus(value.to_owned())),
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a message inside a multi-part sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSlot {
    /// Sequence the message belongs to.
    pub sequence_id: SequenceId,
    /// One-based position inside the sequence.
    pub position: u32,
    /// Total number of members.
    pub total: u32,
}

impl SequenceSlot {
    /// Creates a validated sequence slot.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidSequenceSlot`] when the
    /// position is zero or beyond the total.
    pub const fn new(
        sequence_id: SequenceId,
        position: u32,
        total: u32,
    ) -> Result<Self, MessageDomainError> {
        if position == 0 || position > total {
            return Err(MessageDomainError::InvalidSequenceSlot { position, total });
        }
        Ok(Self {
            sequence_id,
            position,
            total,
        })
    }
}

/// Entity a message is about, used for supersession targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    /// Kind of the referenced entity.
    pub context_type: AggregateType,
    /// Identifier of the referenced entity.
    pub context_id: Uuid,
}

/// Parameters for enqueueing a message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQueuedMessage {
    /// Recipient.
    pub user_id: UserId,
    /// Agent that composed the message.
    pub source_agent: AgentKind,
    /// Content to deliver.
    pub content: MessageContent,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Dispatch priority band.
    pub priority: MessagePriority,
    /// Sequence membership, when part of a multi-part send.
    pub sequence: Option<SequenceSlot>,
    /// Entity the message is about, when any.
    pub context: Option<MessageContext>,
    /// Whether content must be re-rendered immediately before send.
    pub requires_fresh_context: bool,
}

/// One unit (or sequence member) of outbound content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMessage {
    id: MessageId,
    user_id: UserId,
    source_agent: AgentKind,
    content: MessageContent,
    final_text: Option<String>,
    scheduled_for: DateTime<Utc>,
    priority: MessagePriority,
    status: MessageStatus,
    superseded_by: Option<MessageId>,
    status_reason: Option<String>,
    sequence: Option<SequenceSlot>,
    context: Option<MessageContext>,
    requires_fresh_context: bool,
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedMessageData {
    /// Persisted message identifier.
    pub id: MessageId,
    /// Persisted recipient.
    pub user_id: UserId,
    /// Persisted composing agent.
    pub source_agent: AgentKind,
    /// Persisted content.
    pub content: MessageContent,
    /// Persisted rendered text, when any.
    pub final_text: Option<String>,
    /// Persisted earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Persisted priority band.
    pub priority: MessagePriority,
    /// Persisted lifecycle status.
    pub status: MessageStatus,
    /// Persisted superseding message reference.
    pub superseded_by: Option<MessageId>,
    /// Persisted supersession reason.
    pub status_reason: Option<String>,
    /// Persisted sequence membership.
    pub sequence: Option<SequenceSlot>,
    /// Persisted entity reference.
    pub context: Option<MessageContext>,
    /// Persisted freshness flag.
    pub requires_fresh_context: bool,
    /// Persisted delivery timestamp.
    pub sent_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl QueuedMessage {
    /// Creates a new queued message.
    #[must_use]
    pub fn new(params: NewQueuedMessage, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: MessageId::new(),
            user_id: params.user_id,
            source_agent: params.source_agent,
            content: params.content,
            final_text: None,
            scheduled_for: params.scheduled_for,
            priority: params.priority,
            status: MessageStatus::Queued,
            superseded_by: None,
            status_reason: None,
            sequence: params.sequence,
            context: params.context,
            requires_fresh_context: params.requires_fresh_context,
            sent_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            source_agent: data.source_agent,
            content: data.content,
            final_text: data.final_text,
            scheduled_for: data.scheduled_for,
            priority: data.priority,
            status: data.status,
            superseded_by: data.superseded_by,
            status_reason: data.status_reason,
            sequence: data.sequence,
            context: data.context,
            requires_fresh_context: data.requires_fresh_context,
            sent_at: data.sent_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the recipient.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the composing agent.
    #[must_use]
    pub const fn source_agent(&self) -> &AgentKind {
        &self.source_agent
    }

    /// Returns the content.
    #[must_use]
    pub const fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Returns the rendered text, when recorded.
    #[must_use]
    pub fn final_text(&self) -> Option<&str> {
        self.final_text.as_deref()
    }

    /// Returns the earliest dispatch time.
    #[must_use]
    pub const fn scheduled_for(&self) -> DateTime<Utc> {
        self.scheduled_for
    }

    /// Returns the priority band.
    #[must_use]
    pub const fn priority(&self) -> MessagePriority {
        self.priority
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MessageStatus {
        self.status
    }

    /// Returns the superseding message, when replaced.
    #[must_use]
    pub const fn superseded_by(&self) -> Option<MessageId> {
        self.superseded_by
    }

    /// Returns the supersession reason, when replaced.
    #[must_use]
    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    /// Returns the sequence membership, when any.
    #[must_use]
    pub const fn sequence(&self) -> Option<SequenceSlot> {
        self.sequence
    }

    /// Returns the entity reference, when any.
    #[must_use]
    pub const fn context(&self) -> Option<MessageContext> {
        self.context
    }

    /// Returns `true` when content must be re-rendered at send time.
    #[must_use]
    pub const fn requires_fresh_context(&self) -> bool {
        self.requires_fresh_context
    }

    /// Returns the delivery timestamp, when sent.
    #[must_use]
    pub const fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the message is due at the given instant.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_sendable() && self.scheduled_for <= now
    }

    /// Approves a queued message for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidTransition`] unless the
    /// message is queued.
    pub fn approve(&mut self, clock: &impl Clock) -> Result<(), MessageDomainError> {
        if self.status != MessageStatus::Queued {
            return Err(self.invalid_transition(MessageStatus::Approved));
        }
        self.status = MessageStatus::Approved;
        self.touch(clock);
        Ok(())
    }

    /// Takes the dispatch lease.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidTransition`] unless the
    /// message is on the active send path.
    pub fn claim(&mut self, clock: &impl Clock) -> Result<(), MessageDomainError> {
        if !self.status.is_sendable() {
            return Err(self.invalid_transition(MessageStatus::Processing));
        }
        self.status = MessageStatus::Processing;
        self.touch(clock);
        Ok(())
    }

    /// Records a successful handoff to the delivery gateway.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidTransition`] unless the
    /// message holds the dispatch lease.
    pub fn mark_sent(
        &mut self,
        final_text: String,
        clock: &impl Clock,
    ) -> Result<(), MessageDomainError> {
        if self.status != MessageStatus::Processing {
            return Err(self.invalid_transition(MessageStatus::Sent));
        }
        let timestamp = clock.utc();
        self.status = MessageStatus::Sent;
        self.final_text = Some(final_text);
        self.sent_at = Some(timestamp);
        self.updated_at = timestamp;
        Ok(())
    }

    /// Returns a leased message to the queue for a later retry.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidTransition`] unless the
    /// message holds the dispatch lease.
    pub fn requeue(
        &mut self,
        next_attempt: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), MessageDomainError> {
        if self.status != MessageStatus::Processing {
            return Err(self.invalid_transition(MessageStatus::Queued));
        }
        self.status = MessageStatus::Queued;
        self.scheduled_for = next_attempt;
        self.touch(clock);
        Ok(())
    }

    /// Pushes the dispatch time forward without changing status.
    pub fn defer(&mut self, until: DateTime<Utc>, clock: &impl Clock) {
        self.scheduled_for = until;
        self.touch(clock);
    }

    /// Marks the message replaced by a newer one.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidTransition`] unless the
    /// message is still on the active send path.
    pub fn supersede(
        &mut self,
        by: MessageId,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), MessageDomainError> {
        if !self.status.is_sendable() {
            return Err(self.invalid_transition(MessageStatus::Superseded));
        }
        self.status = MessageStatus::Superseded;
        self.superseded_by = Some(by);
        self.status_reason = Some(reason.into());
        self.touch(clock);
        Ok(())
    }

    /// Withdraws the message from the send path.
    ///
    /// Cancelling an already-cancelled message is a no-op; sent and
    /// superseded messages cannot be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidTransition`] for sent or
    /// superseded messages.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), MessageDomainError> {
        match self.status {
            MessageStatus::Cancelled => Ok(()),
            MessageStatus::Sent | MessageStatus::Superseded => {
                Err(self.invalid_transition(MessageStatus::Cancelled))
            }
            MessageStatus::Queued | MessageStatus::Approved | MessageStatus::Processing => {
                self.status = MessageStatus::Cancelled;
                self.status_reason = Some(reason.into());
                self.touch(clock);
                Ok(())
            }
        }
    }

    const fn invalid_transition(&self, attempted: MessageStatus) -> MessageDomainError {
        MessageDomainError::InvalidTransition {
            id: self.id,
            from: self.status,
            attempted,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
