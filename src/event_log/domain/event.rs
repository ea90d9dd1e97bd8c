//! Event entity and aggregate classification.

use super::{EventDomainError, EventId, EventPayload};
use crate::identity::AgentKind;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of aggregate an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    /// A queued background task.
    Task,
    /// An outbound queued message.
    Message,
    /// A priority ledger item.
    PriorityItem,
    /// An opportunity saga instance.
    Opportunity,
    /// A connection-request saga instance.
    ConnectionRequest,
    /// An offer saga instance.
    Offer,
    /// A member's credit account.
    CreditAccount,
    /// A platform member.
    User,
}

impl AggregateType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Message => "message",
            Self::PriorityItem => "priority_item",
            Self::Opportunity => "opportunity",
            Self::ConnectionRequest => "connection_request",
            Self::Offer => "offer",
            Self::CreditAccount => "credit_account",
            Self::User => "user",
        }
    }
}

impl TryFrom<&str> for AggregateType {
    type Error = EventDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "task" => Ok(Self::Task),
            "message" => Ok(Self::Message),
            "priority_item" => Ok(Self::PriorityItem),
            "opportunity" => Ok(Self::Opportunity),
            "connection_request" => Ok(Self::ConnectionRequest),
            "offer" => Ok(Self::Offer),
            "credit_account" => Ok(Self::CreditAccount),
            "user" => Ok(Self::User),
            _ => Err(EventDomainError::InvalidAggregateType(value.to_owned())),
        }
    }
}

impl std::fmt::Display for AggregateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured metadata attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Correlates events belonging to one logical flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    /// The event that caused this one, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<EventId>,
}

/// Parameters for appending a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Typed payload.
    pub payload: EventPayload,
    /// Identifier of the aggregate the event belongs to.
    pub aggregate_id: Uuid,
    /// Kind of the aggregate.
    pub aggregate_type: AggregateType,
    /// Structured metadata.
    pub metadata: EventMetadata,
    /// Producer that appended the event.
    pub created_by: AgentKind,
}

/// Immutable fact appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    payload: EventPayload,
    aggregate_id: Uuid,
    aggregate_type: AggregateType,
    metadata: EventMetadata,
    created_at: DateTime<Utc>,
    created_by: AgentKind,
}

/// Parameter object for reconstructing a persisted event.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedEventData {
    /// Persisted event identifier.
    pub id: EventId,
    /// Persisted payload.
    pub payload: EventPayload,
    /// Persisted aggregate identifier.
    pub aggregate_id: Uuid,
    /// Persisted aggregate kind.
    pub aggregate_type: AggregateType,
    /// Persisted metadata.
    pub metadata: EventMetadata,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted producer.
    pub created_by: AgentKind,
}

impl Event {
    /// Creates a new event ready for appending.
    #[must_use]
    pub fn new(params: NewEvent, clock: &impl Clock) -> Self {
        Self {
            id: EventId::new(),
            payload: params.payload,
            aggregate_id: params.aggregate_id,
            aggregate_type: params.aggregate_type,
            metadata: params.metadata,
            created_at: clock.utc(),
            created_by: params.created_by,
        }
    }

    /// Reconstructs an event from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEventData) -> Self {
        Self {
            id: data.id,
            payload: data.payload,
            aggregate_id: data.aggregate_id,
            aggregate_type: data.aggregate_type,
            metadata: data.metadata,
            created_at: data.created_at,
            created_by: data.created_by,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns the typed payload.
    #[must_use]
    pub const fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Returns the event type tag.
    #[must_use]
    pub fn event_type(&self) -> &str {
        self.payload.event_type()
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub const fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// Returns the aggregate kind.
    #[must_use]
    pub const fn aggregate_type(&self) -> AggregateType {
        self.aggregate_type
    }

    /// Returns the structured metadata.
    #[must_use]
    pub const fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the producer.
    #[must_use]
    pub const fn created_by(&self) -> &AgentKind {
        &self.created_by
    }
}
