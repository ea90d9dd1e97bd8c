//! Dead-letter entries for work that exhausted its retries.

use super::{DeadLetterId, EventDomainError, EventId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Source of a dead-letter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeadLetterKind {
    /// An event whose handler exhausted its delivery attempts.
    Event {
        /// The parked event.
        event_id: EventId,
    },
    /// A task that exhausted its retries.
    Task {
        /// The exhausted task.
        task_id: Uuid,
    },
}

impl DeadLetterKind {
    /// Returns the canonical storage tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event { .. } => "event",
            Self::Task { .. } => "task",
        }
    }

    /// Returns the identifier of the parked item.
    #[must_use]
    pub const fn reference_id(self) -> Uuid {
        match self {
            Self::Event { event_id } => event_id.into_inner(),
            Self::Task { task_id } => task_id,
        }
    }

    /// Reconstructs a kind from its persisted tag and reference.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::InvalidDeadLetterKind`] for an unknown
    /// tag.
    pub fn from_parts(tag: &str, reference_id: Uuid) -> Result<Self, EventDomainError> {
        match tag {
            "event" => Ok(Self::Event {
                event_id: EventId::from_uuid(reference_id),
            }),
            "task" => Ok(Self::Task {
                task_id: reference_id,
            }),
            _ => Err(EventDomainError::InvalidDeadLetterKind(tag.to_owned())),
        }
    }
}

/// Parked work item retained for manual inspection and replay.
///
/// The payload is the serialized form of the typed payload that failed,
/// so operators can inspect it without resolving the original row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    id: DeadLetterId,
    kind: DeadLetterKind,
    payload: Value,
    error_log: Vec<String>,
    attempts: u32,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted dead letter.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedDeadLetterData {
    /// Persisted entry identifier.
    pub id: DeadLetterId,
    /// Persisted source kind.
    pub kind: DeadLetterKind,
    /// Persisted serialized payload.
    pub payload: Value,
    /// Persisted error history, oldest first.
    pub error_log: Vec<String>,
    /// Persisted attempt count.
    pub attempts: u32,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Creates a new dead-letter entry.
    #[must_use]
    pub fn new(
        kind: DeadLetterKind,
        payload: Value,
        error_log: Vec<String>,
        attempts: u32,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: DeadLetterId::new(),
            kind,
            payload,
            error_log,
            attempts,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a dead letter from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedDeadLetterData) -> Self {
        Self {
            id: data.id,
            kind: data.kind,
            payload: data.payload,
            error_log: data.error_log,
            attempts: data.attempts,
            created_at: data.created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> DeadLetterId {
        self.id
    }

    /// Returns the source kind.
    #[must_use]
    pub const fn kind(&self) -> DeadLetterKind {
        self.kind
    }

    /// Returns the serialized payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the error history, oldest first.
    #[must_use]
    pub fn error_log(&self) -> &[String] {
        &self.error_log
    }

    /// Returns the attempt count at parking time.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
