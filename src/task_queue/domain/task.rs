//! Task aggregate and its leased lifecycle.

use super::{DispatchPriority, TaskDomainError, TaskId, TaskPayload};
use crate::event_log::domain::AggregateType;
use crate::identity::{AgentKind, UserId};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to become due and be claimed.
    Pending,
    /// Leased by exactly one dispatcher.
    Processing,
    /// Finished successfully.
    Completed,
    /// Exhausted its retries.
    Failed,
    /// Cancelled cooperatively before completion.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = TaskDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(TaskDomainError::InvalidStatus(value.to_owned())),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to the entity a task operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    /// Kind of the referenced entity.
    pub context_type: AggregateType,
    /// Identifier of the referenced entity.
    pub context_id: Uuid,
}

/// What to do with a task after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Another attempt is scheduled.
    Retry {
        /// The failed attempt ordinal (1-based).
        attempt: u32,
    },
    /// The retry budget is spent; the task is failed.
    Exhausted,
}

/// Parameters for enqueueing a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    /// Typed work payload.
    pub payload: TaskPayload,
    /// Worker type that owns the task.
    pub agent_type: AgentKind,
    /// Member the task concerns, when any.
    pub user_id: Option<UserId>,
    /// Entity the task operates on, when any.
    pub context: Option<TaskContext>,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Dispatch priority band.
    pub priority: DispatchPriority,
    /// Retry ceiling (total attempts).
    pub max_retries: u32,
}

/// Leased unit of background work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    payload: TaskPayload,
    agent_type: AgentKind,
    user_id: Option<UserId>,
    context: Option<TaskContext>,
    scheduled_for: DateTime<Utc>,
    priority: DispatchPriority,
    status: TaskStatus,
    retry_count: u32,
    max_retries: u32,
    result_payload: Option<Value>,
    error_log: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted payload.
    pub payload: TaskPayload,
    /// Persisted owning worker type.
    pub agent_type: AgentKind,
    /// Persisted member reference.
    pub user_id: Option<UserId>,
    /// Persisted entity reference.
    pub context: Option<TaskContext>,
    /// Persisted earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Persisted priority band.
    pub priority: DispatchPriority,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted attempt count.
    pub retry_count: u32,
    /// Persisted retry ceiling.
    pub max_retries: u32,
    /// Persisted result payload.
    pub result_payload: Option<Value>,
    /// Persisted error history, oldest first.
    pub error_log: Vec<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new pending task.
    #[must_use]
    pub fn new(params: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            payload: params.payload,
            agent_type: params.agent_type,
            user_id: params.user_id,
            context: params.context,
            scheduled_for: params.scheduled_for,
            priority: params.priority,
            status: TaskStatus::Pending,
            retry_count: 0,
            max_retries: params.max_retries,
            result_payload: None,
            error_log: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            payload: data.payload,
            agent_type: data.agent_type,
            user_id: data.user_id,
            context: data.context,
            scheduled_for: data.scheduled_for,
            priority: data.priority,
            status: data.status,
            retry_count: data.retry_count,
            max_retries: data.max_retries,
            result_payload: data.result_payload,
            error_log: data.error_log,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the typed payload.
    #[must_use]
    pub const fn payload(&self) -> &TaskPayload {
        &self.payload
    }

    /// Returns the task type tag.
    #[must_use]
    pub fn task_type(&self) -> &str {
        self.payload.task_type()
    }

    /// Returns the owning worker type.
    #[must_use]
    pub const fn agent_type(&self) -> &AgentKind {
        &self.agent_type
    }

    /// Returns the member the task concerns, when any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Returns the entity the task operates on, when any.
    #[must_use]
    pub const fn context(&self) -> Option<TaskContext> {
        self.context
    }

    /// Returns the earliest dispatch time.
    #[must_use]
    pub const fn scheduled_for(&self) -> DateTime<Utc> {
        self.scheduled_for
    }

    /// Returns the priority band.
    #[must_use]
    pub const fn priority(&self) -> DispatchPriority {
        self.priority
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the attempt count so far.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns the retry ceiling.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the recorded result payload, when completed.
    #[must_use]
    pub const fn result_payload(&self) -> Option<&Value> {
        self.result_payload.as_ref()
    }

    /// Returns the error history, oldest first.
    #[must_use]
    pub fn error_log(&self) -> &[String] {
        &self.error_log
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

    /// Returns `true` when the task is due at the given instant.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.scheduled_for <= now
    }

    /// Takes the lease: `pending` to `processing`.
    ///
    /// Repositories implement the conditional variant of this transition;
    /// the domain method backs the in-memory adapter and keeps the rule
    /// in one place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// pending.
    pub fn claim(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Pending {
            return Err(self.invalid_transition(TaskStatus::Processing));
        }
        self.status = TaskStatus::Processing;
        self.touch(clock);
        Ok(())
    }

    /// Completes a leased task with an optional result payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// processing.
    pub fn complete(
        &mut self,
        result_payload: Option<Value>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Processing {
            return Err(self.invalid_transition(TaskStatus::Completed));
        }
        self.status = TaskStatus::Completed;
        self.result_payload = result_payload;
        self.touch(clock);
        Ok(())
    }

    /// Records a failed attempt and decides the follow-up.
    ///
    /// While the retry budget lasts the task returns to `pending` with
    /// the given backoff; once spent it becomes `failed`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// processing.
    pub fn record_failure(
        &mut self,
        error: String,
        backoff: Duration,
        clock: &impl Clock,
    ) -> Result<FailureDisposition, TaskDomainError> {
        if self.status != TaskStatus::Processing {
            return Err(self.invalid_transition(TaskStatus::Failed));
        }

        self.retry_count = self.retry_count.saturating_add(1);
        self.error_log.push(error);
        let timestamp = clock.utc();

        let disposition = if self.retry_count < self.max_retries {
            self.status = TaskStatus::Pending;
            self.scheduled_for = timestamp + backoff;
            FailureDisposition::Retry {
                attempt: self.retry_count,
            }
        } else {
            self.status = TaskStatus::Failed;
            FailureDisposition::Exhausted
        };
        self.updated_at = timestamp;
        Ok(disposition)
    }

    /// Cancels the task cooperatively.
    ///
    /// Cancelling an already-cancelled task is a no-op; a task that has
    /// already completed or failed cannot be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the task has
    /// already completed or failed.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        match self.status {
            TaskStatus::Cancelled => Ok(()),
            TaskStatus::Completed | TaskStatus::Failed => {
                Err(self.invalid_transition(TaskStatus::Cancelled))
            }
            TaskStatus::Pending | TaskStatus::Processing => {
                self.status = TaskStatus::Cancelled;
                self.touch(clock);
                Ok(())
            }
        }
    }

    const fn invalid_transition(&self, attempted: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidTransition {
            id: self.id,
            from: self.status,
            attempted,
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
