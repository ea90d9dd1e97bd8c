//! Repository port for task persistence, due-work lookup, and leasing.

use crate::identity::AgentKind;
use crate::task_queue::domain::{DispatchPriority, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Pending-queue depth for one worker type and priority band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDepth {
    /// Worker type the tasks belong to.
    pub agent_type: AgentKind,
    /// Priority band.
    pub priority: DispatchPriority,
    /// Number of pending tasks.
    pub count: u64,
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task
    /// identifier already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns due pending tasks, highest priority first, oldest
    /// schedule first within a band, up to `limit`.
    async fn list_due(&self, now: DateTime<Utc>, limit: u32) -> TaskRepositoryResult<Vec<Task>>;

    /// Attempts the non-blocking lease: flips `pending` to `processing`
    /// only when the row is still pending.
    ///
    /// Returns `true` when this caller won the lease; `false` when some
    /// other dispatcher already holds it (or the row left `pending`).
    async fn claim(&self, id: TaskId, now: DateTime<Utc>) -> TaskRepositoryResult<bool>;

    /// Returns tasks in the given status, oldest first, up to `limit`.
    async fn list_by_status(
        &self,
        status: TaskStatus,
        limit: u32,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns pending-queue depths grouped by worker type and priority.
    async fn pending_depths(&self) -> TaskRepositoryResult<Vec<QueueDepth>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
