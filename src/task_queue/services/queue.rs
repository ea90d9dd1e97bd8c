//! Enqueue, dispatch, and retry orchestration for the task queue.

use crate::config::TaskQueueConfig;
use crate::event_log::{
    domain::{AggregateType, DeadLetter, DeadLetterKind, EventMetadata, EventPayload, NewEvent},
    ports::{DeadLetterRepository, EventRepository},
    services::{EventLogService, EventLogServiceError},
};
use crate::identity::{AgentKind, UserId};
use crate::task_queue::{
    domain::{
        DispatchPriority, FailureDisposition, NewTask, Task, TaskContext, TaskDomainError, TaskId,
        TaskPayload, TaskStatus,
    },
    ports::{QueueDepth, TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Upper bound on rows touched by a manual drain.
const DRAIN_BATCH_LIMIT: u32 = 10_000;

/// Request payload for enqueueing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueTaskRequest {
    /// Typed work payload.
    pub payload: TaskPayload,
    /// Worker type that owns the task.
    pub agent_type: AgentKind,
    /// Member the task concerns, when any.
    pub user_id: Option<UserId>,
    /// Entity the task operates on, when any.
    pub context: Option<TaskContext>,
    /// Dispatch priority band.
    pub priority: DispatchPriority,
    /// Earliest dispatch time; `None` means immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Retry ceiling override; `None` takes the configured default.
    pub max_retries: Option<u32>,
}

/// Outcome of one dispatch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Tasks this dispatcher claimed and announced.
    pub claimed: Vec<TaskId>,
    /// Due rows skipped because another dispatcher won the lease.
    pub lost_leases: u32,
}

/// Service-level errors for task queue operations.
#[derive(Debug, Error)]
pub enum TaskQueueServiceError {
    /// Domain transition failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Event log append failed.
    #[error(transparent)]
    EventLog(#[from] EventLogServiceError),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Result type for task queue service operations.
pub type TaskQueueServiceResult<T> = Result<T, TaskQueueServiceError>;

/// Leased task queue orchestration service.
#[derive(Clone)]
pub struct TaskQueueService<R, ER, DR, C>
where
    R: TaskRepository,
    ER: EventRepository,
    DR: DeadLetterRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    event_log: Arc<EventLogService<ER, DR, C>>,
    dead_letters: Arc<DR>,
    clock: Arc<C>,
    config: TaskQueueConfig,
}

impl<R, ER, DR, C> TaskQueueService<R, ER, DR, C>
where
    R: TaskRepository,
    ER: EventRepository,
    DR: DeadLetterRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task queue service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        event_log: Arc<EventLogService<ER, DR, C>>,
        dead_letters: Arc<DR>,
        clock: Arc<C>,
        config: TaskQueueConfig,
    ) -> Self {
        Self {
            repository,
            event_log,
            dead_letters,
            clock,
            config,
        }
    }

    /// Enqueues a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::Repository`] when persistence
    /// fails.
    pub async fn enqueue(&self, request: EnqueueTaskRequest) -> TaskQueueServiceResult<Task> {
        let task = Task::new(
            NewTask {
                payload: request.payload,
                agent_type: request.agent_type,
                user_id: request.user_id,
                context: request.context,
                scheduled_for: request.scheduled_for.unwrap_or_else(|| self.clock.utc()),
                priority: request.priority,
                max_retries: request.max_retries.unwrap_or(self.config.default_max_retries),
            },
            &*self.clock,
        );
        self.repository.store(&task).await?;
        tracing::debug!(
            task = %task.id(),
            task_type = task.task_type(),
            agent = %task.agent_type(),
            "task enqueued"
        );
        Ok(task)
    }

    /// Claims up to `limit` due tasks and announces each claim.
    ///
    /// Rows another dispatcher claims between selection and lease are
    /// skipped without waiting; they are counted in the report.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError`] when selection, leasing, or the
    /// ready-event append fails.
    pub async fn dispatch_batch(&self, limit: u32) -> TaskQueueServiceResult<DispatchReport> {
        let now = self.clock.utc();
        let due = self.repository.list_due(now, limit).await?;
        let mut report = DispatchReport::default();

        for task in due {
            if self.repository.claim(task.id(), now).await? {
                self.announce_ready(&task).await?;
                report.claimed.push(task.id());
            } else {
                report.lost_leases += 1;
            }
        }

        if !report.claimed.is_empty() || report.lost_leases > 0 {
            tracing::info!(
                claimed = report.claimed.len(),
                lost = report.lost_leases,
                "task dispatch batch finished"
            );
        }
        Ok(report)
    }

    /// Marks a leased task completed.
    ///
    /// A task cancelled after claiming resolves to a no-op so the
    /// worker's side effects stay skipped; a task already completed
    /// resolves to a no-op for redelivery safety.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::NotFound`] for unknown tasks and
    /// [`TaskQueueServiceError::Domain`] for failed tasks.
    pub async fn complete(
        &self,
        task_id: TaskId,
        result_payload: Option<Value>,
    ) -> TaskQueueServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        match task.status() {
            TaskStatus::Cancelled | TaskStatus::Completed => return Ok(task),
            _ => {}
        }

        task.complete(result_payload, &*self.clock)?;
        self.repository.update(&task).await?;
        self.publish(
            EventPayload::TaskCompleted {
                task_id: task_id.into_inner(),
            },
            task_id,
        )
        .await?;
        Ok(task)
    }

    /// Records a failed attempt, rescheduling with backoff while the
    /// retry budget lasts and parking the task once it is spent.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::NotFound`] for unknown tasks and
    /// [`TaskQueueServiceError::Domain`] when the task is not leased.
    pub async fn fail(&self, task_id: TaskId, error: String) -> TaskQueueServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        if task.status() == TaskStatus::Cancelled {
            return Ok(task);
        }

        let backoff = Duration::seconds(
            i64::try_from(self.config.backoff_secs(task.retry_count())).unwrap_or(i64::MAX),
        );
        let disposition = task.record_failure(error.clone(), backoff, &*self.clock)?;
        self.repository.update(&task).await?;

        let will_retry = matches!(disposition, FailureDisposition::Retry { .. });
        if !will_retry {
            self.park_exhausted(&task).await;
        }
        self.publish(
            EventPayload::TaskFailed {
                task_id: task_id.into_inner(),
                error,
                will_retry,
            },
            task_id,
        )
        .await?;

        match disposition {
            FailureDisposition::Retry { attempt } => {
                tracing::warn!(task = %task_id, attempt, "task attempt failed; retry scheduled");
            }
            FailureDisposition::Exhausted => {
                tracing::error!(task = %task_id, "task retries exhausted; parked");
            }
        }
        Ok(task)
    }

    /// Cancels a task cooperatively.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::NotFound`] for unknown tasks and
    /// [`TaskQueueServiceError::Domain`] for completed or failed ones.
    pub async fn cancel(&self, task_id: TaskId) -> TaskQueueServiceResult<Task> {
        let mut task = self.load(task_id).await?;
        task.cancel(&*self.clock)?;
        self.repository.update(&task).await?;
        Ok(task)
    }

    /// Returns a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::NotFound`] for unknown tasks.
    pub async fn find(&self, task_id: TaskId) -> TaskQueueServiceResult<Task> {
        self.load(task_id).await
    }

    /// Returns pending-queue depths by worker type and priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::Repository`] when the lookup
    /// fails.
    pub async fn pending_depths(&self) -> TaskQueueServiceResult<Vec<QueueDepth>> {
        Ok(self.repository.pending_depths().await?)
    }

    /// Cancels every pending task. Test and operations surface only.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueServiceError::Repository`] when selection or
    /// updates fail.
    pub async fn drain_pending(&self) -> TaskQueueServiceResult<u32> {
        let pending = self
            .repository
            .list_by_status(TaskStatus::Pending, DRAIN_BATCH_LIMIT)
            .await?;
        let mut drained = 0;
        for mut task in pending {
            task.cancel(&*self.clock)?;
            self.repository.update(&task).await?;
            drained += 1;
        }
        tracing::info!(drained, "pending queue drained");
        Ok(drained)
    }

    async fn load(&self, task_id: TaskId) -> TaskQueueServiceResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskQueueServiceError::NotFound(task_id))
    }

    async fn announce_ready(&self, task: &Task) -> TaskQueueServiceResult<()> {
        self.publish(
            EventPayload::TaskReady {
                task_id: task.id().into_inner(),
                task_type: task.task_type().to_owned(),
                agent_type: task.agent_type().clone(),
            },
            task.id(),
        )
        .await
    }

    async fn publish(&self, payload: EventPayload, task_id: TaskId) -> TaskQueueServiceResult<()> {
        self.event_log
            .append(NewEvent {
                payload,
                aggregate_id: task_id.into_inner(),
                aggregate_type: AggregateType::Task,
                metadata: EventMetadata::default(),
                created_by: AgentKind::internal("task_queue"),
            })
            .await?;
        Ok(())
    }

    async fn park_exhausted(&self, task: &Task) {
        let payload = serde_json::to_value(task.payload()).unwrap_or(Value::Null);
        let letter = DeadLetter::new(
            DeadLetterKind::Task {
                task_id: task.id().into_inner(),
            },
            payload,
            task.error_log().to_vec(),
            task.retry_count(),
            &*self.clock,
        );
        if let Err(err) = self.dead_letters.store(&letter).await {
            tracing::error!(task = %task.id(), error = %err, "failed to park exhausted task");
        }
    }
}
