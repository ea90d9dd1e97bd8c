//! `PostgreSQL` repository implementation for the task queue.
//!
//! The lease is a single conditional `UPDATE ... WHERE status =
//! 'pending'`; dispatchers racing for the same row see exactly one
//! affected-row count of one.

use super::{
    models::{NewTaskRow, TaskRow},
    schema::tasks,
};
use crate::event_log::domain::AggregateType;
use crate::identity::{AgentKind, UserId};
use crate::task_queue::{
    domain::{
        DispatchPriority, PersistedTaskData, Task, TaskContext, TaskId, TaskPayload, TaskStatus,
    },
    ports::{QueueDepth, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task queue adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let id = task.id();
        let new_row = to_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let id = task.id();
        let changes = to_row(task)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.filter(tasks::id.eq(id.into_inner())))
                .set(&changes)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: u32) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(TaskStatus::Pending.as_str()))
                .filter(tasks::scheduled_for.le(now))
                .order((tasks::priority.asc(), tasks::scheduled_for.asc()))
                .limit(i64::from(limit))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn claim(&self, id: TaskId, now: DateTime<Utc>) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let claimed = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(id.into_inner()))
                    .filter(tasks::status.eq(TaskStatus::Pending.as_str())),
            )
            .set((
                tasks::status.eq(TaskStatus::Processing.as_str()),
                tasks::updated_at.eq(now),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            Ok(claimed == 1)
        })
        .await
    }

    async fn list_by_status(
        &self,
        status: TaskStatus,
        limit: u32,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(status.as_str()))
                .order(tasks::created_at.asc())
                .limit(i64::from(limit))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn pending_depths(&self) -> TaskRepositoryResult<Vec<QueueDepth>> {
        self.run_blocking(move |connection| {
            let rows: Vec<(String, i16, i64)> = tasks::table
                .filter(tasks::status.eq(TaskStatus::Pending.as_str()))
                .group_by((tasks::agent_type, tasks::priority))
                .select((tasks::agent_type, tasks::priority, diesel::dsl::count_star()))
                .order((tasks::agent_type.asc(), tasks::priority.asc()))
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;

            rows.into_iter()
                .map(|(agent, rank, count)| {
                    let agent_type =
                        AgentKind::new(agent).map_err(TaskRepositoryError::persistence)?;
                    let priority = DispatchPriority::from_rank(rank)
                        .map_err(TaskRepositoryError::persistence)?;
                    let count = u64::try_from(count).map_err(TaskRepositoryError::persistence)?;
                    Ok(QueueDepth {
                        agent_type,
                        priority,
                        count,
                    })
                })
                .collect()
        })
        .await
    }
}

fn to_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    let payload =
        serde_json::to_value(task.payload()).map_err(TaskRepositoryError::persistence)?;
    let error_log =
        serde_json::to_value(task.error_log()).map_err(TaskRepositoryError::persistence)?;
    let retry_count =
        i32::try_from(task.retry_count()).map_err(TaskRepositoryError::persistence)?;
    let max_retries =
        i32::try_from(task.max_retries()).map_err(TaskRepositoryError::persistence)?;

    Ok(NewTaskRow {
        id: task.id().into_inner(),
        task_type: task.task_type().to_owned(),
        agent_type: task.agent_type().as_str().to_owned(),
        user_id: task.user_id().map(UserId::into_inner),
        context_type: task
            .context()
            .map(|context| context.context_type.as_str().to_owned()),
        context_id: task.context().map(|context| context.context_id),
        scheduled_for: task.scheduled_for(),
        priority: task.priority().rank(),
        status: task.status().as_str().to_owned(),
        retry_count,
        max_retries,
        payload,
        result_payload: task.result_payload().cloned(),
        error_log,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let payload: TaskPayload =
        serde_json::from_value(row.payload).map_err(TaskRepositoryError::persistence)?;
    let agent_type = AgentKind::new(row.agent_type).map_err(TaskRepositoryError::persistence)?;
    let priority =
        DispatchPriority::from_rank(row.priority).map_err(TaskRepositoryError::persistence)?;
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let error_log: Vec<String> =
        serde_json::from_value(row.error_log).map_err(TaskRepositoryError::persistence)?;
    let retry_count =
        u32::try_from(row.retry_count).map_err(TaskRepositoryError::persistence)?;
    let max_retries =
        u32::try_from(row.max_retries).map_err(TaskRepositoryError::persistence)?;

    let context = match (row.context_type, row.context_id) {
        (Some(kind), Some(context_id)) => {
            let context_type = AggregateType::try_from(kind.as_str())
                .map_err(TaskRepositoryError::persistence)?;
            Some(TaskContext {
                context_type,
                context_id,
            })
        }
        _ => None,
    };

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        payload,
        agent_type,
        user_id: row.user_id.map(UserId::from_uuid),
        context,
        scheduled_for: row.scheduled_for,
        priority,
        status,
        retry_count,
        max_retries,
        result_payload: row.result_payload,
        error_log,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
