//! In-memory repository for task queue tests and single-process use.
//!
//! The lease takes the state lock for the whole check-and-set, so
//! concurrent claimers see the same at-most-one-winner behaviour as the
//! conditional update in the `PostgreSQL` adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task_queue::{
    domain::{Task, TaskId, TaskStatus},
    ports::{QueueDepth, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !state.contains_key(&task.id()) {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        state.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.get(&id).cloned())
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: u32) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut due: Vec<Task> = state
            .values()
            .filter(|task| task.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.scheduled_for().cmp(&b.scheduled_for()))
        });
        due.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(due)
    }

    async fn claim(&self, id: TaskId, now: DateTime<Utc>) -> TaskRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(task) = state.get_mut(&id) else {
            return Ok(false);
        };
        if task.claim(&FixedClock(now)).is_err() {
            return Ok(false);
        }
        Ok(true)
    }

    async fn list_by_status(
        &self,
        status: TaskStatus,
        limit: u32,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = state
            .values()
            .filter(|task| task.status() == status)
            .cloned()
            .collect();
        tasks.sort_by_key(Task::created_at);
        tasks.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(tasks)
    }

    async fn pending_depths(&self) -> TaskRepositoryResult<Vec<QueueDepth>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut counts: HashMap<(String, i16), QueueDepth> = HashMap::new();
        for task in state.values() {
            if task.status() != TaskStatus::Pending {
                continue;
            }
            let key = (task.agent_type().as_str().to_owned(), task.priority().rank());
            counts
                .entry(key)
                .and_modify(|depth| depth.count += 1)
                .or_insert_with(|| QueueDepth {
                    agent_type: task.agent_type().clone(),
                    priority: task.priority(),
                    count: 1,
                });
        }
        let mut depths: Vec<QueueDepth> = counts.into_values().collect();
        depths.sort_by(|a, b| {
            a.agent_type
                .as_str()
                .cmp(b.agent_type.as_str())
                .then_with(|| a.priority.cmp(&b.priority))
        });
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
