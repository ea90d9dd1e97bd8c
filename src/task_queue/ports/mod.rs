//! Port contracts for the task queue.

mod repository;

pub use repository::{QueueDepth, TaskRepository, TaskRepositoryError, TaskRepositoryResult};
