//! `PostgreSQL` adapter for the task queue.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool};
