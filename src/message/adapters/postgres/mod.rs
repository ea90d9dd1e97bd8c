//! `PostgreSQL` adapter for the message orchestrator.

mod models;
mod repository;
mod schema;

pub use repository::{MessagePgPool, PostgresMessageRepository};
