//! `PostgreSQL` adapter for the event log.

mod models;
mod repository;
mod schema;

pub use repository::{EventLogPgPool, PostgresDeadLetterStore, PostgresEventStore};
