//! `PostgreSQL` adapter for the priority ledger.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresPriorityRepository, PriorityPgPool};
