//! `PostgreSQL` adapter for the credit ledger.

mod models;
mod repository;
mod schema;

pub use repository::{CreditPgPool, PostgresCreditLedger};
