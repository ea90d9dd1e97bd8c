//! Port contracts for the priority ledger.

mod repository;

pub use repository::{PriorityRepository, PriorityRepositoryError, PriorityRepositoryResult};
