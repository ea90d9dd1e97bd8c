//! Port contracts for the event log.

mod handler;
mod repository;

pub use handler::{EventHandler, HandlerError};
pub use repository::{
    DeadLetterRepository, EventLogRepositoryError, EventLogResult, EventRepository,
};
