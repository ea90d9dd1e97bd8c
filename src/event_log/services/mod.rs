//! Application services for the event log.

mod log;

pub use log::{EventLogService, EventLogServiceError, EventLogServiceResult};
