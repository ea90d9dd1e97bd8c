//! Domain error types for the task queue.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors raised by task queue domain transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskDomainError {
    /// A lifecycle transition was attempted from an incompatible state.
    #[error("task {id} cannot move from {from} to {attempted}")]
    InvalidTransition {
        /// The task that rejected the transition.
        id: TaskId,
        /// Its current status.
        from: TaskStatus,
        /// The requested target status.
        attempted: TaskStatus,
    },

    /// A status string did not match a known variant.
    #[error("invalid task status: '{0}'")]
    InvalidStatus(String),
}
