//! Domain model for the task queue.

mod error;
mod ids;
mod payload;
mod priority;
mod task;

pub use error::TaskDomainError;
pub use ids::TaskId;
pub use payload::TaskPayload;
pub use priority::{DispatchPriority, ParseDispatchPriorityError};
pub use task::{
    FailureDisposition, NewTask, PersistedTaskData, Task, TaskContext, TaskStatus,
};
