//! Application services for the task queue.

mod queue;

pub use queue::{
    DispatchReport, EnqueueTaskRequest, TaskQueueService, TaskQueueServiceError,
    TaskQueueServiceResult,
};
