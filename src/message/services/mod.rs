//! Application services for the message orchestrator.

mod orchestrator;

pub use orchestrator::{
    EnqueueMessageRequest, EnqueueSequenceRequest, MessageDispatchReport,
    MessageOrchestratorService, MessageServiceError, MessageServiceResult,
};
