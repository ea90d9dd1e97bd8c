//! Port contracts for the message orchestrator.

mod gateway;
mod renderer;
mod repository;

pub use gateway::{DeliveryError, DeliveryGateway};
pub use renderer::{ContentRenderer, RenderError, RenderOutcome};
pub use repository::{
    MessageQueueDepth, MessageRepository, MessageRepositoryError, MessageRepositoryResult,
};
