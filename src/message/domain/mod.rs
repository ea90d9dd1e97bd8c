//! Domain model for the message orchestrator.

mod content;
mod error;
mod ids;
mod message;

pub use content::MessageContent;
pub use error::MessageDomainError;
pub use ids::{MessageId, SequenceId};
pub use message::{
    MessageContext, MessageStatus, NewQueuedMessage, PersistedMessageData, QueuedMessage,
    SequenceSlot,
};

/// Message dispatch reuses the task queue's priority bands.
pub type MessagePriority = crate::task_queue::domain::DispatchPriority;
