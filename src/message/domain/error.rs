//! Domain error types for the message orchestrator.

use super::{MessageId, MessageStatus};
use thiserror::Error;

/// Errors raised by message domain transitions and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageDomainError {
    /// A lifecycle transition was attempted from an incompatible state.
    #[error("message {id} cannot move from {from} to {attempted}")]
    InvalidTransition {
        /// The message that rejected the transition.
        id: MessageId,
        /// Its current status.
        from: MessageStatus,
        /// The requested target status.
        attempted: MessageStatus,
    },

    /// A status string did not match a known variant.
    #[error("invalid message status: '{0}'")]
    InvalidStatus(String),

    /// A sequence slot carried an impossible position.
    #[error("sequence position {position} is outside 1..={total}")]
    InvalidSequenceSlot {
        /// The offending position.
        position: u32,
        /// The sequence length.
        total: u32,
    },

    /// A sequence needs at least two parts.
    #[error("a message sequence needs at least two parts, got {0}")]
    SequenceTooShort(usize),
}
