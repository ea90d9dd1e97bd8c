//! Domain model for the event log.

mod dead_letter;
mod error;
mod event;
mod ids;
mod payload;

pub use dead_letter::{DeadLetter, DeadLetterKind, PersistedDeadLetterData};
pub use error::EventDomainError;
pub use event::{AggregateType, Event, EventMetadata, NewEvent, PersistedEventData};
pub use ids::{DeadLetterId, EventId};
pub use payload::EventPayload;
