//! In-memory event store for tests and single-process use.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::event_log::{
    domain::{Event, EventId},
    ports::{EventLogRepositoryError, EventLogResult, EventRepository},
};

/// Thread-safe in-memory event repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<InMemoryEventState>>,
}

#[derive(Debug, Default)]
struct InMemoryEventState {
    events: Vec<Event>,
    ids: HashSet<EventId>,
}

impl InMemoryEventStore {
    /// Creates an empty in-memory event store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> EventLogRepositoryError {
    EventLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl EventRepository for InMemoryEventStore {
    async fn append(&self, event: &Event) -> EventLogResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.ids.contains(&event.id()) {
            return Err(EventLogRepositoryError::DuplicateEvent(event.id()));
        }
        state.ids.insert(event.id());
        state.events.push(event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: EventId) -> EventLogResult<Option<Event>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.events.iter().find(|event| event.id() == id).cloned())
    }

    async fn list_for_aggregate(&self, aggregate_id: Uuid) -> EventLogResult<Vec<Event>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .events
            .iter()
            .filter(|event| event.aggregate_id() == aggregate_id)
            .cloned()
            .collect())
    }
}
