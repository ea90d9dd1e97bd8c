//! Append, delivery, and dead-letter orchestration for the event log.

use crate::event_log::{
    domain::{DeadLetter, DeadLetterId, DeadLetterKind, Event, EventId, NewEvent},
    ports::{
        DeadLetterRepository, EventHandler, EventLogRepositoryError, EventRepository, HandlerError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Delivery attempts per handler before an event is parked.
const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Service-level errors for event log operations.
#[derive(Debug, Error)]
pub enum EventLogServiceError {
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] EventLogRepositoryError),

    /// The referenced event does not exist.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// The dead letter references work this service cannot replay.
    #[error("dead letter {0} is not replayable through the event log")]
    NotReplayable(DeadLetterId),

    /// A manual replay ran and the handler still failed.
    #[error("dead letter {0} replay failed; entry retained")]
    ReplayFailed(DeadLetterId),
}

/// Result type for event log service operations.
pub type EventLogServiceResult<T> = Result<T, EventLogServiceError>;

/// Append-only event log with at-least-once handler delivery.
///
/// Handlers are registered at construction time; a handler that keeps
/// failing parks the event in the dead-letter store without affecting
/// the append itself or the other handlers.
#[derive(Clone)]
pub struct EventLogService<ER, DR, C>
where
    ER: EventRepository,
    DR: DeadLetterRepository,
    C: Clock + Send + Sync,
{
    events: Arc<ER>,
    dead_letters: Arc<DR>,
    clock: Arc<C>,
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl<ER, DR, C> EventLogService<ER, DR, C>
where
    ER: EventRepository,
    DR: DeadLetterRepository,
    C: Clock + Send + Sync,
{
    /// Creates an event log service with no subscribers.
    #[must_use]
    pub const fn new(events: Arc<ER>, dead_letters: Arc<DR>, clock: Arc<C>) -> Self {
        Self {
            events,
            dead_letters,
            clock,
            handlers: Vec::new(),
        }
    }

    /// Registers a subscriber.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Appends an event and delivers it to interested subscribers.
    ///
    /// The append succeeds independently of handler outcomes: failing
    /// handlers are retried up to the delivery bound and then parked in
    /// the dead-letter store.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogServiceError::Repository`] when the append
    /// itself cannot be persisted.
    pub async fn append(&self, params: NewEvent) -> EventLogServiceResult<Event> {
        let event = Event::new(params, &*self.clock);
        self.events.append(&event).await?;
        tracing::info!(
            event_type = event.event_type(),
            aggregate = %event.aggregate_id(),
            "event appended"
        );
        self.deliver(&event, true).await;
        Ok(event)
    }

    /// Returns the ordered event history for one aggregate.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogServiceError::Repository`] when the lookup
    /// fails.
    pub async fn replay(&self, aggregate_id: Uuid) -> EventLogServiceResult<Vec<Event>> {
        Ok(self.events.list_for_aggregate(aggregate_id).await?)
    }

    /// Re-delivers a stored event to its subscribers.
    ///
    /// Manual operator surface; handlers must already tolerate
    /// redelivery.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogServiceError::EventNotFound`] when the event
    /// does not exist.
    pub async fn redeliver(&self, event_id: EventId) -> EventLogServiceResult<()> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(EventLogServiceError::EventNotFound(event_id))?;
        self.deliver(&event, true).await;
        Ok(())
    }

    /// Lists dead-letter entries for operator inspection.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogServiceError::Repository`] when the lookup
    /// fails.
    pub async fn dead_letters(&self, limit: u32) -> EventLogServiceResult<Vec<DeadLetter>> {
        Ok(self.dead_letters.list(limit).await?)
    }

    /// Replays a parked event and removes the entry on success.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogServiceError::NotReplayable`] for task entries
    /// (those re-enter through the task queue) and
    /// [`EventLogServiceError::ReplayFailed`] when a handler still
    /// fails; the entry is retained in that case.
    pub async fn retry_dead_letter(&self, id: DeadLetterId) -> EventLogServiceResult<()> {
        let letter = self
            .dead_letters
            .find_by_id(id)
            .await?
            .ok_or(EventLogRepositoryError::DeadLetterNotFound(id))?;

        let DeadLetterKind::Event { event_id } = letter.kind() else {
            return Err(EventLogServiceError::NotReplayable(id));
        };

        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(EventLogServiceError::EventNotFound(event_id))?;

        if !self.deliver(&event, false).await {
            return Err(EventLogServiceError::ReplayFailed(id));
        }
        self.dead_letters.remove(id).await?;
        Ok(())
    }

    /// Delivers an event to every interested handler.
    ///
    /// Returns `true` when all interested handlers succeeded. With
    /// `park_on_failure`, an exhausted or business-failed handler parks
    /// the event.
    async fn deliver(&self, event: &Event, park_on_failure: bool) -> bool {
        let mut all_succeeded = true;
        for handler in &self.handlers {
            if !handler.interested_in(event) {
                continue;
            }
            if !self
                .deliver_to_handler(event, handler.as_ref(), park_on_failure)
                .await
            {
                all_succeeded = false;
            }
        }
        all_succeeded
    }

    async fn deliver_to_handler(
        &self,
        event: &Event,
        handler: &dyn EventHandler,
        park_on_failure: bool,
    ) -> bool {
        let mut errors = Vec::new();
        let mut attempts = 0;

        while attempts < MAX_DELIVERY_ATTEMPTS {
            attempts += 1;
            match handler.handle(event).await {
                Ok(()) => return true,
                Err(HandlerError::Business(message)) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event = %event.id(),
                        error = %message,
                        "handler rejected event on business grounds"
                    );
                    errors.push(format!("{}: {message}", handler.name()));
                    break;
                }
                Err(HandlerError::Transient(message)) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event = %event.id(),
                        attempt = attempts,
                        error = %message,
                        "transient handler failure"
                    );
                    errors.push(format!("{}: {message}", handler.name()));
                }
            }
        }

        if park_on_failure {
            self.park(event, errors, attempts).await;
        }
        false
    }

    async fn park(&self, event: &Event, errors: Vec<String>, attempts: u32) {
        let payload = serde_json::to_value(event.payload()).unwrap_or(serde_json::Value::Null);
        let letter = DeadLetter::new(
            DeadLetterKind::Event {
                event_id: event.id(),
            },
            payload,
            errors,
            attempts,
            &*self.clock,
        );
        if let Err(err) = self.dead_letters.store(&letter).await {
            tracing::error!(
                event = %event.id(),
                error = %err,
                "failed to park event in dead-letter store"
            );
        } else {
            tracing::warn!(
                event = %event.id(),
                letter = %letter.id(),
                "event parked in dead-letter store"
            );
        }
    }
}
