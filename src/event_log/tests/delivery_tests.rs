//! Append, delivery, retry, and dead-letter behaviour.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::event_log::{
    adapters::memory::{InMemoryDeadLetterStore, InMemoryEventStore},
    domain::{AggregateType, Event, EventMetadata, EventPayload, NewEvent},
    ports::{EventHandler, HandlerError},
    services::EventLogService,
};
use crate::identity::AgentKind;
use async_trait::async_trait;
use mockable::DefaultClock;
use uuid::Uuid;

type TestService = EventLogService<InMemoryEventStore, InMemoryDeadLetterStore, DefaultClock>;

/// Handler that records delivery counts and fails a configurable number
/// of times before succeeding.
struct CountingHandler {
    name: String,
    failures_before_success: u32,
    calls: AtomicU32,
}

impl CountingHandler {
    fn new(name: &str, failures_before_success: u32) -> Self {
        Self {
            name: name.to_owned(),
            failures_before_success,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventHandler for CountingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn interested_in(&self, event: &Event) -> bool {
        matches!(event.payload(), EventPayload::OpportunityOpened { .. })
    }

    async fn handle(&self, _event: &Event) -> Result<(), HandlerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures_before_success {
            return Err(HandlerError::Transient("store unavailable".to_owned()));
        }
        Ok(())
    }
}

fn opportunity_event(aggregate_id: Uuid) -> NewEvent {
    NewEvent {
        payload: EventPayload::OpportunityOpened {
            opportunity_id: aggregate_id,
            connector_id: crate::identity::UserId::new(),
            subject: "Priya Raman".to_owned(),
        },
        aggregate_id,
        aggregate_type: AggregateType::Opportunity,
        metadata: EventMetadata::default(),
        created_by: AgentKind::new("matchmaker").expect("valid agent kind"),
    }
}

fn service_with(handler: Arc<CountingHandler>) -> (TestService, Arc<InMemoryDeadLetterStore>) {
    let dead_letters = Arc::new(InMemoryDeadLetterStore::new());
    let service = EventLogService::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::clone(&dead_letters),
        Arc::new(DefaultClock),
    )
    .with_handler(handler);
    (service, dead_letters)
}

#[tokio::test(flavor = "multi_thread")]
async fn append_delivers_to_interested_handlers() {
    let handler = Arc::new(CountingHandler::new("priority-deriver", 0));
    let (service, _) = service_with(Arc::clone(&handler));

    service
        .append(opportunity_event(Uuid::new_v4()))
        .await
        .expect("append should succeed");

    assert_eq!(handler.calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_are_retried_within_the_bound() {
    let handler = Arc::new(CountingHandler::new("priority-deriver", 2));
    let (service, _dead_letters) = service_with(Arc::clone(&handler));

    service
        .append(opportunity_event(Uuid::new_v4()))
        .await
        .expect("append should succeed");

    assert_eq!(handler.calls(), 3);
    let parked = service.dead_letters(10).await.expect("listing should work");
    assert!(parked.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_delivery_parks_the_event() {
    let handler = Arc::new(CountingHandler::new("priority-deriver", u32::MAX));
    let (service, _) = service_with(Arc::clone(&handler));

    let event = service
        .append(opportunity_event(Uuid::new_v4()))
        .await
        .expect("append should succeed even when handlers fail");

    let parked = service.dead_letters(10).await.expect("listing should work");
    assert_eq!(parked.len(), 1);
    let letter = parked.first().expect("one dead letter");
    assert_eq!(letter.attempts(), 3);
    assert_eq!(letter.error_log().len(), 3);
    assert_eq!(
        letter.kind().reference_id(),
        event.id().into_inner()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn retry_dead_letter_replays_and_removes_the_entry() {
    // Fails the initial three attempts, succeeds on the fourth call.
    let handler = Arc::new(CountingHandler::new("priority-deriver", 3));
    let (service, _) = service_with(Arc::clone(&handler));

    service
        .append(opportunity_event(Uuid::new_v4()))
        .await
        .expect("append should succeed");
    let parked = service.dead_letters(10).await.expect("listing should work");
    let letter_id = parked.first().expect("one dead letter").id();

    service
        .retry_dead_letter(letter_id)
        .await
        .expect("manual replay should succeed");

    let remaining = service.dead_letters(10).await.expect("listing should work");
    assert!(remaining.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn replay_returns_aggregate_history_in_order() {
    let handler = Arc::new(CountingHandler::new("priority-deriver", 0));
    let (service, _) = service_with(handler);
    let aggregate = Uuid::new_v4();

    let first = service
        .append(opportunity_event(aggregate))
        .await
        .expect("first append should succeed");
    let second = service
        .append(NewEvent {
            payload: EventPayload::OpportunityAccepted {
                opportunity_id: aggregate,
            },
            aggregate_id: aggregate,
            aggregate_type: AggregateType::Opportunity,
            metadata: EventMetadata::default(),
            created_by: AgentKind::new("concierge").expect("valid agent kind"),
        })
        .await
        .expect("second append should succeed");

    let history = service.replay(aggregate).await.expect("replay should work");
    let ids: Vec<_> = history.iter().map(Event::id).collect();
    assert_eq!(ids, vec![first.id(), second.id()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn redelivery_is_safe_for_idempotent_handlers() {
    let handler = Arc::new(CountingHandler::new("priority-deriver", 0));
    let (service, _) = service_with(Arc::clone(&handler));

    let event = service
        .append(opportunity_event(Uuid::new_v4()))
        .await
        .expect("append should succeed");
    service
        .redeliver(event.id())
        .await
        .expect("redelivery should succeed");

    assert_eq!(handler.calls(), 2);
}
