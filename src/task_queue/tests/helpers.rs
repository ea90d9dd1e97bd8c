//! Shared fixtures for task queue tests.

use std::sync::Arc;

use crate::config::TaskQueueConfig;
use crate::event_log::adapters::memory::{InMemoryDeadLetterStore, InMemoryEventStore};
use crate::event_log::services::EventLogService;
use crate::identity::AgentKind;
use crate::task_queue::adapters::memory::InMemoryTaskRepository;
use crate::task_queue::domain::{DispatchPriority, TaskPayload};
use crate::task_queue::services::{EnqueueTaskRequest, TaskQueueService};
use mockable::DefaultClock;

pub type TestQueue =
    TaskQueueService<InMemoryTaskRepository, InMemoryEventStore, InMemoryDeadLetterStore, DefaultClock>;

pub struct TestHarness {
    pub queue: TestQueue,
    pub repository: Arc<InMemoryTaskRepository>,
    pub events: Arc<InMemoryEventStore>,
    pub dead_letters: Arc<InMemoryDeadLetterStore>,
}

pub fn harness(config: TaskQueueConfig) -> TestHarness {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let events = Arc::new(InMemoryEventStore::new());
    let dead_letters = Arc::new(InMemoryDeadLetterStore::new());
    let clock = Arc::new(DefaultClock);
    let event_log = Arc::new(EventLogService::new(
        Arc::clone(&events),
        Arc::clone(&dead_letters),
        Arc::clone(&clock),
    ));
    let queue = TaskQueueService::new(
        Arc::clone(&repository),
        event_log,
        Arc::clone(&dead_letters),
        clock,
        config,
    );
    TestHarness {
        queue,
        repository,
        events,
        dead_letters,
    }
}

pub fn sweep_request(priority: DispatchPriority) -> EnqueueTaskRequest {
    EnqueueTaskRequest {
        payload: TaskPayload::SagaExpirySweep,
        agent_type: AgentKind::new("concierge").expect("valid agent kind"),
        user_id: None,
        context: None,
        priority,
        scheduled_for: None,
        max_retries: None,
    }
}
