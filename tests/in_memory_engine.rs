//! End-to-end engine flows over the in-memory adapters.
//!
//! Wires the real services together the way a single-process deployment
//! would: sagas apply their side effects through the engine effects
//! adapter, so completions reach the priority ledger, credit ledger,
//! message queue, task queue, and event log for real.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::sync::Arc;

use liaison::config::{EngineConfig, MessagingConfig};
use liaison::credit::adapters::memory::InMemoryCreditLedger;
use liaison::credit::services::CreditLedgerService;
use liaison::event_log::adapters::memory::{InMemoryDeadLetterStore, InMemoryEventStore};
use liaison::event_log::ports::EventRepository;
use liaison::event_log::services::EventLogService;
use liaison::identity::UserId;
use liaison::message::adapters::memory::{InMemoryMessageRepository, RecordingGateway};
use liaison::message::adapters::template::MiniJinjaRenderer;
use liaison::message::ports::MessageRepository;
use liaison::message::services::MessageOrchestratorService;
use liaison::priority::adapters::memory::InMemoryPriorityRepository;
use liaison::priority::domain::{PriorityItemType, PriorityKey, PriorityStatus};
use liaison::priority::ports::PriorityRepository;
use liaison::priority::services::PriorityLedgerService;
use liaison::saga::adapters::engine::EngineEffects;
use liaison::saga::adapters::memory::{InMemoryOfferRepository, InMemoryOpportunityRepository};
use liaison::saga::domain::OpportunityStatus;
use liaison::saga::ports::OpportunityRepository;
use liaison::saga::services::{
    CreateOfferRequest, OfferService, OpenOpportunityRequest, OpportunityService,
};
use liaison::task_queue::adapters::memory::InMemoryTaskRepository;
use liaison::task_queue::domain::TaskStatus;
use liaison::task_queue::ports::TaskRepository;
use liaison::task_queue::services::TaskQueueService;
use mockable::DefaultClock;

type Effects = EngineEffects<
    InMemoryEventStore,
    InMemoryDeadLetterStore,
    InMemoryPriorityRepository,
    InMemoryCreditLedger,
    InMemoryMessageRepository,
    RecordingGateway,
    MiniJinjaRenderer,
    InMemoryTaskRepository,
    DefaultClock,
>;

struct Engine {
    opportunities: OpportunityService<InMemoryOpportunityRepository, Effects, DefaultClock>,
    offers: OfferService<InMemoryOfferRepository, Effects, DefaultClock>,
    credit: Arc<CreditLedgerService<InMemoryCreditLedger, DefaultClock>>,
    opportunity_repo: Arc<InMemoryOpportunityRepository>,
    priority_repo: Arc<InMemoryPriorityRepository>,
    message_repo: Arc<InMemoryMessageRepository>,
    task_repo: Arc<InMemoryTaskRepository>,
    events: Arc<InMemoryEventStore>,
}

fn engine() -> Engine {
    let config = EngineConfig::default();
    let clock = Arc::new(DefaultClock);

    let events = Arc::new(InMemoryEventStore::new());
    let dead_letters = Arc::new(InMemoryDeadLetterStore::new());
    let event_log = Arc::new(EventLogService::new(
        Arc::clone(&events),
        Arc::clone(&dead_letters),
        Arc::clone(&clock),
    ));

    let priority_repo = Arc::new(InMemoryPriorityRepository::new());
    let priority = Arc::new(PriorityLedgerService::new(
        Arc::clone(&priority_repo),
        Arc::clone(&clock),
    ));

    let credit_repo = Arc::new(InMemoryCreditLedger::new());
    let credit = Arc::new(CreditLedgerService::new(
        Arc::clone(&credit_repo),
        Arc::clone(&clock),
    ));

    let message_repo = Arc::new(InMemoryMessageRepository::new());
    let messages = Arc::new(MessageOrchestratorService::new(
        Arc::clone(&message_repo),
        Arc::new(RecordingGateway::new()),
        Arc::new(MiniJinjaRenderer::new()),
        Arc::clone(&clock),
        MessagingConfig {
            quiet_hours: None,
            ..config.messaging.clone()
        },
    ));

    let task_repo = Arc::new(InMemoryTaskRepository::new());
    let tasks = Arc::new(TaskQueueService::new(
        Arc::clone(&task_repo),
        Arc::clone(&event_log),
        Arc::clone(&dead_letters),
        Arc::clone(&clock),
        config.task_queue,
    ));

    let effects = Arc::new(EngineEffects::new(
        Arc::clone(&event_log),
        priority,
        Arc::clone(&credit),
        messages,
        tasks,
    ));

    let opportunity_repo = Arc::new(InMemoryOpportunityRepository::new());
    let opportunities = OpportunityService::new(
        Arc::clone(&opportunity_repo),
        Arc::clone(&effects),
        Arc::clone(&clock),
        config.saga.clone(),
    );
    let offers = OfferService::new(
        Arc::new(InMemoryOfferRepository::new()),
        effects,
        clock,
        config.saga,
    );

    Engine {
        opportunities,
        offers,
        credit,
        opportunity_repo,
        priority_repo,
        message_repo,
        task_repo,
        events,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn completed_opportunity_pays_once_and_clears_rivals() {
    let engine = engine();
    let connector = UserId::new();
    let rival_connector = UserId::new();

    let winner = engine
        .opportunities
        .open(OpenOpportunityRequest {
            connector_id: connector,
            requester_id: UserId::new(),
            subject: "Nadia Osei".to_owned(),
            bounty: Some(50),
        })
        .await
        .expect("open should succeed");
    let rival = engine
        .opportunities
        .open(OpenOpportunityRequest {
            connector_id: rival_connector,
            requester_id: UserId::new(),
            subject: "Nadia Osei".to_owned(),
            bounty: Some(40),
        })
        .await
        .expect("rival open should succeed");

    engine
        .opportunities
        .accept(winner.id())
        .await
        .expect("accept should succeed");
    engine
        .opportunities
        .complete(winner.id())
        .await
        .expect("complete should succeed");

    // Exactly one ledger line for the connector, at the full bounty.
    let history = engine
        .credit
        .history(connector)
        .await
        .expect("history lookup should succeed");
    assert_eq!(history.len(), 1);
    assert_eq!(
        history.first().expect("one ledger line").amount().value(),
        50
    );
    let balance = engine
        .credit
        .balance(connector)
        .await
        .expect("balance lookup should succeed")
        .expect("balance should be cached");
    assert_eq!(balance.balance, 50);

    // The originating priority item is actioned.
    let item = engine
        .priority_repo
        .find_by_key(&PriorityKey {
            user_id: connector,
            item_type: PriorityItemType::Opportunity,
            item_id: winner.id().into_inner(),
        })
        .await
        .expect("priority lookup should succeed")
        .expect("priority item should exist");
    assert_eq!(item.status(), PriorityStatus::Actioned);

    // The rival opportunity for the same prospect is expired, and its
    // priority item with it.
    let rival_row = engine
        .opportunity_repo
        .find_by_id(rival.id())
        .await
        .expect("rival lookup should succeed")
        .expect("rival should exist");
    assert_eq!(rival_row.status(), OpportunityStatus::Expired);
    let rival_item = engine
        .priority_repo
        .find_by_key(&PriorityKey {
            user_id: rival_connector,
            item_type: PriorityItemType::Opportunity,
            item_id: rival.id().into_inner(),
        })
        .await
        .expect("priority lookup should succeed")
        .expect("rival priority item should exist");
    assert_eq!(rival_item.status(), PriorityStatus::Expired);

    // Close-loop notifications are queued for both parties.
    let depths = engine
        .message_repo
        .queued_depths()
        .await
        .expect("depth query should succeed");
    let queued: u64 = depths.iter().map(|depth| depth.count).sum();
    assert_eq!(queued, 2);

    // The audit trail records the completion.
    let log = engine
        .events
        .list_for_aggregate(winner.id().into_inner())
        .await
        .expect("event lookup should succeed");
    assert!(log.iter().any(|event| event.event_type() == "opportunity.completed"));

    // A replayed completion changes nothing.
    engine
        .opportunities
        .complete(winner.id())
        .await
        .expect("replayed completion should succeed");
    let replayed_history = engine
        .credit
        .history(connector)
        .await
        .expect("history lookup should succeed");
    assert_eq!(replayed_history.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn accepted_offer_schedules_the_connector_reminder_task() {
    let engine = engine();

    let offer = engine
        .offers
        .create(CreateOfferRequest {
            introducee_id: UserId::new(),
            connector_id: UserId::new(),
            subject: "Nadia Osei".to_owned(),
            bounty: None,
        })
        .await
        .expect("create should succeed");
    engine
        .offers
        .introducee_accept(offer.id())
        .await
        .expect("acceptance should succeed");

    let pending = engine
        .task_repo
        .list_by_status(TaskStatus::Pending, 10)
        .await
        .expect("task lookup should succeed");
    assert_eq!(pending.len(), 1);
    let reminder = pending.first().expect("one pending task");
    assert_eq!(reminder.task_type(), "offer_reminder");
    assert!(reminder.scheduled_for() > reminder.created_at());
}
