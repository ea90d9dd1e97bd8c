//! Opportunity lifecycle and completion-unit behaviour.

use std::sync::Arc;

use crate::config::SagaConfig;
use crate::credit::domain::CreditEventType;
use crate::identity::UserId;
use crate::saga::adapters::memory::{InMemoryOpportunityRepository, RecordedEffect, RecordingEffects};
use crate::saga::domain::OpportunityStatus;
use crate::saga::ports::OpportunityRepository;
use crate::saga::services::{OpenOpportunityRequest, OpportunityService};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService =
    OpportunityService<InMemoryOpportunityRepository, RecordingEffects, DefaultClock>;

struct TestHarness {
    service: TestService,
    repository: Arc<InMemoryOpportunityRepository>,
    effects: Arc<RecordingEffects>,
}

#[fixture]
fn harness() -> TestHarness {
    let repository = Arc::new(InMemoryOpportunityRepository::new());
    let effects = Arc::new(RecordingEffects::new());
    let service = OpportunityService::new(
        Arc::clone(&repository),
        Arc::clone(&effects),
        Arc::new(DefaultClock),
        SagaConfig::default(),
    );
    TestHarness {
        service,
        repository,
        effects,
    }
}

fn open_request(connector: UserId, subject: &str, bounty: i64) -> OpenOpportunityRequest {
    OpenOpportunityRequest {
        connector_id: connector,
        requester_id: UserId::new(),
        subject: subject.to_owned(),
        bounty: Some(bounty),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_applies_the_full_unit_of_work(harness: TestHarness) {
    let connector = UserId::new();
    let rival_connector = UserId::new();

    let winner = harness
        .service
        .open(open_request(connector, "Priya Raman", 50))
        .await
        .expect("open should succeed");
    let rival = harness
        .service
        .open(open_request(rival_connector, "Priya Raman", 40))
        .await
        .expect("rival open should succeed");

    harness
        .service
        .accept(winner.id())
        .await
        .expect("accept should succeed");
    let completed = harness
        .service
        .complete(winner.id())
        .await
        .expect("complete should succeed");
    assert_eq!(completed.status(), OpportunityStatus::Completed);

    let recorded = harness.effects.recorded();

    // Exactly one bounty award, for the winning connector, at 50.
    let awards: Vec<_> = recorded
        .iter()
        .filter(|effect| matches!(effect, RecordedEffect::BountyAwarded { .. }))
        .collect();
    assert_eq!(awards.len(), 1);
    assert!(matches!(
        awards.first(),
        Some(RecordedEffect::BountyAwarded {
            user_id,
            event_type: CreditEventType::IntroductionBounty,
            amount: 50,
            ..
        }) if *user_id == connector
    ));

    // The originating priority item is actioned.
    assert!(recorded.iter().any(|effect| matches!(
        effect,
        RecordedEffect::PriorityActioned { user_id, item_id, .. }
            if *user_id == connector && *item_id == winner.id().into_inner()
    )));

    // The rival open opportunity for the same prospect expires.
    let rival_row = harness
        .repository
        .find_by_id(rival.id())
        .await
        .expect("lookup should succeed")
        .expect("rival should exist");
    assert_eq!(rival_row.status(), OpportunityStatus::Expired);
    assert!(recorded.iter().any(|effect| matches!(
        effect,
        RecordedEffect::PriorityExpired { user_id, item_id, .. }
            if *user_id == rival_connector && *item_id == rival.id().into_inner()
    )));

    // Both parties get a close-loop notification.
    let notifications = recorded
        .iter()
        .filter(|effect| matches!(effect, RecordedEffect::Notified { .. }))
        .count();
    assert_eq!(notifications, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replayed_completion_is_a_no_op(harness: TestHarness) {
    let connector = UserId::new();
    let opportunity = harness
        .service
        .open(open_request(connector, "Priya Raman", 50))
        .await
        .expect("open should succeed");
    harness
        .service
        .accept(opportunity.id())
        .await
        .expect("accept should succeed");
    harness
        .service
        .complete(opportunity.id())
        .await
        .expect("first completion should succeed");

    let effects_after_first = harness.effects.recorded().len();
    let replayed = harness
        .service
        .complete(opportunity.id())
        .await
        .expect("replayed completion should resolve to a no-op");
    assert_eq!(replayed.status(), OpportunityStatus::Completed);
    assert_eq!(harness.effects.recorded().len(), effects_after_first);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn late_completion_after_decline_is_a_no_op(harness: TestHarness) {
    let opportunity = harness
        .service
        .open(open_request(UserId::new(), "Priya Raman", 50))
        .await
        .expect("open should succeed");
    harness
        .service
        .decline(opportunity.id())
        .await
        .expect("decline should succeed");

    let outcome = harness
        .service
        .complete(opportunity.id())
        .await
        .expect("late completion must not error");
    assert_eq!(outcome.status(), OpportunityStatus::Declined);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_an_unaccepted_opportunity_is_rejected(harness: TestHarness) {
    let opportunity = harness
        .service
        .open(open_request(UserId::new(), "Priya Raman", 50))
        .await
        .expect("open should succeed");

    let result = harness.service.complete(opportunity.id()).await;
    assert!(result.is_err());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn force_close_expires_a_live_instance(harness: TestHarness) {
    let opportunity = harness
        .service
        .open(open_request(UserId::new(), "Priya Raman", 50))
        .await
        .expect("open should succeed");

    let closed = harness
        .service
        .force_close(opportunity.id())
        .await
        .expect("force close should succeed");
    assert_eq!(closed.status(), OpportunityStatus::Expired);

    let replay = harness
        .service
        .force_close(opportunity.id())
        .await
        .expect("repeat force close should be a no-op");
    assert_eq!(replay.status(), OpportunityStatus::Expired);
}
