//! Upsert and ranking behaviour for the priority ledger service.

use std::sync::Arc;

use crate::identity::UserId;
use crate::priority::{
    adapters::memory::InMemoryPriorityRepository,
    domain::{ItemSummary, PriorityItemType, ScoreInputs},
    services::{PriorityLedgerService, UpsertOutcome, UpsertPriorityRequest},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use uuid::Uuid;

type TestService = PriorityLedgerService<InMemoryPriorityRepository, DefaultClock>;

#[fixture]
fn service() -> TestService {
    PriorityLedgerService::new(
        Arc::new(InMemoryPriorityRepository::new()),
        Arc::new(DefaultClock),
    )
}

fn opportunity_request(user_id: UserId, item_id: Uuid, base: i64) -> UpsertPriorityRequest {
    UpsertPriorityRequest {
        user_id,
        item_type: PriorityItemType::Opportunity,
        item_id,
        score: ScoreInputs {
            base,
            ..ScoreInputs::default()
        },
        summary: ItemSummary {
            headline: "Introduce Dana to a fintech founder".to_owned(),
            counterpart_name: Some("Dana".to_owned()),
            bounty: Some(base),
        },
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upsert_inserts_then_refreshes_in_place(service: TestService) {
    let user = UserId::new();
    let item = Uuid::new_v4();

    let first = service
        .upsert_priority(opportunity_request(user, item, 40))
        .await
        .expect("first upsert should succeed");
    assert!(matches!(first, UpsertOutcome::Inserted(_)));

    let second = service
        .upsert_priority(opportunity_request(user, item, 60))
        .await
        .expect("second upsert should succeed");
    let UpsertOutcome::Refreshed(refreshed) = second else {
        panic!("expected refresh, got {second:?}");
    };
    assert_eq!(refreshed.id(), first.item().id());
    assert_eq!(refreshed.value_score().value(), 60);

    let queue = service
        .ranked_queue(user)
        .await
        .expect("queue lookup should succeed");
    assert_eq!(queue.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upsert_of_resolved_key_is_a_no_op(service: TestService) {
    let user = UserId::new();
    let item = Uuid::new_v4();

    let inserted = service
        .upsert_priority(opportunity_request(user, item, 40))
        .await
        .expect("insert should succeed");
    service
        .mark_actioned(inserted.item().id())
        .await
        .expect("action should succeed");

    let outcome = service
        .upsert_priority(opportunity_request(user, item, 90))
        .await
        .expect("re-derivation should succeed");
    let UpsertOutcome::AlreadyResolved(resolved) = outcome else {
        panic!("expected resolved no-op, got {outcome:?}");
    };
    assert_eq!(resolved.value_score().value(), 40);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ranked_queue_orders_by_score(service: TestService) {
    let user = UserId::new();

    service
        .upsert_priority(opportunity_request(user, Uuid::new_v4(), 30))
        .await
        .expect("upsert should succeed");
    service
        .upsert_priority(opportunity_request(user, Uuid::new_v4(), 80))
        .await
        .expect("upsert should succeed");
    service
        .upsert_priority(opportunity_request(user, Uuid::new_v4(), 55))
        .await
        .expect("upsert should succeed");

    let queue = service
        .ranked_queue(user)
        .await
        .expect("queue lookup should succeed");
    let scores: Vec<i16> = queue.iter().map(|item| item.value_score().value()).collect();
    assert_eq!(scores, vec![80, 55, 30]);
    let ranks: Vec<u32> = queue.iter().map(|item| item.rank()).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mark_actioned_is_idempotent(service: TestService) {
    let user = UserId::new();
    let inserted = service
        .upsert_priority(opportunity_request(user, Uuid::new_v4(), 40))
        .await
        .expect("insert should succeed");
    let id = inserted.item().id();

    let first = service.mark_actioned(id).await.expect("first action");
    let second = service.mark_actioned(id).await.expect("second action");
    assert_eq!(first.status(), second.status());
}
