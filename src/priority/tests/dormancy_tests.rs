//! Presentation and dormancy threshold behaviour.

use std::sync::Arc;

use crate::identity::UserId;
use crate::priority::{
    adapters::memory::InMemoryPriorityRepository,
    domain::{ItemSummary, PriorityDomainError, PriorityItemType, PriorityStatus, ScoreInputs},
    services::{PriorityLedgerService, PriorityServiceError, UpsertPriorityRequest},
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

async fn seeded_item(service: &TestService) -> crate::priority::domain::PriorityItemId {
    let request = UpsertPriorityRequest {
        user_id: UserId::new(),
        item_type: PriorityItemType::Opportunity,
        item_id: Uuid::new_v4(),
        score: ScoreInputs {
            base: 50,
            ..ScoreInputs::default()
        },
        summary: ItemSummary::default(),
    };
    service
        .upsert_priority(request)
        .await
        .expect("seed upsert should succeed")
        .item()
        .id()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_unactioned_presentation_goes_dormant(service: TestService) {
    let id = seeded_item(&service).await;

    let first = service
        .mark_presented(id)
        .await
        .expect("first presentation should succeed");
    assert_eq!(first.status(), PriorityStatus::Presented);
    assert_eq!(first.presentation_count(), 1);

    let second = service
        .mark_presented(id)
        .await
        .expect("second presentation should succeed");
    assert_eq!(second.status(), PriorityStatus::Dormant);
    assert_eq!(second.presentation_count(), 2);
    assert!(second.dormant_at().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn third_presentation_is_suppressed(service: TestService) {
    let id = seeded_item(&service).await;
    service.mark_presented(id).await.expect("first presentation");
    service.mark_presented(id).await.expect("second presentation");

    let third = service.mark_presented(id).await;
    assert!(matches!(
        third,
        Err(PriorityServiceError::Domain(
            PriorityDomainError::DormancySuppressed(_)
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn new_signal_reactivates_a_dormant_item(service: TestService) {
    let id = seeded_item(&service).await;
    service.mark_presented(id).await.expect("first presentation");
    service.mark_presented(id).await.expect("second presentation");

    let reactivated = service
        .reactivate(id)
        .await
        .expect("reactivation should succeed");
    assert_eq!(reactivated.status(), PriorityStatus::Active);
    assert_eq!(reactivated.presentation_count(), 0);
    assert!(reactivated.dormant_at().is_none());

    let presented = service
        .mark_presented(id)
        .await
        .expect("presentation after reactivation should succeed");
    assert_eq!(presented.status(), PriorityStatus::Presented);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn presenting_a_terminal_item_is_rejected(service: TestService) {
    let id = seeded_item(&service).await;
    service.mark_expired(id).await.expect("expiry should succeed");

    let result = service.mark_presented(id).await;
    assert!(matches!(
        result,
        Err(PriorityServiceError::Domain(
            PriorityDomainError::AlreadyResolved { .. }
        ))
    ));
}
