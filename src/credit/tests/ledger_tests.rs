//! Idempotency and balance tests for the credit ledger service.

use std::sync::Arc;

use crate::credit::{
    adapters::memory::InMemoryCreditLedger,
    domain::{CreditEventType, CreditReferenceType, IdempotencyKey},
    services::{AppendCreditRequest, CreditAppend, CreditLedgerService},
};
use crate::identity::UserId;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use uuid::Uuid;

type TestService = CreditLedgerService<InMemoryCreditLedger, DefaultClock>;

#[fixture]
fn service() -> TestService {
    CreditLedgerService::new(Arc::new(InMemoryCreditLedger::new()), Arc::new(DefaultClock))
}

fn bounty_request(user_id: UserId, reference_id: Uuid, amount: i64) -> AppendCreditRequest {
    AppendCreditRequest {
        user_id,
        event_type: CreditEventType::IntroductionBounty,
        amount,
        reference_type: CreditReferenceType::Opportunity,
        reference_id,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn append_writes_line_and_refreshes_balance(service: TestService) {
    let user = UserId::new();
    let outcome = service
        .append_credit(bounty_request(user, Uuid::new_v4(), 50))
        .await
        .expect("append should succeed");

    assert!(matches!(outcome, CreditAppend::Applied(_)));
    let balance = service
        .balance(user)
        .await
        .expect("balance lookup should succeed")
        .expect("balance should be cached after append");
    assert_eq!(balance.balance, 50);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_append_is_a_no_op(service: TestService) {
    let user = UserId::new();
    let reference = Uuid::new_v4();

    let first = service
        .append_credit(bounty_request(user, reference, 50))
        .await
        .expect("first append should succeed");
    let second = service
        .append_credit(bounty_request(user, reference, 50))
        .await
        .expect("duplicate append should be reported as success");

    assert!(matches!(first, CreditAppend::Applied(_)));
    assert!(matches!(second, CreditAppend::Duplicate(_)));
    assert_eq!(first.idempotency_key(), second.idempotency_key());

    let history = service
        .history(user)
        .await
        .expect("history lookup should succeed");
    assert_eq!(history.len(), 1);

    let balance = service
        .balance(user)
        .await
        .expect("balance lookup should succeed")
        .expect("balance should be cached");
    assert_eq!(balance.balance, 50);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn different_event_types_for_one_reference_are_distinct_lines(service: TestService) {
    let user = UserId::new();
    let reference = Uuid::new_v4();

    service
        .append_credit(bounty_request(user, reference, 50))
        .await
        .expect("bounty append should succeed");
    let adjustment = AppendCreditRequest {
        user_id: user,
        event_type: CreditEventType::ManualAdjustment,
        amount: -20,
        reference_type: CreditReferenceType::Operator,
        reference_id: reference,
    };
    service
        .append_credit(adjustment)
        .await
        .expect("adjustment append should succeed");

    let balance = service
        .balance(user)
        .await
        .expect("balance lookup should succeed")
        .expect("balance should be cached");
    assert_eq!(balance.balance, 30);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn zero_amount_is_rejected(service: TestService) {
    let result = service
        .append_credit(bounty_request(UserId::new(), Uuid::new_v4(), 0))
        .await;
    assert!(result.is_err());
}

#[test]
fn idempotency_key_is_deterministic() {
    let reference = Uuid::new_v4();
    let first = IdempotencyKey::derive("introduction_bounty", reference);
    let second = IdempotencyKey::derive("introduction_bounty", reference);
    let other = IdempotencyKey::derive("offer_bounty", reference);

    assert_eq!(first, second);
    assert_ne!(first, other);
    assert_eq!(first.as_str().len(), 64);
}
