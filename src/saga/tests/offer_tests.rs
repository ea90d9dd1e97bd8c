//! Two-step handshake, reminder, and grace-period behaviour.

use std::sync::Arc;

use crate::config::SagaConfig;
use crate::identity::UserId;
use crate::saga::adapters::memory::{InMemoryOfferRepository, RecordedEffect, RecordingEffects};
use crate::saga::domain::OfferStatus;
use crate::saga::services::{CreateOfferRequest, OfferService};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = OfferService<InMemoryOfferRepository, RecordingEffects, DefaultClock>;

struct TestHarness {
    service: TestService,
    effects: Arc<RecordingEffects>,
}

fn harness_with(config: SagaConfig) -> TestHarness {
    let effects = Arc::new(RecordingEffects::new());
    let service = OfferService::new(
        Arc::new(InMemoryOfferRepository::new()),
        Arc::clone(&effects),
        Arc::new(DefaultClock),
        config,
    );
    TestHarness { service, effects }
}

#[fixture]
fn harness() -> TestHarness {
    harness_with(SagaConfig::default())
}

fn create_request(introducee: UserId) -> CreateOfferRequest {
    CreateOfferRequest {
        introducee_id: introducee,
        connector_id: UserId::new(),
        subject: "Priya Raman".to_owned(),
        bounty: None,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn handshake_completes_through_both_steps(harness: TestHarness) {
    let offer = harness
        .service
        .create(create_request(UserId::new()))
        .await
        .expect("create should succeed");
    assert_eq!(offer.status(), OfferStatus::PendingIntroduceeResponse);

    let accepted = harness
        .service
        .introducee_accept(offer.id())
        .await
        .expect("acceptance should succeed");
    assert_eq!(accepted.status(), OfferStatus::PendingConnectorConfirmation);
    assert!(accepted.accepted_at().is_some());

    let confirmed = harness
        .service
        .connector_confirm(offer.id())
        .await
        .expect("confirmation should succeed");
    assert_eq!(confirmed.status(), OfferStatus::Completed);

    let awards = harness
        .effects
        .recorded()
        .into_iter()
        .filter(|effect| matches!(effect, RecordedEffect::BountyAwarded { .. }))
        .count();
    assert_eq!(awards, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn decline_never_reaches_confirmation(harness: TestHarness) {
    let offer = harness
        .service
        .create(create_request(UserId::new()))
        .await
        .expect("create should succeed");

    let declined = harness
        .service
        .introducee_decline(offer.id())
        .await
        .expect("decline should succeed");
    assert_eq!(declined.status(), OfferStatus::Declined);

    // A confirmation arriving after the decline resolves to a no-op on
    // the terminal instance.
    let late = harness
        .service
        .connector_confirm(offer.id())
        .await
        .expect("late confirmation must not error");
    assert_eq!(late.status(), OfferStatus::Declined);

    let awards = harness
        .effects
        .recorded()
        .into_iter()
        .filter(|effect| matches!(effect, RecordedEffect::BountyAwarded { .. }))
        .count();
    assert_eq!(awards, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unconfirmed_offer_expires_after_both_graces_with_one_reminder() {
    // Zero-length grace periods make the accepted offer immediately
    // overdue for the sweep.
    let config = SagaConfig {
        confirmation_grace_secs: 0,
        confirmation_final_grace_secs: 0,
        ..SagaConfig::default()
    };
    let fixture = harness_with(config);

    let offer = fixture
        .service
        .create(create_request(UserId::new()))
        .await
        .expect("create should succeed");
    fixture
        .service
        .introducee_accept(offer.id())
        .await
        .expect("acceptance should succeed");

    let reminders = fixture
        .effects
        .recorded()
        .into_iter()
        .filter(|effect| matches!(effect, RecordedEffect::ReminderScheduled { .. }))
        .count();
    assert_eq!(reminders, 1);

    let expired = fixture
        .service
        .expire_overdue(Utc::now())
        .await
        .expect("sweep should succeed");
    assert_eq!(expired, 1);

    let replayed_sweep = fixture
        .service
        .expire_overdue(Utc::now())
        .await
        .expect("repeat sweep should succeed");
    assert_eq!(replayed_sweep, 0);

    let total_reminders = fixture
        .effects
        .recorded()
        .into_iter()
        .filter(|effect| matches!(effect, RecordedEffect::ReminderScheduled { .. }))
        .count();
    assert_eq!(total_reminders, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reminder_is_skipped_once_the_offer_has_moved_on(harness: TestHarness) {
    let offer = harness
        .service
        .create(create_request(UserId::new()))
        .await
        .expect("create should succeed");
    harness
        .service
        .introducee_accept(offer.id())
        .await
        .expect("acceptance should succeed");
    harness
        .service
        .connector_confirm(offer.id())
        .await
        .expect("confirmation should succeed");

    let sent = harness
        .service
        .send_reminder(offer.id())
        .await
        .expect("reminder execution should succeed");
    assert!(!sent);
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_rate_overrides_the_default_bounty() {
    let provider = UserId::new();
    let mut config = SagaConfig::default();
    config.provider_rates.insert(provider, 120);
    let fixture = harness_with(config);

    let offer = fixture
        .service
        .create(create_request(provider))
        .await
        .expect("create should succeed");
    assert_eq!(offer.bounty().amount(), 120);

    let ordinary = fixture
        .service
        .create(create_request(UserId::new()))
        .await
        .expect("create should succeed");
    assert_eq!(
        ordinary.bounty().amount(),
        SagaConfig::default().default_bounty
    );
}
