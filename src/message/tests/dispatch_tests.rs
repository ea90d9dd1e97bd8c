//! Budget, quiet-hour, supersession, and retry behaviour.

use super::helpers::{harness, open_config, text_request};
use crate::config::{MessagingConfig, QuietWindow};
use crate::event_log::domain::AggregateType;
use crate::identity::UserId;
use crate::message::domain::{MessageContext, MessageStatus};
use crate::message::ports::{DeliveryError, MessageRepository};
use chrono::{Timelike, Utc};
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread")]
async fn dispatch_sends_due_messages_and_renders_text() {
    let fixture = harness(open_config());
    let user = UserId::new();
    let message = fixture
        .orchestrator
        .enqueue_message(text_request(user, "Welcome aboard"))
        .await
        .expect("enqueue should succeed");

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert_eq!(report.sent, vec![message.id()]);
    assert_eq!(
        fixture.gateway.deliveries(),
        vec![(message.id(), "Welcome aboard".to_owned())]
    );
    let sent = fixture
        .repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(sent.status(), MessageStatus::Sent);
    assert_eq!(sent.final_text(), Some("Welcome aboard"));
    assert!(sent.sent_at().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn hourly_budget_defers_excess_messages() {
    let config = MessagingConfig {
        hourly_limit: 1,
        ..open_config()
    };
    let fixture = harness(config);
    let user = UserId::new();

    fixture
        .orchestrator
        .enqueue_message(text_request(user, "first"))
        .await
        .expect("enqueue should succeed");
    fixture
        .orchestrator
        .enqueue_message(text_request(user, "second"))
        .await
        .expect("enqueue should succeed");

    let first = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("first dispatch should succeed");
    assert_eq!(first.sent.len(), 1);

    let second = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("second dispatch should succeed");
    assert!(second.sent.is_empty());
    assert_eq!(second.deferred_budget, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn budgets_are_per_user() {
    let config = MessagingConfig {
        hourly_limit: 1,
        ..open_config()
    };
    let fixture = harness(config);

    fixture
        .orchestrator
        .enqueue_message(text_request(UserId::new(), "for alice"))
        .await
        .expect("enqueue should succeed");
    fixture
        .orchestrator
        .enqueue_message(text_request(UserId::new(), "for bala"))
        .await
        .expect("enqueue should succeed");

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.sent.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn quiet_hours_defer_instead_of_dropping() {
    let now_hour = u8::try_from(Utc::now().hour()).unwrap_or(0);
    let config = MessagingConfig {
        quiet_hours: Some(QuietWindow {
            start_hour: now_hour,
            end_hour: (now_hour + 1) % 24,
        }),
        ..open_config()
    };
    let fixture = harness(config);
    let user = UserId::new();
    let message = fixture
        .orchestrator
        .enqueue_message(text_request(user, "late night ping"))
        .await
        .expect("enqueue should succeed");

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert!(report.sent.is_empty());
    assert_eq!(report.deferred_quiet_hours, 1);
    let deferred = fixture
        .repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(deferred.status(), MessageStatus::Queued);
    assert!(deferred.scheduled_for() > Utc::now());
}

#[tokio::test(flavor = "multi_thread")]
async fn newer_context_message_supersedes_the_queued_one() {
    let fixture = harness(open_config());
    let user = UserId::new();
    let context = MessageContext {
        context_type: AggregateType::Opportunity,
        context_id: Uuid::new_v4(),
    };

    let mut stale_request = text_request(user, "opportunity is open");
    stale_request.context = Some(context);
    let stale = fixture
        .orchestrator
        .enqueue_message(stale_request)
        .await
        .expect("first enqueue should succeed");

    let mut fresh_request = text_request(user, "opportunity was accepted");
    fresh_request.context = Some(context);
    let fresh = fixture
        .orchestrator
        .enqueue_message(fresh_request)
        .await
        .expect("second enqueue should succeed");

    let replaced = fixture
        .repository
        .find_by_id(stale.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(replaced.status(), MessageStatus::Superseded);
    assert_eq!(replaced.superseded_by(), Some(fresh.id()));
    assert!(replaced.status_reason().is_some());

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    assert_eq!(report.sent, vec![fresh.id()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_delivery_failure_requeues_with_delay() {
    let fixture = harness(open_config());
    let user = UserId::new();
    let message = fixture
        .orchestrator
        .enqueue_message(text_request(user, "flaky channel"))
        .await
        .expect("enqueue should succeed");
    fixture
        .gateway
        .stage_failure(DeliveryError::Transient("socket reset".to_owned()));

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert!(report.sent.is_empty());
    assert_eq!(report.retried, 1);
    let requeued = fixture
        .repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(requeued.status(), MessageStatus::Queued);
    assert!(requeued.scheduled_for() > Utc::now());
}

#[tokio::test(flavor = "multi_thread")]
async fn permanent_delivery_failure_withdraws_the_message() {
    let fixture = harness(open_config());
    let user = UserId::new();
    let message = fixture
        .orchestrator
        .enqueue_message(text_request(user, "unroutable"))
        .await
        .expect("enqueue should succeed");
    fixture
        .gateway
        .stage_failure(DeliveryError::Permanent("recipient opted out".to_owned()));

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert_eq!(report.withdrawn, 1);
    let withdrawn = fixture
        .repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(withdrawn.status(), MessageStatus::Cancelled);
}
