//! Sequence ordering, unit budgeting, and atomic cancellation.

use super::helpers::{harness, open_config, text_request};
use crate::config::MessagingConfig;
use crate::identity::{AgentKind, UserId};
use crate::message::domain::{MessageContent, MessagePriority, MessageStatus};
use crate::message::ports::MessageRepository;
use crate::message::services::EnqueueSequenceRequest;

fn sequence_request(user_id: UserId, parts: &[&str]) -> EnqueueSequenceRequest {
    EnqueueSequenceRequest {
        user_id,
        source_agent: AgentKind::new("concierge").expect("valid agent kind"),
        parts: parts.iter().map(|part| MessageContent::text(*part)).collect(),
        priority: MessagePriority::Medium,
        scheduled_for: None,
        context: None,
        requires_fresh_context: false,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sequence_delivers_in_position_order() {
    let fixture = harness(open_config());
    let user = UserId::new();
    fixture
        .orchestrator
        .enqueue_sequence(sequence_request(user, &["part one", "part two", "part three"]))
        .await
        .expect("sequence enqueue should succeed");

    for _ in 0..3 {
        fixture
            .orchestrator
            .dispatch_batch(10)
            .await
            .expect("dispatch should succeed");
    }

    let texts: Vec<String> = fixture
        .gateway
        .deliveries()
        .into_iter()
        .map(|(_, text)| text)
        .collect();
    assert_eq!(texts, vec!["part one", "part two", "part three"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn sequence_counts_once_against_the_budget() {
    let config = MessagingConfig {
        hourly_limit: 1,
        ..open_config()
    };
    let fixture = harness(config);
    let user = UserId::new();
    fixture
        .orchestrator
        .enqueue_sequence(sequence_request(user, &["a", "b", "c"]))
        .await
        .expect("sequence enqueue should succeed");
    fixture
        .orchestrator
        .enqueue_message(text_request(user, "a separate single"))
        .await
        .expect("single enqueue should succeed");

    for _ in 0..4 {
        fixture
            .orchestrator
            .dispatch_batch(10)
            .await
            .expect("dispatch should succeed");
    }

    // All three sequence members leave under one budget unit; the
    // separate single is what the budget now blocks.
    let delivered = fixture.gateway.deliveries().len();
    assert_eq!(delivered, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_an_unsent_member_cancels_the_whole_sequence() {
    let fixture = harness(open_config());
    let user = UserId::new();
    let members = fixture
        .orchestrator
        .enqueue_sequence(sequence_request(user, &["one", "two", "three"]))
        .await
        .expect("sequence enqueue should succeed");

    let second = members.get(1).expect("three members");
    fixture
        .orchestrator
        .cancel_message(second.id(), "composition withdrawn")
        .await
        .expect("cancel should succeed");

    for member in &members {
        let row = fixture
            .repository
            .find_by_id(member.id())
            .await
            .expect("lookup should succeed")
            .expect("member should exist");
        assert_eq!(row.status(), MessageStatus::Cancelled);
    }

    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    assert!(report.sent.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn sent_members_stay_sent_when_the_rest_is_cancelled() {
    let fixture = harness(open_config());
    let user = UserId::new();
    let members = fixture
        .orchestrator
        .enqueue_sequence(sequence_request(user, &["one", "two", "three"]))
        .await
        .expect("sequence enqueue should succeed");

    // A single-row batch sends part one only.
    let first_batch = fixture
        .orchestrator
        .dispatch_batch(1)
        .await
        .expect("dispatch should succeed");
    let first = members.first().expect("three members");
    assert!(first_batch.sent.contains(&first.id()));

    let second = members.get(1).expect("three members");
    fixture
        .orchestrator
        .cancel_message(second.id(), "stale after part one")
        .await
        .expect("cancel should succeed");

    let sent_row = fixture
        .repository
        .find_by_id(first.id())
        .await
        .expect("lookup should succeed")
        .expect("member should exist");
    assert_eq!(sent_row.status(), MessageStatus::Sent);

    let third_row = fixture
        .repository
        .find_by_id(members.get(2).expect("three members").id())
        .await
        .expect("lookup should succeed")
        .expect("member should exist");
    assert_eq!(third_row.status(), MessageStatus::Cancelled);

    // The incomplete sequence is never retried as new.
    let report = fixture
        .orchestrator
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    assert!(report.sent.is_empty());
    assert_eq!(fixture.gateway.deliveries().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn single_part_sequences_are_rejected() {
    let fixture = harness(open_config());
    let result = fixture
        .orchestrator
        .enqueue_sequence(sequence_request(UserId::new(), &["only"]))
        .await;
    assert!(result.is_err());
}
