//! At-most-one-lease behaviour under concurrent dispatchers.

use std::sync::Arc;

use super::helpers::{harness, sweep_request};
use crate::config::TaskQueueConfig;
use crate::task_queue::domain::{DispatchPriority, TaskStatus};
use crate::task_queue::ports::TaskRepository;
use chrono::Utc;

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claims_have_exactly_one_winner() {
    let fixture = harness(TaskQueueConfig::default());
    let task = fixture
        .queue
        .enqueue(sweep_request(DispatchPriority::Medium))
        .await
        .expect("enqueue should succeed");

    let now = Utc::now();
    let mut claims = Vec::new();
    for _ in 0..8 {
        let repository = Arc::clone(&fixture.repository);
        let id = task.id();
        claims.push(tokio::spawn(async move { repository.claim(id, now).await }));
    }

    let mut winners = 0;
    for claim in claims {
        let won = claim
            .await
            .expect("claim future should not panic")
            .expect("claim should not error");
        if won {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    let leased = fixture
        .repository
        .find_by_id(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(leased.status(), TaskStatus::Processing);
}

#[tokio::test(flavor = "multi_thread")]
async fn competing_dispatchers_split_the_due_set() {
    let fixture = harness(TaskQueueConfig::default());
    for _ in 0..6 {
        fixture
            .queue
            .enqueue(sweep_request(DispatchPriority::Medium))
            .await
            .expect("enqueue should succeed");
    }

    let (a, b) = tokio::join!(
        fixture.queue.dispatch_batch(6),
        fixture.queue.dispatch_batch(6)
    );
    let a = a.expect("first dispatcher should succeed");
    let b = b.expect("second dispatcher should succeed");

    let total_claimed = a.claimed.len() + b.claimed.len();
    assert_eq!(total_claimed, 6);

    let mut all: Vec<_> = a.claimed.into_iter().chain(b.claimed).collect();
    all.sort_by_key(|id| id.into_inner());
    all.dedup();
    assert_eq!(all.len(), 6, "no task may be claimed twice");
}
