//! Dispatch ordering, ready events, and operator queries.

use super::helpers::{harness, sweep_request};
use crate::config::TaskQueueConfig;
use crate::event_log::domain::EventPayload;
use crate::event_log::ports::EventRepository;
use crate::task_queue::domain::{DispatchPriority, TaskStatus};
use crate::task_queue::services::EnqueueTaskRequest;
use crate::task_queue::domain::TaskPayload;
use crate::identity::{AgentKind, UserId};
use chrono::{Duration, Utc};

#[tokio::test(flavor = "multi_thread")]
async fn dispatch_claims_in_priority_order() {
    let fixture = harness(TaskQueueConfig::default());

    let low = fixture
        .queue
        .enqueue(sweep_request(DispatchPriority::Low))
        .await
        .expect("enqueue should succeed");
    let urgent = fixture
        .queue
        .enqueue(sweep_request(DispatchPriority::Urgent))
        .await
        .expect("enqueue should succeed");
    let medium = fixture
        .queue
        .enqueue(sweep_request(DispatchPriority::Medium))
        .await
        .expect("enqueue should succeed");

    let report = fixture
        .queue
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert_eq!(report.claimed, vec![urgent.id(), medium.id(), low.id()]);
    assert_eq!(report.lost_leases, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn future_tasks_are_not_dispatched() {
    let fixture = harness(TaskQueueConfig::default());
    let mut request = sweep_request(DispatchPriority::High);
    request.scheduled_for = Some(Utc::now() + Duration::hours(2));
    fixture
        .queue
        .enqueue(request)
        .await
        .expect("enqueue should succeed");

    let report = fixture
        .queue
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    assert!(report.claimed.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn claimed_tasks_are_announced_as_ready_events() {
    let fixture = harness(TaskQueueConfig::default());
    let task = fixture
        .queue
        .enqueue(sweep_request(DispatchPriority::Medium))
        .await
        .expect("enqueue should succeed");

    fixture
        .queue
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    let history = fixture
        .events
        .list_for_aggregate(task.id().into_inner())
        .await
        .expect("event lookup should succeed");
    assert!(history.iter().any(|event| matches!(
        event.payload(),
        EventPayload::TaskReady { task_id, .. } if *task_id == task.id().into_inner()
    )));
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_depths_group_by_agent_and_priority() {
    let fixture = harness(TaskQueueConfig::default());

    for _ in 0..2 {
        fixture
            .queue
            .enqueue(sweep_request(DispatchPriority::Medium))
            .await
            .expect("enqueue should succeed");
    }
    fixture
        .queue
        .enqueue(EnqueueTaskRequest {
            payload: TaskPayload::ResearchRequest {
                user_id: UserId::new(),
                topic: "solar supply chains".to_owned(),
            },
            agent_type: AgentKind::new("research").expect("valid agent kind"),
            user_id: None,
            context: None,
            priority: DispatchPriority::High,
            scheduled_for: None,
            max_retries: None,
        })
        .await
        .expect("enqueue should succeed");

    let depths = fixture
        .queue
        .pending_depths()
        .await
        .expect("depth query should succeed");

    assert_eq!(depths.len(), 2);
    let concierge = depths
        .iter()
        .find(|depth| depth.agent_type.as_str() == "concierge")
        .expect("concierge depth");
    assert_eq!(concierge.count, 2);
    let research = depths
        .iter()
        .find(|depth| depth.agent_type.as_str() == "research")
        .expect("research depth");
    assert_eq!(research.priority, DispatchPriority::High);
}

#[tokio::test(flavor = "multi_thread")]
async fn drain_cancels_all_pending_tasks() {
    let fixture = harness(TaskQueueConfig::default());
    for _ in 0..3 {
        fixture
            .queue
            .enqueue(sweep_request(DispatchPriority::Low))
            .await
            .expect("enqueue should succeed");
    }

    let drained = fixture
        .queue
        .drain_pending()
        .await
        .expect("drain should succeed");
    assert_eq!(drained, 3);

    let report = fixture
        .queue
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    assert!(report.claimed.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn completing_a_cancelled_task_is_a_no_op() {
    let fixture = harness(TaskQueueConfig::default());
    let task = fixture
        .queue
        .enqueue(sweep_request(DispatchPriority::Medium))
        .await
        .expect("enqueue should succeed");
    fixture
        .queue
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");
    fixture
        .queue
        .cancel(task.id())
        .await
        .expect("cancel should succeed");

    let outcome = fixture
        .queue
        .complete(task.id(), None)
        .await
        .expect("late completion should resolve to a no-op");
    assert_eq!(outcome.status(), TaskStatus::Cancelled);
}
