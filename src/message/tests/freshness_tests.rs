//! Send-time rendering and staleness withdrawal.

use std::sync::Arc;

use crate::config::MessagingConfig;
use crate::identity::{AgentKind, UserId};
use crate::message::adapters::memory::{InMemoryMessageRepository, RecordingGateway};
use crate::message::domain::{MessageContent, MessagePriority, MessageStatus, QueuedMessage};
use crate::message::ports::{ContentRenderer, MessageRepository, RenderError, RenderOutcome};
use crate::message::services::{EnqueueMessageRequest, MessageOrchestratorService};
use async_trait::async_trait;
use mockable::DefaultClock;
use mockall::mock;
use serde_json::json;

mock! {
    pub Renderer {}

    #[async_trait]
    impl ContentRenderer for Renderer {
        async fn render(&self, message: &QueuedMessage) -> Result<RenderOutcome, RenderError>;
    }
}

fn open_config() -> MessagingConfig {
    MessagingConfig {
        quiet_hours: None,
        ..MessagingConfig::default()
    }
}

fn fresh_request(user_id: UserId) -> EnqueueMessageRequest {
    EnqueueMessageRequest {
        user_id,
        source_agent: AgentKind::new("concierge").expect("valid agent kind"),
        content: MessageContent::template(
            "{{ name }}, your introduction to {{ counterpart }} is waiting.",
            json!({"name": "Alba", "counterpart": "Dana"}),
        ),
        priority: MessagePriority::High,
        scheduled_for: None,
        context: None,
        requires_fresh_context: true,
    }
}

fn orchestrator(
    renderer: MockRenderer,
) -> (
    MessageOrchestratorService<InMemoryMessageRepository, RecordingGateway, MockRenderer, DefaultClock>,
    Arc<InMemoryMessageRepository>,
    Arc<RecordingGateway>,
) {
    let repository = Arc::new(InMemoryMessageRepository::new());
    let gateway = Arc::new(RecordingGateway::new());
    let service = MessageOrchestratorService::new(
        Arc::clone(&repository),
        Arc::clone(&gateway),
        Arc::new(renderer),
        Arc::new(DefaultClock),
        open_config(),
    );
    (service, repository, gateway)
}

#[tokio::test(flavor = "multi_thread")]
async fn fresh_context_rows_render_at_send_time() {
    let mut renderer = MockRenderer::new();
    renderer
        .expect_render()
        .times(1)
        .returning(|_| Ok(RenderOutcome::Rendered("Alba, meet Dana.".to_owned())));
    let (service, repository, gateway) = orchestrator(renderer);

    let message = service
        .enqueue_message(fresh_request(UserId::new()))
        .await
        .expect("enqueue should succeed");
    service
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert_eq!(
        gateway.deliveries(),
        vec![(message.id(), "Alba, meet Dana.".to_owned())]
    );
    let sent = repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(sent.final_text(), Some("Alba, meet Dana."));
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_context_withdraws_instead_of_sending() {
    let mut renderer = MockRenderer::new();
    renderer.expect_render().times(1).returning(|_| {
        Ok(RenderOutcome::Stale {
            reason: "opportunity already resolved through another path".to_owned(),
        })
    });
    let (service, repository, gateway) = orchestrator(renderer);

    let message = service
        .enqueue_message(fresh_request(UserId::new()))
        .await
        .expect("enqueue should succeed");
    let report = service
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert_eq!(report.withdrawn, 1);
    assert!(gateway.deliveries().is_empty());
    let withdrawn = repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(withdrawn.status(), MessageStatus::Cancelled);
    assert!(withdrawn.status_reason().is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn render_failures_requeue_the_message() {
    let mut renderer = MockRenderer::new();
    renderer
        .expect_render()
        .times(1)
        .returning(|_| Err(RenderError("template engine unavailable".to_owned())));
    let (service, repository, gateway) = orchestrator(renderer);

    let message = service
        .enqueue_message(fresh_request(UserId::new()))
        .await
        .expect("enqueue should succeed");
    let report = service
        .dispatch_batch(10)
        .await
        .expect("dispatch should succeed");

    assert_eq!(report.retried, 1);
    assert!(gateway.deliveries().is_empty());
    let requeued = repository
        .find_by_id(message.id())
        .await
        .expect("lookup should succeed")
        .expect("message should exist");
    assert_eq!(requeued.status(), MessageStatus::Queued);
}
