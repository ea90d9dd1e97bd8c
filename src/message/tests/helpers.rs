//! Shared fixtures for message orchestrator tests.

use std::sync::Arc;

use crate::config::MessagingConfig;
use crate::identity::{AgentKind, UserId};
use crate::message::adapters::memory::{InMemoryMessageRepository, RecordingGateway};
use crate::message::adapters::template::MiniJinjaRenderer;
use crate::message::domain::{MessageContent, MessagePriority};
use crate::message::services::{EnqueueMessageRequest, MessageOrchestratorService};
use mockable::DefaultClock;

pub type TestOrchestrator = MessageOrchestratorService<
    InMemoryMessageRepository,
    RecordingGateway,
    MiniJinjaRenderer,
    DefaultClock,
>;

pub struct TestHarness {
    pub orchestrator: TestOrchestrator,
    pub repository: Arc<InMemoryMessageRepository>,
    pub gateway: Arc<RecordingGateway>,
}

/// Messaging config with quiet hours disabled so tests are independent
/// of the wall-clock hour they run at.
pub fn open_config() -> MessagingConfig {
    MessagingConfig {
        quiet_hours: None,
        ..MessagingConfig::default()
    }
}

pub fn harness(config: MessagingConfig) -> TestHarness {
    let repository = Arc::new(InMemoryMessageRepository::new());
    let gateway = Arc::new(RecordingGateway::new());
    let orchestrator = MessageOrchestratorService::new(
        Arc::clone(&repository),
        Arc::clone(&gateway),
        Arc::new(MiniJinjaRenderer::new()),
        Arc::new(DefaultClock),
        config,
    );
    TestHarness {
        orchestrator,
        repository,
        gateway,
    }
}

pub fn text_request(user_id: UserId, text: &str) -> EnqueueMessageRequest {
    EnqueueMessageRequest {
        user_id,
        source_agent: AgentKind::new("concierge").expect("valid agent kind"),
        content: MessageContent::text(text),
        priority: MessagePriority::Medium,
        scheduled_for: None,
        context: None,
        requires_fresh_context: false,
    }
}
