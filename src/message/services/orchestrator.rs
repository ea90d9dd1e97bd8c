//! Rate-limited dispatch, sequencing, and supersession orchestration.

use crate::config::{MessagingConfig, QuietWindow};
use crate::identity::{AgentKind, UserId};
use crate::message::{
    domain::{
        MessageContent, MessageContext, MessageDomainError, MessageId, MessagePriority,
        NewQueuedMessage, QueuedMessage, SequenceId, SequenceSlot,
    },
    ports::{
        ContentRenderer, DeliveryError, DeliveryGateway, MessageQueueDepth, MessageRepository,
        MessageRepositoryError, RenderOutcome,
    },
};
use chrono::{DateTime, Duration, Timelike, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Reason recorded on sequence members withdrawn as a group.
const SEQUENCE_INCOMPLETE: &str = "sequence member withdrawn; partial delivery not permitted";

/// Request payload for enqueueing a single message.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueMessageRequest {
    /// Recipient.
    pub user_id: UserId,
    /// Agent that composed the message.
    pub source_agent: AgentKind,
    /// Content to deliver.
    pub content: MessageContent,
    /// Dispatch priority band.
    pub priority: MessagePriority,
    /// Earliest dispatch time; `None` means immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Entity the message is about; used to supersede older queued
    /// messages for the same entity.
    pub context: Option<MessageContext>,
    /// Whether content must be re-rendered immediately before send.
    pub requires_fresh_context: bool,
}

/// Request payload for enqueueing a multi-part sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueSequenceRequest {
    /// Recipient.
    pub user_id: UserId,
    /// Agent that composed the sequence.
    pub source_agent: AgentKind,
    /// Ordered content parts; at least two.
    pub parts: Vec<MessageContent>,
    /// Dispatch priority band shared by all members.
    pub priority: MessagePriority,
    /// Earliest dispatch time; `None` means immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Entity the sequence is about.
    pub context: Option<MessageContext>,
    /// Whether content must be re-rendered immediately before send.
    pub requires_fresh_context: bool,
}

/// Outcome of one dispatch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDispatchReport {
    /// Messages handed to the delivery gateway.
    pub sent: Vec<MessageId>,
    /// Rows pushed past a quiet-hour window.
    pub deferred_quiet_hours: u32,
    /// Rows left queued because the user's budget is spent.
    pub deferred_budget: u32,
    /// Sequence members left queued until their predecessors send.
    pub awaiting_turn: u32,
    /// Due rows another dispatcher claimed first.
    pub lost_leases: u32,
    /// Rows requeued after a transient delivery failure.
    pub retried: u32,
    /// Rows withdrawn (stale content or permanent rejection).
    pub withdrawn: u32,
}

/// Service-level errors for message orchestration.
#[derive(Debug, Error)]
pub enum MessageServiceError {
    /// Domain transition or validation failed.
    #[error(transparent)]
    Domain(#[from] MessageDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] MessageRepositoryError),
    /// The referenced message does not exist.
    #[error("message not found: {0}")]
    NotFound(MessageId),
}

/// Result type for message orchestration operations.
pub type MessageServiceResult<T> = Result<T, MessageServiceError>;

/// Outbound message orchestration service.
#[derive(Clone)]
pub struct MessageOrchestratorService<R, G, T, C>
where
    R: MessageRepository,
    G: DeliveryGateway,
    T: ContentRenderer,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    gateway: Arc<G>,
    renderer: Arc<T>,
    clock: Arc<C>,
    config: MessagingConfig,
}

impl<R, G, T, C> MessageOrchestratorService<R, G, T, C>
where
    R: MessageRepository,
    G: DeliveryGateway,
    T: ContentRenderer,
    C: Clock + Send + Sync,
{
    /// Creates a new message orchestrator service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        gateway: Arc<G>,
        renderer: Arc<T>,
        clock: Arc<C>,
        config: MessagingConfig,
    ) -> Self {
        Self {
            repository,
            gateway,
            renderer,
            clock,
            config,
        }
    }

    /// Enqueues a single message, superseding older queued messages for
    /// the same entity.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] when persistence
    /// fails.
    pub async fn enqueue_message(
        &self,
        request: EnqueueMessageRequest,
    ) -> MessageServiceResult<QueuedMessage> {
        let superseded = match request.context {
            Some(context) => {
                self.repository
                    .find_active_for_context(request.user_id, context)
                    .await?
            }
            None => Vec::new(),
        };

        let message = QueuedMessage::new(
            NewQueuedMessage {
                user_id: request.user_id,
                source_agent: request.source_agent,
                content: request.content,
                scheduled_for: request.scheduled_for.unwrap_or_else(|| self.clock.utc()),
                priority: request.priority,
                sequence: None,
                context: request.context,
                requires_fresh_context: request.requires_fresh_context,
            },
            &*self.clock,
        );
        self.repository.store(&message).await?;
        self.supersede_all(superseded, message.id()).await?;
        Ok(message)
    }

    /// Enqueues an ordered multi-part sequence as one send unit.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Domain`] for sequences shorter
    /// than two parts and [`MessageServiceError::Repository`] when
    /// persistence fails.
    pub async fn enqueue_sequence(
        &self,
        request: EnqueueSequenceRequest,
    ) -> MessageServiceResult<Vec<QueuedMessage>> {
        let total = u32::try_from(request.parts.len())
            .map_err(|_| MessageDomainError::SequenceTooShort(request.parts.len()))?;
        if request.parts.len() < 2 {
            return Err(MessageDomainError::SequenceTooShort(request.parts.len()).into());
        }

        let superseded = match request.context {
            Some(context) => {
                self.repository
                    .find_active_for_context(request.user_id, context)
                    .await?
            }
            None => Vec::new(),
        };

        let sequence_id = SequenceId::new();
        let scheduled_for = request.scheduled_for.unwrap_or_else(|| self.clock.utc());
        let mut members = Vec::with_capacity(request.parts.len());
        for (index, content) in request.parts.into_iter().enumerate() {
            let position = u32::try_from(index.saturating_add(1))
                .map_err(|_| MessageDomainError::SequenceTooShort(0))?;
            let slot = SequenceSlot::new(sequence_id, position, total)?;
            let member = QueuedMessage::new(
                NewQueuedMessage {
                    user_id: request.user_id,
                    source_agent: request.source_agent.clone(),
                    content,
                    scheduled_for,
                    priority: request.priority,
                    sequence: Some(slot),
                    context: request.context,
                    requires_fresh_context: request.requires_fresh_context,
                },
                &*self.clock,
            );
            self.repository.store(&member).await?;
            members.push(member);
        }

        if let Some(first) = members.first() {
            self.supersede_all(superseded, first.id()).await?;
        }
        Ok(members)
    }

    /// Approves a queued message for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::NotFound`] for unknown messages
    /// and [`MessageServiceError::Domain`] for non-queued ones.
    pub async fn approve(&self, id: MessageId) -> MessageServiceResult<QueuedMessage> {
        let mut message = self.load(id).await?;
        message.approve(&*self.clock)?;
        self.repository.update(&message).await?;
        Ok(message)
    }

    /// Withdraws a message; unsent members of its sequence go with it.
    ///
    /// Already-sent members stay sent, which marks the sequence
    /// incomplete rather than retrying it as new.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::NotFound`] for unknown messages
    /// and [`MessageServiceError::Domain`] for sent or superseded ones.
    pub async fn cancel_message(
        &self,
        id: MessageId,
        reason: impl Into<String> + Send,
    ) -> MessageServiceResult<QueuedMessage> {
        let mut message = self.load(id).await?;
        message.cancel(reason, &*self.clock)?;
        self.repository.update(&message).await?;

        if let Some(slot) = message.sequence() {
            self.cancel_sequence_rest(slot.sequence_id, message.id()).await?;
        }
        Ok(message)
    }

    /// Claims due messages under rate limits and hands them to the
    /// delivery gateway.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] when selection or
    /// persistence fails; per-message delivery failures are absorbed
    /// into the report.
    pub async fn dispatch_batch(&self, limit: u32) -> MessageServiceResult<MessageDispatchReport> {
        let now = self.clock.utc();
        let due = self.repository.list_due(now, limit).await?;
        let mut report = MessageDispatchReport::default();

        for message in due {
            self.dispatch_one(message, now, &mut report).await?;
        }

        if !report.sent.is_empty() || report.withdrawn > 0 {
            tracing::info!(
                sent = report.sent.len(),
                withdrawn = report.withdrawn,
                retried = report.retried,
                "message dispatch batch finished"
            );
        }
        Ok(report)
    }

    /// Returns active-queue depths grouped by priority.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] when the lookup
    /// fails.
    pub async fn queued_depths(&self) -> MessageServiceResult<Vec<MessageQueueDepth>> {
        Ok(self.repository.queued_depths().await?)
    }

    async fn dispatch_one(
        &self,
        message: QueuedMessage,
        now: DateTime<Utc>,
        report: &mut MessageDispatchReport,
    ) -> MessageServiceResult<()> {
        let profile = self.config.profile_for(message.user_id());

        // Quiet hours defer dispatch; they never drop it.
        if let Some(window) = profile.quiet_hours {
            let hour = local_hour(now, profile.utc_offset_minutes);
            if window.contains(hour) {
                let mut deferred = message;
                deferred.defer(
                    quiet_resume(now, profile.utc_offset_minutes, window),
                    &*self.clock,
                );
                self.repository.update(&deferred).await?;
                report.deferred_quiet_hours += 1;
                return Ok(());
            }
        }

        // Sequence members wait for every earlier position to be sent.
        if let Some(slot) = message.sequence() {
            if !self.is_sequence_turn(slot).await? {
                report.awaiting_turn += 1;
                return Ok(());
            }
        }

        // A sequence counts once against the budget, charged with its
        // first member.
        let charges_budget = message.sequence().is_none_or(|slot| slot.position == 1);
        if charges_budget {
            let hourly = self
                .repository
                .sent_unit_count_since(message.user_id(), now - Duration::hours(1))
                .await?;
            let daily = self
                .repository
                .sent_unit_count_since(message.user_id(), now - Duration::hours(24))
                .await?;
            if hourly >= u64::from(profile.hourly_limit) || daily >= u64::from(profile.daily_limit)
            {
                report.deferred_budget += 1;
                return Ok(());
            }
        }

        // Non-blocking lease; cancellation after this point is caught by
        // the conditional claim itself.
        if !self.repository.claim(message.id(), now).await? {
            report.lost_leases += 1;
            return Ok(());
        }
        let mut leased = self.load(message.id()).await?;

        // Freshness: re-render at send time, never trust enqueue-time
        // text for flagged rows.
        let cached = if leased.requires_fresh_context() {
            None
        } else {
            leased.final_text().map(str::to_owned)
        };
        let text = match cached {
            Some(existing) => existing,
            None => match self.renderer.render(&leased).await {
                Ok(RenderOutcome::Rendered(text)) => text,
                Ok(RenderOutcome::Stale { reason }) => {
                    self.withdraw(&mut leased, &reason).await?;
                    report.withdrawn += 1;
                    return Ok(());
                }
                Err(err) => {
                    leased.requeue(now + self.retry_delay(), &*self.clock)?;
                    self.repository.update(&leased).await?;
                    tracing::warn!(message = %leased.id(), error = %err, "render failed; requeued");
                    report.retried += 1;
                    return Ok(());
                }
            },
        };

        match self.gateway.deliver(&leased, &text).await {
            Ok(()) => {
                leased.mark_sent(text, &*self.clock)?;
                self.repository.update(&leased).await?;
                report.sent.push(leased.id());
            }
            Err(DeliveryError::Transient(reason)) => {
                leased.requeue(now + self.retry_delay(), &*self.clock)?;
                self.repository.update(&leased).await?;
                tracing::warn!(message = %leased.id(), error = %reason, "transient delivery failure; requeued");
                report.retried += 1;
            }
            Err(DeliveryError::Permanent(reason)) => {
                self.withdraw(&mut leased, &reason).await?;
                report.withdrawn += 1;
            }
        }
        Ok(())
    }

    async fn is_sequence_turn(&self, slot: SequenceSlot) -> MessageServiceResult<bool> {
        let members = self.repository.sequence_members(slot.sequence_id).await?;
        Ok(members.iter().all(|member| {
            member.sequence().is_none_or(|member_slot| {
                member_slot.position >= slot.position || member.sent_at().is_some()
            })
        }))
    }

    async fn withdraw(
        &self,
        message: &mut QueuedMessage,
        reason: &str,
    ) -> MessageServiceResult<()> {
        message.cancel(reason, &*self.clock)?;
        self.repository.update(message).await?;
        tracing::warn!(message = %message.id(), reason, "message withdrawn");

        if let Some(slot) = message.sequence() {
            self.cancel_sequence_rest(slot.sequence_id, message.id()).await?;
        }
        Ok(())
    }

    async fn cancel_sequence_rest(
        &self,
        sequence_id: SequenceId,
        withdrawn: MessageId,
    ) -> MessageServiceResult<()> {
        let members = self.repository.sequence_members(sequence_id).await?;
        for mut member in members {
            if member.id() == withdrawn || !member.status().is_sendable() {
                continue;
            }
            member.cancel(SEQUENCE_INCOMPLETE, &*self.clock)?;
            self.repository.update(&member).await?;
        }
        Ok(())
    }

    async fn supersede_all(
        &self,
        stale: Vec<QueuedMessage>,
        by: MessageId,
    ) -> MessageServiceResult<()> {
        for mut old in stale {
            if old.id() == by {
                continue;
            }
            old.supersede(by, "replaced by newer message for the same context", &*self.clock)?;
            self.repository.update(&old).await?;
            tracing::debug!(message = %old.id(), by = %by, "queued message superseded");
        }
        Ok(())
    }

    async fn load(&self, id: MessageId) -> MessageServiceResult<QueuedMessage> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(MessageServiceError::NotFound(id))
    }

    fn retry_delay(&self) -> Duration {
        Duration::seconds(i64::try_from(self.config.retry_delay_secs).unwrap_or(i64::MAX))
    }
}

/// Returns the hour of day in the user's local frame.
fn local_hour(now: DateTime<Utc>, offset_minutes: i32) -> u8 {
    let local = now + Duration::minutes(i64::from(offset_minutes));
    u8::try_from(local.hour()).unwrap_or(0)
}

/// Returns the UTC instant at which the quiet window next ends.
fn quiet_resume(now: DateTime<Utc>, offset_minutes: i32, window: QuietWindow) -> DateTime<Utc> {
    let offset = Duration::minutes(i64::from(offset_minutes));
    let local = (now + offset).naive_utc();
    let resume_local = match local.date().and_hms_opt(u32::from(window.end_hour), 0, 0) {
        Some(candidate) if candidate > local => candidate,
        Some(candidate) => candidate + Duration::days(1),
        None => local + Duration::hours(1),
    };
    DateTime::<Utc>::from_naive_utc_and_offset(resume_local, Utc) - offset
}

#[cfg(test)]
mod tests {
    use super::{local_hour, quiet_resume};
    use crate::config::QuietWindow;
    use chrono::{TimeZone, Timelike, Utc};

    #[test]
    fn local_hour_applies_the_offset() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).single().expect("valid time");
        assert_eq!(local_hour(now, 0), 23);
        assert_eq!(local_hour(now, 120), 1);
        assert_eq!(local_hour(now, -60), 22);
    }

    #[test]
    fn quiet_resume_lands_on_the_window_end() {
        let window = QuietWindow {
            start_hour: 21,
            end_hour: 8,
        };
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 22, 0, 0).single().expect("valid time");
        let resume = quiet_resume(now, 0, window);
        assert_eq!(resume.hour(), 8);
        assert!(resume > now);

        let early = Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).single().expect("valid time");
        let resume_same_day = quiet_resume(early, 0, window);
        assert_eq!(
            resume_same_day,
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).single().expect("valid time")
        );
    }
}
