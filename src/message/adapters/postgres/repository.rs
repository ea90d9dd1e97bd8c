//! `PostgreSQL` repository implementation for the message orchestrator.
//!
//! The dispatch lease is a single conditional `UPDATE ... WHERE status
//! IN ('queued','approved')`, so racing dispatchers get exactly one
//! winner per row.

use super::{
    models::{MessageRow, NewMessageRow, UnitCountRow},
    schema::queued_messages,
};
use crate::event_log::domain::AggregateType;
use crate::identity::{AgentKind, UserId};
use crate::message::{
    domain::{
        MessageContent, MessageContext, MessageId, MessagePriority, MessageStatus,
        PersistedMessageData, QueuedMessage, SequenceId, SequenceSlot,
    },
    ports::{
        MessageQueueDepth, MessageRepository, MessageRepositoryError, MessageRepositoryResult,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by message adapters.
pub type MessagePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed message repository.
#[derive(Debug, Clone)]
pub struct PostgresMessageRepository {
    pool: MessagePgPool,
}

impl PostgresMessageRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MessagePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MessageRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MessageRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(MessageRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(MessageRepositoryError::persistence)?
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn store(&self, message: &QueuedMessage) -> MessageRepositoryResult<()> {
        let id = message.id();
        let new_row = to_row(message)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(queued_messages::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        MessageRepositoryError::DuplicateMessage(id)
                    }
                    _ => MessageRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, message: &QueuedMessage) -> MessageRepositoryResult<()> {
        let id = message.id();
        let changes = to_row(message)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                queued_messages::table.filter(queued_messages::id.eq(id.into_inner())),
            )
            .set(&changes)
            .execute(connection)
            .map_err(MessageRepositoryError::persistence)?;
            if updated == 0 {
                return Err(MessageRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: MessageId) -> MessageRepositoryResult<Option<QueuedMessage>> {
        self.run_blocking(move |connection| {
            let row = queued_messages::table
                .filter(queued_messages::id.eq(id.into_inner()))
                .select(MessageRow::as_select())
                .first::<MessageRow>(connection)
                .optional()
                .map_err(MessageRepositoryError::persistence)?;
            row.map(row_to_message).transpose()
        })
        .await
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>> {
        self.run_blocking(move |connection| {
            let rows = queued_messages::table
                .filter(queued_messages::status.eq_any([
                    MessageStatus::Queued.as_str(),
                    MessageStatus::Approved.as_str(),
                ]))
                .filter(queued_messages::scheduled_for.le(now))
                .order((
                    queued_messages::priority.asc(),
                    queued_messages::scheduled_for.asc(),
                    queued_messages::created_at.asc(),
                ))
                .limit(i64::from(limit))
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(MessageRepositoryError::persistence)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }

    async fn claim(&self, id: MessageId, now: DateTime<Utc>) -> MessageRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let claimed = diesel::update(
                queued_messages::table
                    .filter(queued_messages::id.eq(id.into_inner()))
                    .filter(queued_messages::status.eq_any([
                        MessageStatus::Queued.as_str(),
                        MessageStatus::Approved.as_str(),
                    ])),
            )
            .set((
                queued_messages::status.eq(MessageStatus::Processing.as_str()),
                queued_messages::updated_at.eq(now),
            ))
            .execute(connection)
            .map_err(MessageRepositoryError::persistence)?;
            Ok(claimed == 1)
        })
        .await
    }

    async fn sent_unit_count_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> MessageRepositoryResult<u64> {
        let account = user_id.into_inner();
        self.run_blocking(move |connection| {
            let row: UnitCountRow = diesel::sql_query(concat!(
                "SELECT COUNT(DISTINCT COALESCE(sequence_id, id)) AS count ",
                "FROM queued_messages ",
                "WHERE user_id = $1 AND sent_at IS NOT NULL AND sent_at >= $2",
            ))
            .bind::<diesel::sql_types::Uuid, _>(account)
            .bind::<diesel::sql_types::Timestamptz, _>(since)
            .get_result(connection)
            .map_err(MessageRepositoryError::persistence)?;
            u64::try_from(row.count).map_err(MessageRepositoryError::persistence)
        })
        .await
    }

    async fn sequence_members(
        &self,
        sequence_id: SequenceId,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>> {
        let sequence = sequence_id.into_inner();
        self.run_blocking(move |connection| {
            let rows = queued_messages::table
                .filter(queued_messages::sequence_id.eq(sequence))
                .order(queued_messages::sequence_position.asc())
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(MessageRepositoryError::persistence)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }

    async fn find_active_for_context(
        &self,
        user_id: UserId,
        context: MessageContext,
    ) -> MessageRepositoryResult<Vec<QueuedMessage>> {
        let account = user_id.into_inner();
        self.run_blocking(move |connection| {
            let rows = queued_messages::table
                .filter(queued_messages::user_id.eq(account))
                .filter(queued_messages::status.eq_any([
                    MessageStatus::Queued.as_str(),
                    MessageStatus::Approved.as_str(),
                ]))
                .filter(queued_messages::context_type.eq(context.context_type.as_str()))
                .filter(queued_messages::context_id.eq(context.context_id))
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)
                .map_err(MessageRepositoryError::persistence)?;
            rows.into_iter().map(row_to_message).collect()
        })
        .await
    }

    async fn queued_depths(&self) -> MessageRepositoryResult<Vec<MessageQueueDepth>> {
        self.run_blocking(move |connection| {
            let rows: Vec<(i16, i64)> = queued_messages::table
                .filter(queued_messages::status.eq_any([
                    MessageStatus::Queued.as_str(),
                    MessageStatus::Approved.as_str(),
                ]))
                .group_by(queued_messages::priority)
                .select((queued_messages::priority, diesel::dsl::count_star()))
                .order(queued_messages::priority.asc())
                .load(connection)
                .map_err(MessageRepositoryError::persistence)?;

            rows.into_iter()
                .map(|(rank, count)| {
                    let priority = MessagePriority::from_rank(rank)
                        .map_err(MessageRepositoryError::persistence)?;
                    let count = u64::try_from(count).map_err(MessageRepositoryError::persistence)?;
                    Ok(MessageQueueDepth { priority, count })
                })
                .collect()
        })
        .await
    }
}

fn to_row(message: &QueuedMessage) -> MessageRepositoryResult<NewMessageRow> {
    let content =
        serde_json::to_value(message.content()).map_err(MessageRepositoryError::persistence)?;
    let sequence_position = message
        .sequence()
        .map(|slot| i32::try_from(slot.position))
        .transpose()
        .map_err(MessageRepositoryError::persistence)?;
    let sequence_total = message
        .sequence()
        .map(|slot| i32::try_from(slot.total))
        .transpose()
        .map_err(MessageRepositoryError::persistence)?;

    Ok(NewMessageRow {
        id: message.id().into_inner(),
        user_id: message.user_id().into_inner(),
        source_agent: message.source_agent().as_str().to_owned(),
        content,
        final_text: message.final_text().map(str::to_owned),
        scheduled_for: message.scheduled_for(),
        priority: message.priority().rank(),
        status: message.status().as_str().to_owned(),
        superseded_by: message.superseded_by().map(MessageId::into_inner),
        status_reason: message.status_reason().map(str::to_owned),
        sequence_id: message.sequence().map(|slot| slot.sequence_id.into_inner()),
        sequence_position,
        sequence_total,
        context_type: message
            .context()
            .map(|context| context.context_type.as_str().to_owned()),
        context_id: message.context().map(|context| context.context_id),
        requires_fresh_context: message.requires_fresh_context(),
        sent_at: message.sent_at(),
        created_at: message.created_at(),
        updated_at: message.updated_at(),
    })
}

fn row_to_message(row: MessageRow) -> MessageRepositoryResult<QueuedMessage> {
    let content: MessageContent =
        serde_json::from_value(row.content).map_err(MessageRepositoryError::persistence)?;
    let source_agent =
        AgentKind::new(row.source_agent).map_err(MessageRepositoryError::persistence)?;
    let priority =
        MessagePriority::from_rank(row.priority).map_err(MessageRepositoryError::persistence)?;
    let status =
        MessageStatus::try_from(row.status.as_str()).map_err(MessageRepositoryError::persistence)?;

    let sequence = match (row.sequence_id, row.sequence_position, row.sequence_total) {
        (Some(sequence_id), Some(position), Some(total)) => {
            let position = u32::try_from(position).map_err(MessageRepositoryError::persistence)?;
            let total = u32::try_from(total).map_err(MessageRepositoryError::persistence)?;
            let slot = SequenceSlot::new(SequenceId::from_uuid(sequence_id), position, total)
                .map_err(MessageRepositoryError::persistence)?;
            Some(slot)
        }
        _ => None,
    };

    let context = match (row.context_type, row.context_id) {
        (Some(kind), Some(context_id)) => {
            let context_type = AggregateType::try_from(kind.as_str())
                .map_err(MessageRepositoryError::persistence)?;
            Some(MessageContext {
                context_type,
                context_id,
            })
        }
        _ => None,
    };

    Ok(QueuedMessage::from_persisted(PersistedMessageData {
        id: MessageId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        source_agent,
        content,
        final_text: row.final_text,
        scheduled_for: row.scheduled_for,
        priority,
        status,
        superseded_by: row.superseded_by.map(MessageId::from_uuid),
        status_reason: row.status_reason,
        sequence,
        context,
        requires_fresh_context: row.requires_fresh_context,
        sent_at: row.sent_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
