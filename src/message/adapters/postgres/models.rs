//! Diesel row models for message orchestrator persistence.

use super::schema::queued_messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for queued messages.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = queued_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Recipient.
    pub user_id: uuid::Uuid,
    /// Composing agent kind.
    pub source_agent: String,
    /// Serialized content payload.
    pub content: Value,
    /// Rendered text, when recorded.
    pub final_text: Option<String>,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Priority rank.
    pub priority: i16,
    /// Lifecycle status.
    pub status: String,
    /// Superseding message, when replaced.
    pub superseded_by: Option<uuid::Uuid>,
    /// Supersession or cancellation reason.
    pub status_reason: Option<String>,
    /// Sequence identifier, when any.
    pub sequence_id: Option<uuid::Uuid>,
    /// One-based sequence position.
    pub sequence_position: Option<i32>,
    /// Total sequence members.
    pub sequence_total: Option<i32>,
    /// Kind of the referenced entity, when any.
    pub context_type: Option<String>,
    /// Identifier of the referenced entity, when any.
    pub context_id: Option<uuid::Uuid>,
    /// Whether content re-renders immediately before send.
    pub requires_fresh_context: bool,
    /// Delivery timestamp, when sent.
    pub sent_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert/update model for queued messages.
///
/// `None` values must clear their columns on update, hence
/// `treat_none_as_null`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = queued_messages)]
#[diesel(treat_none_as_null = true)]
pub struct NewMessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Recipient.
    pub user_id: uuid::Uuid,
    /// Composing agent kind.
    pub source_agent: String,
    /// Serialized content payload.
    pub content: Value,
    /// Rendered text, when recorded.
    pub final_text: Option<String>,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Priority rank.
    pub priority: i16,
    /// Lifecycle status.
    pub status: String,
    /// Superseding message, when replaced.
    pub superseded_by: Option<uuid::Uuid>,
    /// Supersession or cancellation reason.
    pub status_reason: Option<String>,
    /// Sequence identifier, when any.
    pub sequence_id: Option<uuid::Uuid>,
    /// One-based sequence position.
    pub sequence_position: Option<i32>,
    /// Total sequence members.
    pub sequence_total: Option<i32>,
    /// Kind of the referenced entity, when any.
    pub context_type: Option<String>,
    /// Identifier of the referenced entity, when any.
    pub context_id: Option<uuid::Uuid>,
    /// Whether content re-renders immediately before send.
    pub requires_fresh_context: bool,
    /// Delivery timestamp, when sent.
    pub sent_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Count row for unit-budget queries.
#[derive(Debug, QueryableByName)]
pub struct UnitCountRow {
    /// Distinct send units in the window.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}
