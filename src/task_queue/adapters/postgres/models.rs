//! Diesel row models for task queue persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task type tag.
    pub task_type: String,
    /// Owning worker type.
    pub agent_type: String,
    /// Member the task concerns, when any.
    pub user_id: Option<uuid::Uuid>,
    /// Kind of the referenced entity, when any.
    pub context_type: Option<String>,
    /// Identifier of the referenced entity, when any.
    pub context_id: Option<uuid::Uuid>,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Priority rank.
    pub priority: i16,
    /// Lifecycle status.
    pub status: String,
    /// Attempt count so far.
    pub retry_count: i32,
    /// Retry ceiling.
    pub max_retries: i32,
    /// Serialized payload.
    pub payload: Value,
    /// Result payload, when completed.
    pub result_payload: Option<Value>,
    /// Serialized error history.
    pub error_log: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert/update model for tasks.
///
/// `None` values must clear their columns on update, hence
/// `treat_none_as_null`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task type tag.
    pub task_type: String,
    /// Owning worker type.
    pub agent_type: String,
    /// Member the task concerns, when any.
    pub user_id: Option<uuid::Uuid>,
    /// Kind of the referenced entity, when any.
    pub context_type: Option<String>,
    /// Identifier of the referenced entity, when any.
    pub context_id: Option<uuid::Uuid>,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// Priority rank.
    pub priority: i16,
    /// Lifecycle status.
    pub status: String,
    /// Attempt count so far.
    pub retry_count: i32,
    /// Retry ceiling.
    pub max_retries: i32,
    /// Serialized payload.
    pub payload: Value,
    /// Result payload, when completed.
    pub result_payload: Option<Value>,
    /// Serialized error history.
    pub error_log: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}
