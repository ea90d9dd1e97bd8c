//! Diesel row models for event log persistence.

use super::schema::{dead_letters, events};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for events.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EventRow {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Event type tag.
    pub event_type: String,
    /// Aggregate identifier.
    pub aggregate_id: uuid::Uuid,
    /// Aggregate kind.
    pub aggregate_type: String,
    /// Serialized payload.
    pub payload: Value,
    /// Serialized metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Producer agent kind.
    pub created_by: String,
}

/// Insert model for events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEventRow {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Event type tag.
    pub event_type: String,
    /// Aggregate identifier.
    pub aggregate_id: uuid::Uuid,
    /// Aggregate kind.
    pub aggregate_type: String,
    /// Serialized payload.
    pub payload: Value,
    /// Serialized metadata.
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Producer agent kind.
    pub created_by: String,
}

/// Query result row for dead letters.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = dead_letters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeadLetterRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Source kind tag.
    pub kind: String,
    /// Identifier of the parked event or task.
    pub reference_id: uuid::Uuid,
    /// Serialized payload.
    pub payload: Value,
    /// Serialized error history.
    pub error_log: Value,
    /// Attempt count.
    pub attempts: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for dead letters.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = dead_letters)]
pub struct NewDeadLetterRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Source kind tag.
    pub kind: String,
    /// Identifier of the parked event or task.
    pub reference_id: uuid::Uuid,
    /// Serialized payload.
    pub payload: Value,
    /// Serialized error history.
    pub error_log: Value,
    /// Attempt count.
    pub attempts: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
