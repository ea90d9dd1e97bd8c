//! Diesel row models for priority ledger persistence.

use super::schema::priority_items;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for priority items.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = priority_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PriorityItemRow {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// User whose queue the item belongs to.
    pub user_id: uuid::Uuid,
    /// Referenced entity kind.
    pub item_type: String,
    /// Referenced entity identifier.
    pub item_id: uuid::Uuid,
    /// Rank position.
    pub rank: i32,
    /// Value score.
    pub value_score: i16,
    /// Lifecycle status.
    pub status: String,
    /// Number of presentations so far.
    pub presentation_count: i32,
    /// When the item was last surfaced.
    pub last_presented_at: Option<DateTime<Utc>>,
    /// When the item went dormant.
    pub dormant_at: Option<DateTime<Utc>>,
    /// Denormalized summary payload.
    pub summary: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for priority items.
///
/// `None` timestamps must clear their columns on update (reactivation
/// resets `dormant_at`), hence `treat_none_as_null`.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = priority_items)]
#[diesel(treat_none_as_null = true)]
pub struct NewPriorityItemRow {
    /// Item identifier.
    pub id: uuid::Uuid,
    /// User whose queue the item belongs to.
    pub user_id: uuid::Uuid,
    /// Referenced entity kind.
    pub item_type: String,
    /// Referenced entity identifier.
    pub item_id: uuid::Uuid,
    /// Rank position.
    pub rank: i32,
    /// Value score.
    pub value_score: i16,
    /// Lifecycle status.
    pub status: String,
    /// Number of presentations so far.
    pub presentation_count: i32,
    /// When the item was last surfaced.
    pub last_presented_at: Option<DateTime<Utc>>,
    /// When the item went dormant.
    pub dormant_at: Option<DateTime<Utc>>,
    /// Denormalized summary payload.
    pub summary: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
