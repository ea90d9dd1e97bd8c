//! Diesel row models for credit ledger persistence.

use super::schema::{credit_balances, credit_events};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for ledger lines.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = credit_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreditEventRow {
    /// Ledger line identifier.
    pub id: uuid::Uuid,
    /// Account identifier.
    pub user_id: uuid::Uuid,
    /// Event classification tag.
    pub event_type: String,
    /// Signed amount in credit units.
    pub amount: i64,
    /// Referenced entity kind.
    pub reference_type: String,
    /// Referenced entity identifier.
    pub reference_id: uuid::Uuid,
    /// Deterministic idempotency key.
    pub idempotency_key: String,
    /// Whether the line counts toward the cached balance.
    pub processed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for ledger lines.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = credit_events)]
pub struct NewCreditEventRow {
    /// Ledger line identifier.
    pub id: uuid::Uuid,
    /// Account identifier.
    pub user_id: uuid::Uuid,
    /// Event classification tag.
    pub event_type: String,
    /// Signed amount in credit units.
    pub amount: i64,
    /// Referenced entity kind.
    pub reference_type: String,
    /// Referenced entity identifier.
    pub reference_id: uuid::Uuid,
    /// Deterministic idempotency key.
    pub idempotency_key: String,
    /// Whether the line counts toward the cached balance.
    pub processed: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert/update model for balance snapshots.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = credit_balances)]
pub struct BalanceRow {
    /// Account identifier.
    pub user_id: uuid::Uuid,
    /// Sum of processed line amounts.
    pub balance: i64,
    /// When the snapshot was recomputed.
    pub computed_at: DateTime<Utc>,
}

/// Query result row for balance snapshots.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = credit_balances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BalanceQueryRow {
    /// Account identifier.
    pub user_id: uuid::Uuid,
    /// Sum of processed line amounts.
    pub balance: i64,
    /// When the snapshot was recomputed.
    pub computed_at: DateTime<Utc>,
}
