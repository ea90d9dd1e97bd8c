//! Diesel row models for saga persistence.

use super::schema::{connection_requests, offers, opportunities};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query/insert/update row for opportunities.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OpportunityRow {
    /// Instance identifier.
    pub id: uuid::Uuid,
    /// Connector being asked.
    pub connector_id: uuid::Uuid,
    /// Requesting member.
    pub requester_id: uuid::Uuid,
    /// Prospect display name.
    pub subject: String,
    /// Bounty in credit units.
    pub bounty: i64,
    /// Lifecycle status.
    pub status: String,
    /// Expiry deadline.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query/insert/update row for connection requests.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = connection_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConnectionRequestRow {
    /// Instance identifier.
    pub id: uuid::Uuid,
    /// Member being asked for an introduction.
    pub target_id: uuid::Uuid,
    /// Requesting third-party display name.
    pub requester: String,
    /// Bounty in credit units.
    pub bounty: i64,
    /// Lifecycle status.
    pub status: String,
    /// Expiry deadline.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query/insert/update row for offers.
///
/// `None` acceptance timestamps must clear the column, hence
/// `treat_none_as_null`.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct OfferRow {
    /// Instance identifier.
    pub id: uuid::Uuid,
    /// Person offered the introduction.
    pub introducee_id: uuid::Uuid,
    /// Facilitating connector.
    pub connector_id: uuid::Uuid,
    /// Subject display name.
    pub subject: String,
    /// Bounty in credit units.
    pub bounty: i64,
    /// Lifecycle status.
    pub status: String,
    /// Introducee acceptance timestamp.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Whether the single connector reminder is scheduled.
    pub reminder_scheduled: bool,
    /// Expiry deadline for the unanswered offer.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}
