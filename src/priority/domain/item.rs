//! Priority item aggregate and its presentation/dormancy state machine.

use super::{PriorityDomainError, PriorityItemId, Score};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of unactioned presentations after which an item goes dormant.
pub const DORMANCY_THRESHOLD: u32 = 2;

/// Kind of actionable entity a priority item points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityItemType {
    /// An opportunity offered to a connector.
    Opportunity,
    /// An inbound connection request.
    ConnectionRequest,
    /// A two-step introduction offer.
    Offer,
}

impl PriorityItemType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opportunity => "opportunity",
            Self::ConnectionRequest => "connection_request",
            Self::Offer => "offer",
        }
    }
}

impl TryFrom<&str> for PriorityItemType {
    type Error = PriorityDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "opportunity" => Ok(Self::Opportunity),
            "connection_request" => Ok(Self::ConnectionRequest),
            "offer" => Ok(Self::Offer),
            _ => Err(PriorityDomainError::InvalidItemType(value.to_owned())),
        }
    }
}

/// Presentation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityStatus {
    /// Actionable and eligible for proactive surfacing.
    Active,
    /// Surfaced to the user at least once, awaiting action.
    Presented,
    /// The user acted on the item; terminal.
    Actioned,
    /// The underlying entity resolved without user action; terminal.
    Expired,
    /// Surfaced twice without action; suppressed until a new signal.
    Dormant,
}

impl PriorityStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Presented => "presented",
            Self::Actioned => "actioned",
            Self::Expired => "expired",
            Self::Dormant => "dormant",
        }
    }

    /// Returns `true` for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Actioned | Self::Expired)
    }
}

impl TryFrom<&str> for PriorityStatus {
    type Error = PriorityDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "presented" => Ok(Self::Presented),
            "actioned" => Ok(Self::Actioned),
            "expired" => Ok(Self::Expired),
            "dormant" => Ok(Self::Dormant),
            _ => Err(PriorityDomainError::InvalidStatus(value.to_owned())),
        }
    }
}

impl std::fmt::Display for PriorityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Natural key of a priority item.
///
/// Re-deriving an item with an existing key is an upsert, never a
/// duplicate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriorityKey {
    /// User whose queue the item belongs to.
    pub user_id: UserId,
    /// Kind of referenced entity.
    pub item_type: PriorityItemType,
    /// Identifier of the referenced entity.
    pub item_id: Uuid,
}

/// Denormalized display fields carried on the item.
///
/// These exist so message composition can describe the item without a
/// join; the referenced saga entity stays authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// One-line description of the actionable item.
    pub headline: String,
    /// Display name of the counterpart, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterpart_name: Option<String>,
    /// Bounty attached to the underlying saga, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounty: Option<i64>,
}

/// Ranked actionable item in one user's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityItem {
    id: PriorityItemId,
    key: PriorityKey,
    rank: u32,
    value_score: Score,
    status: PriorityStatus,
    presentation_count: u32,
    last_presented_at: Option<DateTime<Utc>>,
    dormant_at: Option<DateTime<Utc>>,
    summary: ItemSummary,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted priority item.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedPriorityItemData {
    /// Persisted item identifier.
    pub id: PriorityItemId,
    /// Persisted natural key.
    pub key: PriorityKey,
    /// Persisted rank position.
    pub rank: u32,
    /// Persisted value score.
    pub value_score: Score,
    /// Persisted lifecycle status.
    pub status: PriorityStatus,
    /// Persisted presentation count.
    pub presentation_count: u32,
    /// Persisted last presentation timestamp.
    pub last_presented_at: Option<DateTime<Utc>>,
    /// Persisted dormancy timestamp.
    pub dormant_at: Option<DateTime<Utc>>,
    /// Persisted summary fields.
    pub summary: ItemSummary,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl PriorityItem {
    /// Creates a new active item at the bottom of the queue.
    #[must_use]
    pub fn new(key: PriorityKey, value_score: Score, summary: ItemSummary, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: PriorityItemId::new(),
            key,
            rank: 0,
            value_score,
            status: PriorityStatus::Active,
            presentation_count: 0,
            last_presented_at: None,
            dormant_at: None,
            summary,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an item from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPriorityItemData) -> Self {
        Self {
            id: data.id,
            key: data.key,
            rank: data.rank,
            value_score: data.value_score,
            status: data.status,
            presentation_count: data.presentation_count,
            last_presented_at: data.last_presented_at,
            dormant_at: data.dormant_at,
            summary: data.summary,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub const fn id(&self) -> PriorityItemId {
        self.id
    }

    /// Returns the natural key.
    #[must_use]
    pub const fn key(&self) -> PriorityKey {
        self.key
    }

    /// Returns the user whose queue the item belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.key.user_id
    }

    /// Returns the current rank position (1 is highest; 0 is unranked).
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the value score.
    #[must_use]
    pub const fn value_score(&self) -> Score {
        self.value_score
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PriorityStatus {
        self.status
    }

    /// Returns how many times the item has been surfaced.
    #[must_use]
    pub const fn presentation_count(&self) -> u32 {
        self.presentation_count
    }

    /// Returns when the item was last surfaced.
    #[must_use]
    pub const fn last_presented_at(&self) -> Option<DateTime<Utc>> {
        self.last_presented_at
    }

    /// Returns when the item went dormant.
    #[must_use]
    pub const fn dormant_at(&self) -> Option<DateTime<Utc>> {
        self.dormant_at
    }

    /// Returns the denormalized summary.
    #[must_use]
    pub const fn summary(&self) -> &ItemSummary {
        &self.summary
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the item may be proactively surfaced.
    #[must_use]
    pub const fn is_surfaceable(&self) -> bool {
        matches!(self.status, PriorityStatus::Active | PriorityStatus::Presented)
    }

    /// Updates the rank position.
    pub fn assign_rank(&mut self, rank: u32, clock: &impl Clock) {
        self.rank = rank;
        self.touch(clock);
    }

    /// Refreshes the score and summary on re-derivation.
    ///
    /// Presentation counters and lifecycle status are preserved; a
    /// re-derive is not a user action and not a new signal.
    pub fn refresh(&mut self, value_score: Score, summary: ItemSummary, clock: &impl Clock) {
        self.value_score = value_score;
        self.summary = summary;
        self.touch(clock);
    }

    /// Records one presentation of the item to its user.
    ///
    /// The second unactioned presentation tips the item into dormancy.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityDomainError::AlreadyResolved`] for terminal items
    /// and [`PriorityDomainError::DormancySuppressed`] for dormant ones.
    pub fn record_presentation(&mut self, clock: &impl Clock) -> Result<(), PriorityDomainError> {
        if self.status.is_terminal() {
            return Err(PriorityDomainError::AlreadyResolved {
                id: self.id,
                status: self.status,
            });
        }
        if self.status == PriorityStatus::Dormant {
            return Err(PriorityDomainError::DormancySuppressed(self.id));
        }

        let timestamp = clock.utc();
        self.presentation_count = self.presentation_count.saturating_add(1);
        self.last_presented_at = Some(timestamp);
        if self.presentation_count >= DORMANCY_THRESHOLD {
            self.status = PriorityStatus::Dormant;
            self.dormant_at = Some(timestamp);
        } else {
            self.status = PriorityStatus::Presented;
        }
        self.updated_at = timestamp;
        Ok(())
    }

    /// Marks the item as acted upon. Terminal; idempotent once resolved.
    pub fn action(&mut self, clock: &impl Clock) {
        if self.status.is_terminal() {
            return;
        }
        self.status = PriorityStatus::Actioned;
        self.touch(clock);
    }

    /// Marks the item as expired. Terminal; idempotent once resolved.
    pub fn expire(&mut self, clock: &impl Clock) {
        if self.status.is_terminal() {
            return;
        }
        self.status = PriorityStatus::Expired;
        self.touch(clock);
    }

    /// Returns a dormant item to the active pool after a new signal.
    ///
    /// The presentation counter restarts so the item can be surfaced
    /// again.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityDomainError::NotDormant`] unless the item is
    /// dormant.
    pub fn reactivate(&mut self, clock: &impl Clock) -> Result<(), PriorityDomainError> {
        if self.status != PriorityStatus::Dormant {
            return Err(PriorityDomainError::NotDormant {
                id: self.id,
                status: self.status,
            });
        }
        self.status = PriorityStatus::Active;
        self.presentation_count = 0;
        self.dormant_at = None;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
