//! Ledger line entity and related value types.

use super::{CreditDomainError, CreditEventId, IdempotencyKey};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditEventType {
    /// Bounty for a completed opportunity introduction.
    IntroductionBounty,
    /// Bounty for a completed inbound connection request.
    ConnectionBounty,
    /// Bounty for a completed two-step offer handshake.
    OfferBounty,
    /// Operator-initiated balance adjustment.
    ManualAdjustment,
}

impl CreditEventType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IntroductionBounty => "introduction_bounty",
            Self::ConnectionBounty => "connection_bounty",
            Self::OfferBounty => "offer_bounty",
            Self::ManualAdjustment => "manual_adjustment",
        }
    }
}

impl TryFrom<&str> for CreditEventType {
    type Error = CreditDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "introduction_bounty" => Ok(Self::IntroductionBounty),
            "connection_bounty" => Ok(Self::ConnectionBounty),
            "offer_bounty" => Ok(Self::OfferBounty),
            "manual_adjustment" => Ok(Self::ManualAdjustment),
            _ => Err(CreditDomainError::InvalidEventType(value.to_owned())),
        }
    }
}

/// Kind of entity a ledger line references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditReferenceType {
    /// An opportunity saga instance.
    Opportunity,
    /// A connection-request saga instance.
    ConnectionRequest,
    /// An offer saga instance.
    Offer,
    /// An operator action with no saga counterpart.
    Operator,
}

impl CreditReferenceType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opportunity => "opportunity",
            Self::ConnectionRequest => "connection_request",
            Self::Offer => "offer",
            Self::Operator => "operator",
        }
    }
}

impl TryFrom<&str> for CreditReferenceType {
    type Error = CreditDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "opportunity" => Ok(Self::Opportunity),
            "connection_request" => Ok(Self::ConnectionRequest),
            "offer" => Ok(Self::Offer),
            "operator" => Ok(Self::Operator),
            _ => Err(CreditDomainError::InvalidReferenceType(value.to_owned())),
        }
    }
}

/// Signed credit amount in whole credit units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditAmount(i64);

impl CreditAmount {
    /// Creates a validated non-zero amount.
    ///
    /// # Errors
    ///
    /// Returns [`CreditDomainError::ZeroAmount`] when the value is zero.
    pub const fn new(value: i64) -> Result<Self, CreditDomainError> {
        if value == 0 {
            return Err(CreditDomainError::ZeroAmount);
        }
        Ok(Self(value))
    }

    /// Returns the underlying signed value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Parameters for creating a new ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCreditEvent {
    /// Account the line belongs to.
    pub user_id: UserId,
    /// Classification of the line.
    pub event_type: CreditEventType,
    /// Signed amount in credit units.
    pub amount: CreditAmount,
    /// Kind of entity the line references.
    pub reference_type: CreditReferenceType,
    /// Identifier of the referenced entity.
    pub reference_id: Uuid,
}

/// Immutable ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEvent {
    id: CreditEventId,
    user_id: UserId,
    event_type: CreditEventType,
    amount: CreditAmount,
    reference_type: CreditReferenceType,
    reference_id: Uuid,
    idempotency_key: IdempotencyKey,
    processed: bool,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted ledger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedCreditEventData {
    /// Persisted line identifier.
    pub id: CreditEventId,
    /// Persisted account identifier.
    pub user_id: UserId,
    /// Persisted event classification.
    pub event_type: CreditEventType,
    /// Persisted signed amount.
    pub amount: CreditAmount,
    /// Persisted reference kind.
    pub reference_type: CreditReferenceType,
    /// Persisted reference identifier.
    pub reference_id: Uuid,
    /// Persisted idempotency key.
    pub idempotency_key: IdempotencyKey,
    /// Persisted processed flag.
    pub processed: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CreditEvent {
    /// Creates a new processed ledger line with a derived idempotency key.
    #[must_use]
    pub fn new(params: NewCreditEvent, clock: &impl Clock) -> Self {
        let idempotency_key =
            IdempotencyKey::derive(params.event_type.as_str(), params.reference_id);
        Self {
            id: CreditEventId::new(),
            user_id: params.user_id,
            event_type: params.event_type,
            amount: params.amount,
            reference_type: params.reference_type,
            reference_id: params.reference_id,
            idempotency_key,
            processed: true,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a ledger line from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedCreditEventData) -> Self {
        Self {
            id: data.id,
            user_id: data.user_id,
            event_type: data.event_type,
            amount: data.amount,
            reference_type: data.reference_type,
            reference_id: data.reference_id,
            idempotency_key: data.idempotency_key,
            processed: data.processed,
            created_at: data.created_at,
        }
    }

    /// Returns the line identifier.
    #[must_use]
    pub const fn id(&self) -> CreditEventId {
        self.id
    }

    /// Returns the account identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the event classification.
    #[must_use]
    pub const fn event_type(&self) -> CreditEventType {
        self.event_type
    }

    /// Returns the signed amount.
    #[must_use]
    pub const fn amount(&self) -> CreditAmount {
        self.amount
    }

    /// Returns the reference kind.
    #[must_use]
    pub const fn reference_type(&self) -> CreditReferenceType {
        self.reference_type
    }

    /// Returns the referenced entity identifier.
    #[must_use]
    pub const fn reference_id(&self) -> Uuid {
        self.reference_id
    }

    /// Returns the idempotency key.
    #[must_use]
    pub const fn idempotency_key(&self) -> &IdempotencyKey {
        &self.idempotency_key
    }

    /// Returns `true` when the line counts toward the cached balance.
    #[must_use]
    pub const fn processed(&self) -> bool {
        self.processed
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
