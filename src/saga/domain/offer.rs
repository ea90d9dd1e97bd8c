//! Offer saga: the only variant with a two-step handshake.
//!
//! The introducee responds first; the connector must then confirm the
//! introduction actually happened before the bounty is paid.

use super::{Bounty, OfferId, SagaDomainError, SubjectName};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Offer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    /// Waiting for the introducee to accept or decline.
    PendingIntroduceeResponse,
    /// Introducee accepted; waiting for the connector to confirm.
    PendingConnectorConfirmation,
    /// The introducee declined; terminal.
    Declined,
    /// The connector confirmed; terminal.
    Completed,
    /// Ran out both grace periods unconfirmed; terminal.
    Expired,
}

impl OfferStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingIntroduceeResponse => "pending_introducee_response",
            Self::PendingConnectorConfirmation => "pending_connector_confirmation",
            Self::Declined => "declined",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    /// Returns `true` for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Completed | Self::Expired)
    }
}

impl TryFrom<&str> for OfferStatus {
    type Error = SagaDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending_introducee_response" => Ok(Self::PendingIntroduceeResponse),
            "pending_connector_confirmation" => Ok(Self::PendingConnectorConfirmation),
            "declined" => Ok(Self::Declined),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            _ => Err(SagaDomainError::InvalidStatus(value.to_owned())),
        }
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for creating an offer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOffer {
    /// Person being offered the introduction.
    pub introducee_id: UserId,
    /// Facilitating connector.
    pub connector_id: UserId,
    /// Person the introducee would be introduced to.
    pub subject: SubjectName,
    /// Bounty at stake, already resolved against provider rates.
    pub bounty: Bounty,
    /// When an unanswered offer lapses.
    pub expires_at: DateTime<Utc>,
}

/// Offer saga instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    introducee_id: UserId,
    connector_id: UserId,
    subject: SubjectName,
    bounty: Bounty,
    status: OfferStatus,
    accepted_at: Option<DateTime<Utc>>,
    reminder_scheduled: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted offer.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedOfferData {
    /// Persisted instance identifier.
    pub id: OfferId,
    /// Persisted introducee.
    pub introducee_id: UserId,
    /// Persisted connector.
    pub connector_id: UserId,
    /// Persisted subject name.
    pub subject: SubjectName,
    /// Persisted bounty.
    pub bounty: Bounty,
    /// Persisted lifecycle status.
    pub status: OfferStatus,
    /// Persisted acceptance timestamp.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Persisted reminder flag.
    pub reminder_scheduled: bool,
    /// Persisted expiry deadline.
    pub expires_at: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Creates a new offer awaiting the introducee's response.
    #[must_use]
    pub fn new(params: NewOffer, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: OfferId::new(),
            introducee_id: params.introducee_id,
            connector_id: params.connector_id,
            subject: params.subject,
            bounty: params.bounty,
            status: OfferStatus::PendingIntroduceeResponse,
            accepted_at: None,
            reminder_scheduled: false,
            expires_at: params.expires_at,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an offer from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOfferData) -> Self {
        Self {
            id: data.id,
            introducee_id: data.introducee_id,
            connector_id: data.connector_id,
            subject: data.subject,
            bounty: data.bounty,
            status: data.status,
            accepted_at: data.accepted_at,
            reminder_scheduled: data.reminder_scheduled,
            expires_at: data.expires_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the instance identifier.
    #[must_use]
    pub const fn id(&self) -> OfferId {
        self.id
    }

    /// Returns the introducee.
    #[must_use]
    pub const fn introducee_id(&self) -> UserId {
        self.introducee_id
    }

    /// Returns the connector.
    #[must_use]
    pub const fn connector_id(&self) -> UserId {
        self.connector_id
    }

    /// Returns the subject name.
    #[must_use]
    pub const fn subject(&self) -> &SubjectName {
        &self.subject
    }

    /// Returns the bounty.
    #[must_use]
    pub const fn bounty(&self) -> Bounty {
        self.bounty
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> OfferStatus {
        self.status
    }

    /// Returns when the introducee accepted, if they have.
    #[must_use]
    pub const fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }

    /// Returns `true` once the single connector reminder is scheduled.
    #[must_use]
    pub const fn reminder_scheduled(&self) -> bool {
        self.reminder_scheduled
    }

    /// Returns the expiry deadline for the unanswered offer.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Introducee accepts: first handshake step.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn introducee_accept(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            OfferStatus::PendingIntroduceeResponse,
            OfferStatus::PendingConnectorConfirmation,
            clock,
        )?;
        self.accepted_at = Some(self.updated_at);
        Ok(())
    }

    /// Introducee declines; the offer never reaches confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn introducee_decline(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            OfferStatus::PendingIntroduceeResponse,
            OfferStatus::Declined,
            clock,
        )
    }

    /// Connector confirms: second handshake step, completing the offer.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn connector_confirm(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            OfferStatus::PendingConnectorConfirmation,
            OfferStatus::Completed,
            clock,
        )
    }

    /// Records that the single connector reminder has been scheduled.
    pub fn mark_reminder_scheduled(&mut self, clock: &impl Clock) {
        self.reminder_scheduled = true;
        self.touch(clock);
    }

    /// Runs out of time: any live state to `expired`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances.
    pub fn expire(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        if self.status.is_terminal() {
            return Err(self.already_terminal());
        }
        self.status = OfferStatus::Expired;
        self.touch(clock);
        Ok(())
    }

    fn transition(
        &mut self,
        from: OfferStatus,
        to: OfferStatus,
        clock: &impl Clock,
    ) -> Result<(), SagaDomainError> {
        if self.status.is_terminal() {
            return Err(self.already_terminal());
        }
        if self.status != from {
            return Err(SagaDomainError::InvalidTransition {
                entity: "offer",
                id: self.id.into_inner(),
                from: self.status.as_str(),
                attempted: to.as_str(),
            });
        }
        self.status = to;
        self.touch(clock);
        Ok(())
    }

    const fn already_terminal(&self) -> SagaDomainError {
        SagaDomainError::AlreadyTerminal {
            entity: "offer",
            id: self.id.into_inner(),
            status: self.status.as_str(),
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
