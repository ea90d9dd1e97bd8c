//! Opportunity saga: a connector is offered a prospect to introduce.

use super::{Bounty, OpportunityId, SagaDomainError, SubjectName};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Opportunity lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityStatus {
    /// Offered to the connector, awaiting a response.
    Open,
    /// The connector agreed to make the introduction.
    Accepted,
    /// The connector declined; terminal.
    Declined,
    /// The introduction happened; terminal.
    Completed,
    /// Withdrawn after acceptance; terminal.
    Cancelled,
    /// Ran out of time or was resolved elsewhere; terminal.
    Expired,
}

impl OpportunityStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Returns `true` for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Declined | Self::Completed | Self::Cancelled | Self::Expired
        )
    }
}

impl TryFrom<&str> for OpportunityStatus {
    type Error = SagaDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(SagaDomainError::InvalidStatus(value.to_owned())),
        }
    }
}

impl std::fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for opening an opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOpportunity {
    /// Connector being asked to make the introduction.
    pub connector_id: UserId,
    /// Member the introduction is requested on behalf of.
    pub requester_id: UserId,
    /// Prospect to be introduced.
    pub subject: SubjectName,
    /// Bounty at stake.
    pub bounty: Bounty,
    /// When the opportunity lapses if unanswered.
    pub expires_at: DateTime<Utc>,
}

/// Opportunity saga instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    id: OpportunityId,
    connector_id: UserId,
    requester_id: UserId,
    subject: SubjectName,
    bounty: Bounty,
    status: OpportunityStatus,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedOpportunityData {
    /// Persisted instance identifier.
    pub id: OpportunityId,
    /// Persisted connector.
    pub connector_id: UserId,
    /// Persisted requesting member.
    pub requester_id: UserId,
    /// Persisted prospect name.
    pub subject: SubjectName,
    /// Persisted bounty.
    pub bounty: Bounty,
    /// Persisted lifecycle status.
    pub status: OpportunityStatus,
    /// Persisted expiry deadline.
    pub expires_at: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    /// Creates a new open opportunity.
    #[must_use]
    pub fn new(params: NewOpportunity, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: OpportunityId::new(),
            connector_id: params.connector_id,
            requester_id: params.requester_id,
            subject: params.subject,
            bounty: params.bounty,
            status: OpportunityStatus::Open,
            expires_at: params.expires_at,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an opportunity from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedOpportunityData) -> Self {
        Self {
            id: data.id,
            connector_id: data.connector_id,
            requester_id: data.requester_id,
            subject: data.subject,
            bounty: data.bounty,
            status: data.status,
            expires_at: data.expires_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the instance identifier.
    #[must_use]
    pub const fn id(&self) -> OpportunityId {
        self.id
    }

    /// Returns the connector.
    #[must_use]
    pub const fn connector_id(&self) -> UserId {
        self.connector_id
    }

    /// Returns the requesting member.
    #[must_use]
    pub const fn requester_id(&self) -> UserId {
        self.requester_id
    }

    /// Returns the prospect name.
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
    pub const fn status(&self) -> OpportunityStatus {
        self.status
    }

    /// Returns the expiry deadline.
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

    /// The connector accepts: `open` to `accepted`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn accept(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(OpportunityStatus::Open, OpportunityStatus::Accepted, clock)
    }

    /// The connector declines: `open` to `declined`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn decline(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(OpportunityStatus::Open, OpportunityStatus::Declined, clock)
    }

    /// The introduction happened: `accepted` to `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            OpportunityStatus::Accepted,
            OpportunityStatus::Completed,
            clock,
        )
    }

    /// Withdrawn after acceptance: `accepted` to `cancelled`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            OpportunityStatus::Accepted,
            OpportunityStatus::Cancelled,
            clock,
        )
    }

    /// Lapses or is resolved elsewhere: any live state to `expired`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances.
    pub fn expire(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        if self.status.is_terminal() {
            return Err(self.already_terminal());
        }
        self.status = OpportunityStatus::Expired;
        self.touch(clock);
        Ok(())
    }

    /// Returns `true` when the instance is past its deadline and live.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.expires_at <= now
    }

    fn transition(
        &mut self,
        from: OpportunityStatus,
        to: OpportunityStatus,
        clock: &impl Clock,
    ) -> Result<(), SagaDomainError> {
        if self.status.is_terminal() {
            return Err(self.already_terminal());
        }
        if self.status != from {
            return Err(SagaDomainError::InvalidTransition {
                entity: "opportunity",
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
            entity: "opportunity",
            id: self.id.into_inner(),
            status: self.status.as_str(),
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
