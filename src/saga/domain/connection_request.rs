//! Connection-request saga: a third party asks to meet a member.

use super::{Bounty, ConnectionRequestId, SagaDomainError, SubjectName};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Connection-request lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionRequestStatus {
    /// Presented to the member, awaiting a response.
    Open,
    /// The member agreed to the introduction.
    Accepted,
    /// The member declined; terminal.
    Declined,
    /// The introduction happened; terminal.
    Completed,
    /// Ran out of time; terminal.
    Expired,
}

impl ConnectionRequestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Accepted => "accepted",
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

impl TryFrom<&str> for ConnectionRequestStatus {
    type Error = SagaDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "completed" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            _ => Err(SagaDomainError::InvalidStatus(value.to_owned())),
        }
    }
}

impl std::fmt::Display for ConnectionRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters for opening a connection request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConnectionRequest {
    /// Member being asked for an introduction.
    pub target_id: UserId,
    /// Display name of the requesting third party.
    pub requester: SubjectName,
    /// Bounty at stake.
    pub bounty: Bounty,
    /// When the request lapses if unanswered.
    pub expires_at: DateTime<Utc>,
}

/// Connection-request saga instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    id: ConnectionRequestId,
    target_id: UserId,
    requester: SubjectName,
    bounty: Bounty,
    status: ConnectionRequestStatus,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted connection request.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedConnectionRequestData {
    /// Persisted instance identifier.
    pub id: ConnectionRequestId,
    /// Persisted target member.
    pub target_id: UserId,
    /// Persisted requester name.
    pub requester: SubjectName,
    /// Persisted bounty.
    pub bounty: Bounty,
    /// Persisted lifecycle status.
    pub status: ConnectionRequestStatus,
    /// Persisted expiry deadline.
    pub expires_at: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// Creates a new open connection request.
    #[must_use]
    pub fn new(params: NewConnectionRequest, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ConnectionRequestId::new(),
            target_id: params.target_id,
            requester: params.requester,
            bounty: params.bounty,
            status: ConnectionRequestStatus::Open,
            expires_at: params.expires_at,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a connection request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedConnectionRequestData) -> Self {
        Self {
            id: data.id,
            target_id: data.target_id,
            requester: data.requester,
            bounty: data.bounty,
            status: data.status,
            expires_at: data.expires_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the instance identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectionRequestId {
        self.id
    }

    /// Returns the target member.
    #[must_use]
    pub const fn target_id(&self) -> UserId {
        self.target_id
    }

    /// Returns the requester name.
    #[must_use]
    pub const fn requester(&self) -> &SubjectName {
        &self.requester
    }

    /// Returns the bounty.
    #[must_use]
    pub const fn bounty(&self) -> Bounty {
        self.bounty
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ConnectionRequestStatus {
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

    /// The member accepts: `open` to `accepted`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn accept(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            ConnectionRequestStatus::Open,
            ConnectionRequestStatus::Accepted,
            clock,
        )
    }

    /// The member declines: `open` to `declined`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn decline(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            ConnectionRequestStatus::Open,
            ConnectionRequestStatus::Declined,
            clock,
        )
    }

    /// The introduction happened: `accepted` to `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances and [`SagaDomainError::InvalidTransition`] otherwise.
    pub fn complete(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        self.transition(
            ConnectionRequestStatus::Accepted,
            ConnectionRequestStatus::Completed,
            clock,
        )
    }

    /// Lapses unanswered: any live state to `expired`.
    ///
    /// # Errors
    ///
    /// Returns [`SagaDomainError::AlreadyTerminal`] for terminal
    /// instances.
    pub fn expire(&mut self, clock: &impl Clock) -> Result<(), SagaDomainError> {
        if self.status.is_terminal() {
            return Err(self.already_terminal());
        }
        self.status = ConnectionRequestStatus::Expired;
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
        from: ConnectionRequestStatus,
        to: ConnectionRequestStatus,
        clock: &impl Clock,
    ) -> Result<(), SagaDomainError> {
        if self.status.is_terminal() {
            return Err(self.already_terminal());
        }
        if self.status != from {
            return Err(SagaDomainError::InvalidTransition {
                entity: "connection_request",
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
            entity: "connection_request",
            id: self.id.into_inner(),
            status: self.status.as_str(),
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
