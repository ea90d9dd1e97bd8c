//! Typed event payloads.
//!
//! Every event type the engine produces or consumes is a variant here,
//! validated at the boundary so handlers can pattern-match exhaustively
//! instead of trusting untyped fields. Producers outside the engine use
//! the [`EventPayload::Custom`] escape hatch, which still carries a tag.

use crate::identity::{AgentKind, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Tagged union of all event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A claimed task is ready for its owning worker type.
    TaskReady {
        /// The claimed task.
        task_id: Uuid,
        /// Tag of the task payload variant.
        task_type: String,
        /// Worker type that must execute the task.
        agent_type: AgentKind,
    },
    /// A task finished successfully.
    TaskCompleted {
        /// The completed task.
        task_id: Uuid,
    },
    /// A task attempt failed.
    TaskFailed {
        /// The failed task.
        task_id: Uuid,
        /// Error recorded for the attempt.
        error: String,
        /// Whether another attempt is scheduled.
        will_retry: bool,
    },
    /// An outbound message was handed to the delivery gateway.
    MessageSent {
        /// The delivered message.
        message_id: Uuid,
        /// Recipient.
        user_id: UserId,
    },
    /// A queued message was replaced before sending.
    MessageSuperseded {
        /// The replaced message.
        message_id: Uuid,
        /// The replacement message.
        superseded_by: Uuid,
        /// Operator-readable reason.
        reason: String,
    },
    /// A connector was offered a prospect to introduce.
    OpportunityOpened {
        /// The opportunity instance.
        opportunity_id: Uuid,
        /// The connector being asked.
        connector_id: UserId,
        /// Display name of the prospect.
        subject: String,
    },
    /// The connector accepted an opportunity.
    OpportunityAccepted {
        /// The accepted opportunity.
        opportunity_id: Uuid,
    },
    /// The connector declined an opportunity.
    OpportunityDeclined {
        /// The declined opportunity.
        opportunity_id: Uuid,
    },
    /// An accepted opportunity completed; bounty is due.
    OpportunityCompleted {
        /// The completed opportunity.
        opportunity_id: Uuid,
        /// Bounty owed to the connector, in credit units.
        bounty: i64,
    },
    /// An opportunity expired without completion.
    OpportunityExpired {
        /// The expired opportunity.
        opportunity_id: Uuid,
    },
    /// A third party asked to be introduced to a member.
    ConnectionRequestOpened {
        /// The request instance.
        request_id: Uuid,
        /// The member being asked for.
        target_id: UserId,
    },
    /// A connection request reached its terminal resolution.
    ConnectionRequestResolved {
        /// The resolved request.
        request_id: Uuid,
        /// Whether the member accepted.
        accepted: bool,
    },
    /// An accepted connection request completed; bounty is due.
    ConnectionRequestCompleted {
        /// The completed request.
        request_id: Uuid,
        /// Bounty owed to the member, in credit units.
        bounty: i64,
    },
    /// An offer entered the two-step handshake.
    OfferCreated {
        /// The offer instance.
        offer_id: Uuid,
        /// The person being offered an introduction.
        introducee_id: UserId,
        /// The facilitating connector.
        connector_id: UserId,
        /// Bounty at stake, in credit units.
        bounty: i64,
    },
    /// The introducee accepted; awaiting connector confirmation.
    OfferIntroduceeAccepted {
        /// The accepted offer.
        offer_id: Uuid,
    },
    /// The introducee declined the offer.
    OfferIntroduceeDeclined {
        /// The declined offer.
        offer_id: Uuid,
    },
    /// The connector confirmed; the offer completed.
    OfferConfirmed {
        /// The confirmed offer.
        offer_id: Uuid,
    },
    /// An accepted offer ran out both grace periods unconfirmed.
    OfferExpired {
        /// The expired offer.
        offer_id: Uuid,
    },
    /// A bounty landed in the credit ledger.
    CreditAwarded {
        /// The credited account.
        user_id: UserId,
        /// Signed amount in credit units.
        amount: i64,
        /// The saga instance the award references.
        reference_id: Uuid,
    },
    /// Producer-defined payload from outside the engine.
    Custom {
        /// Producer-chosen payload tag.
        kind: String,
        /// Structured payload body.
        data: Value,
    },
}

impl EventPayload {
    /// Returns the event type tag used for storage and filtering.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::TaskReady { .. } => "task.ready",
            Self::TaskCompleted { .. } => "task.completed",
            Self::TaskFailed { .. } => "task.failed",
            Self::MessageSent { .. } => "message.sent",
            Self::MessageSuperseded { .. } => "message.superseded",
            Self::OpportunityOpened { .. } => "opportunity.opened",
            Self::OpportunityAccepted { .. } => "opportunity.accepted",
            Self::OpportunityDeclined { .. } => "opportunity.declined",
            Self::OpportunityCompleted { .. } => "opportunity.completed",
            Self::OpportunityExpired { .. } => "opportunity.expired",
            Self::ConnectionRequestOpened { .. } => "connection_request.opened",
            Self::ConnectionRequestResolved { .. } => "connection_request.resolved",
            Self::ConnectionRequestCompleted { .. } => "connection_request.completed",
            Self::OfferCreated { .. } => "offer.created",
            Self::OfferIntroduceeAccepted { .. } => "offer.introducee_accepted",
            Self::OfferIntroduceeDeclined { .. } => "offer.introducee_declined",
            Self::OfferConfirmed { .. } => "offer.confirmed",
            Self::OfferExpired { .. } => "offer.expired",
            Self::CreditAwarded { .. } => "credit.awarded",
            Self::Custom { kind, .. } => kind.as_str(),
        }
    }
}
