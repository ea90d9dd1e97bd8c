//! Typed task payloads.
//!
//! Each background work kind the engine schedules is a variant here,
//! validated at the enqueue boundary so workers pattern-match
//! exhaustively. External agent work uses the tagged
//! [`TaskPayload::Custom`] escape hatch.

use crate::identity::UserId;
use crate::priority::domain::PriorityItemId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Tagged union of all background task payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    /// Research a subject on behalf of a member.
    ResearchRequest {
        /// Member the research is for.
        user_id: UserId,
        /// What to research.
        topic: String,
    },
    /// Find candidate connectors for an open opportunity.
    ProspectMatch {
        /// The opportunity to match.
        opportunity_id: Uuid,
    },
    /// Remind a connector to confirm an accepted offer. Scheduled once
    /// per offer.
    OfferReminder {
        /// The unconfirmed offer.
        offer_id: Uuid,
    },
    /// Sweep saga instances past their expiry deadlines.
    SagaExpirySweep,
    /// Compose a re-engagement message around a priority item.
    ComposeReengagement {
        /// Member to re-engage.
        user_id: UserId,
        /// The item to surface.
        priority_item_id: PriorityItemId,
    },
    /// Agent-defined work from outside the engine.
    Custom {
        /// Producer-chosen payload tag.
        kind: String,
        /// Structured payload body.
        data: Value,
    },
}

impl TaskPayload {
    /// Returns the task type tag used for storage and routing.
    #[must_use]
    pub fn task_type(&self) -> &str {
        match self {
            Self::ResearchRequest { .. } => "research_request",
            Self::ProspectMatch { .. } => "prospect_match",
            Self::OfferReminder { .. } => "offer_reminder",
            Self::SagaExpirySweep => "saga_expiry_sweep",
            Self::ComposeReengagement { .. } => "compose_reengagement",
            Self::Custom { kind, .. } => kind.as_str(),
        }
    }
}
