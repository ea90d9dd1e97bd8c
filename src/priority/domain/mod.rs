//! Domain model for the priority ledger.

mod error;
mod ids;
mod item;
mod score;

pub use error::PriorityDomainError;
pub use ids::PriorityItemId;
pub use item::{
    ItemSummary, PersistedPriorityItemData, PriorityItem, PriorityItemType, PriorityKey,
    PriorityStatus, DORMANCY_THRESHOLD,
};
pub use score::{Score, ScoreInputs};
