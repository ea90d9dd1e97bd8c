//! Thread-safe in-memory saga adapters.

mod effects;
mod repository;

pub use effects::{RecordedEffect, RecordingEffects};
pub use repository::{
    InMemoryConnectionRequestRepository, InMemoryOfferRepository, InMemoryOpportunityRepository,
};
