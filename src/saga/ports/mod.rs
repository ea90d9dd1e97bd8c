//! Port contracts for the introduction sagas.

mod effects;
mod repository;

pub use effects::{EffectError, PriorityDerivation, SagaEffects};
pub use repository::{
    ConnectionRequestRepository, OfferRepository, OpportunityRepository, SagaRepositoryError,
    SagaRepositoryResult,
};
