//! `PostgreSQL` adapter for the saga repositories.

mod models;
mod repository;
mod schema;

pub use repository::{
    PostgresConnectionRequestRepository, PostgresOfferRepository, PostgresOpportunityRepository,
    SagaPgPool,
};
