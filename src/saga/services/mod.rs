//! Application services for the introduction sagas.

mod connection_request;
mod offer;
mod opportunity;
mod shared;

pub use connection_request::{ConnectionRequestService, OpenConnectionRequest};
pub use offer::{CreateOfferRequest, OfferService};
pub use opportunity::{OpenOpportunityRequest, OpportunityService};
pub use shared::{SagaServiceError, SagaServiceResult};
