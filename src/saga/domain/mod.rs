//! Domain model for the introduction sagas.

mod connection_request;
mod error;
mod ids;
mod offer;
mod opportunity;
mod subject;

pub use connection_request::{
    ConnectionRequest, ConnectionRequestStatus, NewConnectionRequest,
    PersistedConnectionRequestData,
};
pub use error::SagaDomainError;
pub use ids::{ConnectionRequestId, OfferId, OpportunityId};
pub use offer::{NewOffer, Offer, OfferStatus, PersistedOfferData};
pub use opportunity::{NewOpportunity, Opportunity, OpportunityStatus, PersistedOpportunityData};
pub use subject::{Bounty, SubjectName};
