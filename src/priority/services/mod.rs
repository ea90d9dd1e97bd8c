//! Application services for the priority ledger.

mod ledger;

pub use ledger::{
    PriorityLedgerService, PriorityServiceError, PriorityServiceResult, UpsertOutcome,
    UpsertPriorityRequest,
};
