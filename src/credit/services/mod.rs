//! Application services for the credit ledger.

mod ledger;

pub use ledger::{
    AppendCreditRequest, CreditAppend, CreditLedgerService, CreditServiceError,
    CreditServiceResult,
};
