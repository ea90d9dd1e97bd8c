//! Port contracts for the credit ledger.

mod repository;

pub use repository::{
    CreditBalance, CreditLedgerRepository, CreditLedgerRepositoryError, CreditLedgerResult,
};
