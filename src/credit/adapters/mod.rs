//! Adapter implementations of the credit ledger ports.

pub mod memory;
pub mod postgres;
