//! Unit tests for the priority ledger.

mod dormancy_tests;
mod upsert_tests;
