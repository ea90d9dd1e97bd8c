//! Unit tests for the credit ledger.

mod ledger_tests;
