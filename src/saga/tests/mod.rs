//! Unit tests for the introduction sagas.

mod offer_tests;
mod opportunity_tests;
