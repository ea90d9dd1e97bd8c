//! Per-user priority ledger with presentation and dormancy tracking.
//!
//! Events and tasks derive actionable items (an opportunity to surface, a
//! pending connection request) into a ranked per-user queue. Message
//! composition reads the queue; items that have been surfaced twice with
//! no user action go dormant until a fresh signal arrives. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
