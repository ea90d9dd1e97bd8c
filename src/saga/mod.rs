//! Multi-party introduction workflows.
//!
//! Three saga variants share one shape: a primary subject, a
//! facilitating party, a bounty, a status machine, and an expiry.
//! Completion applies a unit of side effects (priority item actioned,
//! rival opportunities expired, bounty credited, close-loop messages
//! queued) whose pieces are individually idempotent, so redelivered
//! completion events resolve to no-ops. The module follows hexagonal
//! architecture:
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
