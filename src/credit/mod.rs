//! Append-only, idempotent credit ledger.
//!
//! Bounty awards and manual adjustments land here as immutable ledger
//! lines. A deterministic idempotency key derived from the event type and
//! reference entity makes duplicate appends a safe no-op, which is what
//! allows saga completion to run under at-least-once event redelivery.
//! The module follows hexagonal architecture:
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
