//! Rate-limited, sequence-aware outbound message orchestration.
//!
//! Queued messages leave through a delivery gateway under per-user daily
//! and hourly budgets, with quiet-hour deferral in the recipient's local
//! time. Multi-part sequences deliver strictly in order or not at all,
//! newer messages supersede stale queued ones without destroying the
//! audit trail, and content flagged fresh is re-rendered at send time.
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
