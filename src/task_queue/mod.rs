//! Leased, priority-ordered background task queue.
//!
//! Producers enqueue typed work derived from events; dispatchers poll for
//! due tasks and take per-row non-blocking leases so concurrent
//! dispatchers never double-claim. Claimed work is announced through the
//! event log for the owning worker type; failures retry with bounded
//! exponential backoff before landing in the dead-letter store. The
//! module follows hexagonal architecture:
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
