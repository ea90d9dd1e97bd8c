//! Durable, append-only event log with dead-letter capture.
//!
//! The log is the single integration point between engine components and
//! external producers. Events are written once and never mutated;
//! delivery to subscribed handlers is at-least-once, so every handler
//! must tolerate re-runs. Handlers that keep failing get their event
//! parked in a dead-letter store for operator inspection rather than
//! dropped. The module follows hexagonal architecture:
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
