//! Liaison: asynchronous coordination engine for introduction-brokering
//! agent platforms.
//!
//! Many independent decision-making agents request research, match
//! experts, broker introductions, and pay out credits over a messaging
//! channel. This crate is the engine that lets them operate concurrently
//! on shared state without losing work, double-paying credits, or
//! double-sending messages: an append-only event log, a leased priority
//! task queue, a rate-limited message orchestrator, a per-user priority
//! ledger, a multi-variant introduction saga, and an idempotent credit
//! ledger. The agents' decision logic itself lives outside and talks to
//! the engine through events and tasks.
//!
//! # Architecture
//!
//! Every component follows hexagonal architecture:
//!
//! - **Domain**: pure business types and state machines
//! - **Ports**: abstract trait interfaces for persistence and delivery
//! - **Adapters**: in-memory and `PostgreSQL` implementations
//! - **Services**: orchestration over ports, injected with a clock
//!
//! Coordination correctness comes from per-row conditional claims and
//! deterministic idempotency keys, never from global locks or
//! cross-component transactions.
//!
//! # Modules
//!
//! - [`event_log`]: append-only event log with dead-letter capture
//! - [`task_queue`]: leased, priority-ordered background task queue
//! - [`message`]: rate-limited, sequence-aware outbound orchestration
//! - [`priority`]: per-user ranked ledger with dormancy tracking
//! - [`saga`]: multi-party introduction workflows
//! - [`credit`]: idempotent, append-only credit ledger
//! - [`scheduler`]: cooperative polling loops for dispatcher workers
//! - [`config`]: engine configuration
//! - [`identity`]: cross-cutting identifier newtypes

pub mod config;
pub mod credit;
pub mod event_log;
pub mod identity;
pub mod message;
pub mod priority;
pub mod saga;
pub mod scheduler;
pub mod task_queue;
