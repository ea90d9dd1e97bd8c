//! Step definitions for offer handshake BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
