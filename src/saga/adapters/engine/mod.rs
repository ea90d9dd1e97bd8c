//! Effects adapter wired to the real engine services.

mod effects;

pub use effects::EngineEffects;
