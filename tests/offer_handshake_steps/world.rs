//! Shared world state for offer handshake BDD scenarios.

use std::sync::Arc;

use liaison::config::SagaConfig;
use liaison::saga::adapters::memory::{InMemoryOfferRepository, RecordingEffects};
use liaison::saga::domain::Offer;
use liaison::saga::services::OfferService;
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestOfferService = OfferService<InMemoryOfferRepository, RecordingEffects, DefaultClock>;

/// Scenario world for offer handshake behaviour tests.
pub struct OfferWorld {
    pub service: TestOfferService,
    pub effects: Arc<RecordingEffects>,
    pub offer: Option<Offer>,
}

impl OfferWorld {
    /// Creates a world with empty scenario state.
    #[must_use]
    pub fn new() -> Self {
        let effects = Arc::new(RecordingEffects::new());
        let service = OfferService::new(
            Arc::new(InMemoryOfferRepository::new()),
            Arc::clone(&effects),
            Arc::new(DefaultClock),
            SagaConfig::default(),
        );

        Self {
            service,
            effects,
            offer: None,
        }
    }
}

impl Default for OfferWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OfferWorld {
    OfferWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
