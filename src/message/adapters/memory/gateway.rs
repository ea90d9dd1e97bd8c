//! Recording delivery gateway for tests and dry runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::message::{
    domain::MessageId,
    ports::{DeliveryError, DeliveryGateway},
};

/// Gateway that records deliveries instead of sending them.
///
/// Failures can be staged ahead of time to exercise the orchestrator's
/// retry and withdrawal paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    deliveries: Vec<(MessageId, String)>,
    staged_failures: VecDeque<DeliveryError>,
}

impl RecordingGateway {
    /// Creates an empty recording gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a failure consumed by the next delivery attempt.
    pub fn stage_failure(&self, error: DeliveryError) {
        if let Ok(mut state) = self.state.lock() {
            state.staged_failures.push_back(error);
        }
    }

    /// Returns the recorded deliveries in send order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(MessageId, String)> {
        self.state
            .lock()
            .map(|state| state.deliveries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DeliveryGateway for RecordingGateway {
    async fn deliver(
        &self,
        message: &crate::message::domain::QueuedMessage,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let mut state = self
            .state
            .lock()
            .map_err(|err| DeliveryError::Transient(err.to_string()))?;
        if let Some(failure) = state.staged_failures.pop_front() {
            return Err(failure);
        }
        state.deliveries.push((message.id(), text.to_owned()));
        Ok(())
    }
}
