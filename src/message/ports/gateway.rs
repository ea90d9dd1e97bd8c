//! Outbound delivery boundary.

use crate::message::domain::QueuedMessage;
use async_trait::async_trait;
use thiserror::Error;

/// Errors the delivery channel reports back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The channel is temporarily unavailable; the send will be retried.
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// The channel rejected the message for good; the send is withdrawn.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

/// Delivery channel boundary.
///
/// The concrete gateway (chat platform, SMS provider) lives outside the
/// engine; implementations receive the final rendered text and the full
/// message row for addressing and audit.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Delivers one rendered message.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Transient`] to request a retry or
    /// [`DeliveryError::Permanent`] to withdraw the message.
    async fn deliver(&self, message: &QueuedMessage, text: &str) -> Result<(), DeliveryError>;
}
