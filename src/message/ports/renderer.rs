//! Send-time content rendering boundary.

use crate::message::domain::QueuedMessage;
use async_trait::async_trait;
use thiserror::Error;

/// Result of rendering a message immediately before send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Content rendered; deliver this text.
    Rendered(String),
    /// The underlying context resolved through another path; the send
    /// must be withdrawn instead of delivering stale content.
    Stale {
        /// Why the content is no longer deliverable.
        reason: String,
    },
}

/// Error raised when rendering itself fails.
///
/// Treated as transient: the message returns to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render failure: {0}")]
pub struct RenderError(
    /// What the template engine reported.
    pub String,
);

/// Content renderer boundary.
///
/// Rows flagged `requires_fresh_context` are rendered through this port
/// at dispatch time, never at enqueue time, so resolved opportunities or
/// stale state cannot reach the user.
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    /// Renders the message content to deliverable text.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the template engine fails.
    async fn render(&self, message: &QueuedMessage) -> Result<RenderOutcome, RenderError>;
}
