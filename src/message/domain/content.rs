//! Outbound message content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a queued message says.
///
/// Template content is rendered through the content renderer port; rows
/// flagged `requires_fresh_context` re-render immediately before send so
/// stale state never reaches the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Fixed text decided at enqueue time.
    Static {
        /// The text to deliver.
        text: String,
    },
    /// Template rendered against structured context.
    Template {
        /// Template source.
        template: String,
        /// Structured render context.
        context: Value,
    },
}

impl MessageContent {
    /// Creates static content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Static { text: text.into() }
    }

    /// Creates template content.
    #[must_use]
    pub fn template(template: impl Into<String>, context: Value) -> Self {
        Self::Template {
            template: template.into(),
            context,
        }
    }
}
