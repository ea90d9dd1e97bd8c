//! Template rendering through an embedded MiniJinja environment.

use async_trait::async_trait;
use minijinja::Environment;

use crate::message::{
    domain::{MessageContent, QueuedMessage},
    ports::{ContentRenderer, RenderError, RenderOutcome},
};

/// Renderer that expands template content against its stored context.
///
/// Static content passes through untouched. This renderer has no view of
/// saga state, so it never reports staleness on its own; deployments
/// that need send-time freshness checks wrap it with a decorator that
/// consults the owning saga before delegating here.
#[derive(Debug, Default)]
pub struct MiniJinjaRenderer {
    environment: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer with a default MiniJinja environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentRenderer for MiniJinjaRenderer {
    async fn render(&self, message: &QueuedMessage) -> Result<RenderOutcome, RenderError> {
        match message.content() {
            MessageContent::Static { text } => Ok(RenderOutcome::Rendered(text.clone())),
            MessageContent::Template { template, context } => {
                let rendered = self
                    .environment
                    .render_str(template, context)
                    .map_err(|err| RenderError(err.to_string()))?;
                Ok(RenderOutcome::Rendered(rendered))
            }
        }
    }
}
