//! MiniJinja-backed content renderer.

mod renderer;

pub use renderer::MiniJinjaRenderer;
