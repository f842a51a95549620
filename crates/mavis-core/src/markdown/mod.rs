//! Markdown rendering for chat messages.
//!
//! This module provides:
//! - `Renderer`: Markdown to HTML with custom list, task, code, quote and
//!   image markup for the chat transcript
//! - `BlockRenderer`: per-block handlers, overridable one at a time
//! - `Highlighter`: code block highlighting hook
//! - escaping helpers for HTML content and inline script literals
//!
//! Uses pulldown-cmark for parsing. Falls back to escaped plain text if
//! rendering fails.

mod blocks;
mod escape;
mod highlight;
mod options;
mod render;
mod smart_lists;

pub use blocks::{Block, BlockRenderer, CodeBlock, HtmlBlocks, ListKind, render_block};
pub use escape::{escape_html, escape_plain_text, escape_script_literal};
pub use highlight::{AutoHighlighter, Highlighted, Highlighter};
pub use options::{ListStyle, RenderOptions};
pub use render::Renderer;
pub use smart_lists::separate_lists;

/// Renders Markdown with default options.
pub fn render(text: &str) -> String {
    Renderer::default().render(text)
}
