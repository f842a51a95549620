use pulldown_cmark::Options;
use serde::{Deserialize, Serialize};

/// How list items are wrapped by the list handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyle {
    /// Every item gets its own `<ul>`/`<ol>` wrapper inside the list wrapper.
    ///
    /// Matches the markup the chat front end has always produced.
    #[default]
    PerItem,
    /// One wrapper around all items.
    Single,
}

/// Rendering options for the Markdown pipeline.
///
/// Passed to [`super::Renderer::new`]; renderers with different options can
/// coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// GitHub-flavored syntax: tables, strikethrough, task lists.
    pub gfm: bool,
    /// Render soft line breaks as `<br />`.
    pub breaks: bool,
    /// Detect lists that directly follow paragraph text.
    pub smart_lists: bool,
    /// Typographic quotes, dashes and ellipses.
    pub smartypants: bool,
    /// Run the highlighter over code blocks.
    pub highlight: bool,
    /// Render raw HTML in the source as text.
    pub escape_raw_html: bool,
    pub list_style: ListStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: true,
            smart_lists: true,
            smartypants: true,
            highlight: true,
            escape_raw_html: true,
            list_style: ListStyle::PerItem,
        }
    }
}

impl RenderOptions {
    /// Parser extensions for these options.
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_GFM);
        }
        if self.smartypants {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }
}
