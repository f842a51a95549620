//! Block-level intermediate representation and HTML handlers.
//!
//! The event walk in `render` reduces each custom block to a [`Block`] and
//! hands it to a [`BlockRenderer`]. Inner content arrives already rendered,
//! so handlers only wrap it.

use super::escape::{escape_html, escape_script_literal};
use super::highlight::Highlighted;
use super::options::ListStyle;

/// Ordered or unordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered { start: u64 },
}

impl ListKind {
    pub fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered { .. } => "ol",
        }
    }
}

/// A fenced or indented code block, before any escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the fence info string.
    pub language: Option<String>,
    pub raw_text: String,
}

impl CodeBlock {
    /// Builds a code block from a fence info string and collected text.
    ///
    /// The final line terminator is not part of the source.
    pub fn new(info: Option<&str>, mut raw_text: String) -> Self {
        if raw_text.ends_with('\n') {
            raw_text.pop();
            if raw_text.ends_with('\r') {
                raw_text.pop();
            }
        }
        let language = info
            .and_then(|info| info.split_whitespace().next())
            .map(str::to_string);
        Self { language, raw_text }
    }

    /// Label shown above the block.
    pub fn label(&self) -> &str {
        self.language.as_deref().unwrap_or("plaintext")
    }
}

/// One custom block, ready to be turned into HTML.
#[derive(Debug, Clone, Copy)]
pub enum Block<'a> {
    /// Items hold the output of [`BlockRenderer::list_item`].
    List { kind: ListKind, items: &'a [String] },
    /// `text` is the item's rendered inner HTML.
    ListItem { text: &'a str },
    Code {
        code: &'a CodeBlock,
        highlighted: &'a Highlighted,
    },
    /// `text` is the quote's rendered inner HTML.
    BlockQuote { text: &'a str },
    /// `alt` is the plain text of the image description.
    Image {
        src: &'a str,
        title: &'a str,
        alt: &'a str,
    },
}

/// One handler per custom block kind.
///
/// Every method has a default producing the chat front end's markup, so an
/// implementation overrides only the blocks it restyles.
pub trait BlockRenderer: Send + Sync {
    fn list_style(&self) -> ListStyle {
        ListStyle::PerItem
    }

    fn list(&self, kind: ListKind, items: &[String]) -> String {
        render_list(kind, items, self.list_style())
    }

    fn list_item(&self, text: &str) -> String {
        render_list_item(text)
    }

    fn code(&self, code: &CodeBlock, highlighted: &Highlighted) -> String {
        render_code(code, highlighted)
    }

    fn block_quote(&self, text: &str) -> String {
        format!("<blockquote class=\"markdown-quote\">{text}</blockquote>\n")
    }

    fn image(&self, src: &str, title: &str, alt: &str) -> String {
        render_image(src, title, alt)
    }
}

/// Dispatches a block to its handler.
pub fn render_block<R: BlockRenderer + ?Sized>(renderer: &R, block: Block<'_>) -> String {
    match block {
        Block::List { kind, items } => renderer.list(kind, items),
        Block::ListItem { text } => renderer.list_item(text),
        Block::Code { code, highlighted } => renderer.code(code, highlighted),
        Block::BlockQuote { text } => renderer.block_quote(text),
        Block::Image { src, title, alt } => renderer.image(src, title, alt),
    }
}

/// The default handlers, parameterized by list wrapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlBlocks {
    pub list_style: ListStyle,
}

impl HtmlBlocks {
    pub fn new(list_style: ListStyle) -> Self {
        Self { list_style }
    }
}

impl BlockRenderer for HtmlBlocks {
    fn list_style(&self) -> ListStyle {
        self.list_style
    }
}

fn render_list(kind: ListKind, items: &[String], style: ListStyle) -> String {
    let tag = kind.tag();
    let start = match kind {
        ListKind::Ordered { start } if start != 1 => format!(" start=\"{start}\""),
        _ => String::new(),
    };

    let mut out = format!("<{tag} class=\"markdown-list\" style=\"margin: 10px;\"{start}>");
    match style {
        ListStyle::PerItem => {
            for item in items {
                out.push_str(&format!("<{tag} style=\"margin: 10px; \">{item}</{tag}>"));
            }
        }
        ListStyle::Single => {
            out.push('\n');
            for item in items {
                out.push_str(item);
            }
        }
    }
    out.push_str(&format!("</{tag}>\n"));
    out
}

fn render_list_item(text: &str) -> String {
    let task = if let Some(rest) = text.strip_prefix("[ ]") {
        Some(("", rest))
    } else {
        text.strip_prefix("[x]").map(|rest| (" checked", rest))
    };

    match task {
        Some((checked, rest)) => format!(
            "<li class=\"markdown-task\"><input type=\"checkbox\" disabled{checked}> {}</li>\n",
            rest.trim_start()
        ),
        None => format!("<li class=\"markdown-list-item\">{text}</li>\n"),
    }
}

const COPY_ICON: &str = "<i class=\"fas fa-copy\"></i>";
const COLLAPSE_ICON: &str = "<i class=\"fas fa-chevron-up\"></i>";

fn render_code(code: &CodeBlock, highlighted: &Highlighted) -> String {
    let label = escape_html(code.label());
    let literal = escape_script_literal(&code.raw_text);
    let class = match &highlighted.language {
        Some(lang) => format!("code hljs language-{}", escape_html(lang)),
        None => "code".to_string(),
    };
    let copy_button = format!(
        "<button class=\"copy-btn\" onclick=\"navigator.clipboard.writeText('{literal}');\">\n\
         {COPY_ICON}\n\
         </button>"
    );

    format!(
        "<div class=\"code-block\">\n\
         <div style=\"display: flex; justify-content: space-between; align-items: center;\">\n\
         <div class=\"language\">{label}\n\
         {copy_button}\n\
         </div>\n\
         </div>\n\
         <div class=\"code-content\">\n\
         <pre><code class=\"{class}\">{markup}</code></pre>\n\
         </div>\n\
         <div class=\"language\">\n\
         <button class=\"collapse-btn\" onclick=\"toggleCollapse(this)\">\n\
         {COLLAPSE_ICON}\n\
         </button>\n\
         {copy_button}\n\
         </div>\n\
         </div>\n",
        markup = highlighted.markup,
    )
}

fn render_image(src: &str, title: &str, alt: &str) -> String {
    let title = if title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_html(title))
    };
    format!(
        "<img src=\"{}\" alt=\"{}\"{title} class=\"markdown-image\"/>\n",
        escape_html(src),
        escape_html(alt)
    )
}
