use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Parser, Tag, TagEnd, html};

use super::blocks::{Block, BlockRenderer, CodeBlock, HtmlBlocks, ListKind, render_block};
use super::escape::escape_plain_text;
use super::highlight::{AutoHighlighter, Highlighted, Highlighter};
use super::options::RenderOptions;
use super::smart_lists::separate_lists;

/// Markdown to HTML renderer for chat messages.
///
/// Holds only immutable configuration, so one instance can be shared and
/// every call to [`Renderer::render`] is independent of the previous ones.
#[derive(Clone)]
pub struct Renderer {
    options: RenderOptions,
    blocks: Arc<dyn BlockRenderer>,
    highlighter: Arc<dyn Highlighter>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl Renderer {
    /// Creates a renderer with the default block handlers and highlighter.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            blocks: Arc::new(HtmlBlocks::new(options.list_style)),
            highlighter: Arc::new(AutoHighlighter),
        }
    }

    /// Replaces the block handlers.
    #[must_use]
    pub fn with_blocks(mut self, blocks: impl BlockRenderer + 'static) -> Self {
        self.blocks = Arc::new(blocks);
        self
    }

    /// Replaces the code block highlighter.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Arc::new(highlighter);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders Markdown text to an HTML fragment.
    ///
    /// Never fails: if the pipeline panics on some input, the raw text is
    /// returned HTML-escaped with `<br>` line breaks. The process panic hook
    /// is not replaced, so it still reports the panic.
    pub fn render(&self, text: &str) -> String {
        match panic::catch_unwind(AssertUnwindSafe(|| self.render_markdown(text))) {
            Ok(html) => html,
            Err(_) => {
                tracing::warn!(len = text.len(), "markdown render failed, using escaped text");
                escape_plain_text(text)
            }
        }
    }

    fn render_markdown(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let source = if self.options.smart_lists {
            separate_lists(text)
        } else {
            Cow::Borrowed(text)
        };
        tracing::trace!(len = source.len(), "rendering markdown");

        let mut walker = BlockWalker::new(self);
        for event in Parser::new_ext(&source, self.options.parser_options()) {
            walker.push(event);
        }

        let mut html_output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut html_output, walker.finish().into_iter());
        html_output
    }

    fn highlight(&self, code: &CodeBlock) -> Highlighted {
        if self.options.highlight {
            self.highlighter
                .highlight(&code.raw_text, code.language.as_deref())
        } else {
            Highlighted::plain(&code.raw_text, code.language.as_deref())
        }
    }
}

/// A custom block whose events are being collected.
enum FrameKind<'a> {
    List { kind: ListKind, items: Vec<String> },
    Item,
    BlockQuote,
    Code { info: Option<CowStr<'a>> },
    Image { src: CowStr<'a>, title: CowStr<'a> },
}

struct Frame<'a> {
    kind: FrameKind<'a>,
    events: Vec<Event<'a>>,
}

/// Reduces custom blocks in an event stream to pre-rendered HTML events.
///
/// Everything else passes through for pulldown-cmark's HTML writer. Frames
/// always close on complete subtrees, so tables and other stateful default
/// output are never split across writer calls.
struct BlockWalker<'r, 'a> {
    renderer: &'r Renderer,
    stack: Vec<Frame<'a>>,
    root: Vec<Event<'a>>,
}

impl<'r, 'a> BlockWalker<'r, 'a> {
    fn new(renderer: &'r Renderer) -> Self {
        Self {
            renderer,
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    fn push(&mut self, event: Event<'a>) {
        let options = self.renderer.options;
        match event {
            Event::Start(Tag::List(start)) => {
                let kind = match start {
                    Some(start) => ListKind::Ordered { start },
                    None => ListKind::Unordered,
                };
                self.open(FrameKind::List {
                    kind,
                    items: Vec::new(),
                });
            }
            Event::Start(Tag::Item) => self.open(FrameKind::Item),
            Event::Start(Tag::BlockQuote(_)) => self.open(FrameKind::BlockQuote),
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => Some(info),
                    CodeBlockKind::Indented => None,
                };
                self.open(FrameKind::Code { info });
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => self.open(FrameKind::Image {
                src: dest_url,
                title,
            }),
            Event::End(
                TagEnd::List(_)
                | TagEnd::Item
                | TagEnd::BlockQuote(_)
                | TagEnd::CodeBlock
                | TagEnd::Image,
            ) => self.close(),
            Event::TaskListMarker(checked) => {
                // Item handlers recognize the literal token.
                let marker = Event::Text(if checked { "[x] " } else { "[ ] " }.into());
                // Loose items open their paragraph before the marker.
                if let Some(frame) = self.stack.last_mut()
                    && matches!(frame.kind, FrameKind::Item)
                    && matches!(frame.events.as_slice(), [Event::Start(Tag::Paragraph)])
                {
                    frame.events.insert(0, marker);
                } else {
                    self.emit(marker);
                }
            }
            Event::SoftBreak if options.breaks => self.emit(Event::HardBreak),
            Event::Html(raw) | Event::InlineHtml(raw) if options.escape_raw_html => {
                self.emit(Event::Text(raw));
            }
            other => self.emit(other),
        }
    }

    fn open(&mut self, kind: FrameKind<'a>) {
        self.stack.push(Frame {
            kind,
            events: Vec::new(),
        });
    }

    fn emit(&mut self, event: Event<'a>) {
        match self.stack.last_mut() {
            Some(frame) => frame.events.push(event),
            None => self.root.push(event),
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let renderer = self.renderer;
        let blocks = renderer.blocks.as_ref();

        let html = match frame.kind {
            FrameKind::List { kind, items } => render_block(
                blocks,
                Block::List {
                    kind,
                    items: &items,
                },
            ),
            FrameKind::Item => {
                let inner = inner_html(frame.events);
                let item = render_block(
                    blocks,
                    Block::ListItem {
                        text: inner.trim_end(),
                    },
                );
                if let Some(Frame {
                    kind: FrameKind::List { items, .. },
                    ..
                }) = self.stack.last_mut()
                {
                    items.push(item);
                    return;
                }
                item
            }
            FrameKind::BlockQuote => {
                let inner = inner_html(frame.events);
                render_block(blocks, Block::BlockQuote { text: &inner })
            }
            FrameKind::Code { info } => {
                let code = CodeBlock::new(info.as_deref(), plain_text(&frame.events));
                let highlighted = renderer.highlight(&code);
                render_block(
                    blocks,
                    Block::Code {
                        code: &code,
                        highlighted: &highlighted,
                    },
                )
            }
            FrameKind::Image { src, title } => {
                let alt = plain_text(&frame.events);
                render_block(
                    blocks,
                    Block::Image {
                        src: &src,
                        title: &title,
                        alt: &alt,
                    },
                )
            }
        };

        self.emit(Event::Html(html.into()));
    }

    fn finish(mut self) -> Vec<Event<'a>> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.root
    }
}

fn inner_html(events: Vec<Event<'_>>) -> String {
    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Concatenates the text content of events, ignoring markup.
fn plain_text(events: &[Event<'_>]) -> String {
    let mut out = String::new();
    for event in events {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::ListStyle;

    fn render(text: &str) -> String {
        Renderer::default().render(text)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_plain_text_keeps_text_and_breaks() {
        assert_eq!(render("hello there\nsecond line"), "<p>hello there<br />\nsecond line</p>\n");
    }

    #[test]
    fn test_soft_breaks_stay_when_breaks_off() {
        let renderer = Renderer::new(RenderOptions {
            breaks: false,
            ..Default::default()
        });
        assert_eq!(renderer.render("a\nb"), "<p>a\nb</p>\n");
    }

    #[test]
    fn test_unordered_list_two_items() {
        let html = render("- item1\n- item2");
        assert!(html.starts_with("<ul class=\"markdown-list\""));
        assert!(html.contains("<li class=\"markdown-list-item\">item1</li>"));
        assert!(html.contains("<li class=\"markdown-list-item\">item2</li>"));
        assert_eq!(html.matches("<li").count(), 2);
    }

    #[test]
    fn test_single_wrapper_list() {
        let renderer = Renderer::new(RenderOptions {
            list_style: ListStyle::Single,
            ..Default::default()
        });
        let html = renderer.render("1. first\n2. second");
        assert_eq!(html.matches("<ol").count(), 1);
        assert_eq!(html.matches("</ol>").count(), 1);
        assert_eq!(html.matches("<li").count(), 2);
    }

    #[test]
    fn test_nested_list_inside_item() {
        let renderer = Renderer::new(RenderOptions {
            list_style: ListStyle::Single,
            ..Default::default()
        });
        let html = renderer.render("- outer\n  - inner");
        assert_eq!(html.matches("<ul").count(), 2);
        let inner_pos = html.find("inner").unwrap();
        let outer_close = html.rfind("</ul>").unwrap();
        assert!(inner_pos < outer_close);
    }

    #[test]
    fn test_task_items() {
        let html = render("- [ ] buy milk\n- [x] done");
        assert!(html.contains("<input type=\"checkbox\" disabled> buy milk</li>"));
        assert!(html.contains("<input type=\"checkbox\" disabled checked> done</li>"));
    }

    #[test]
    fn test_loose_task_items() {
        let html = render("- [ ] buy milk\n\n- [x] done");
        assert!(html.contains("<input type=\"checkbox\" disabled> <p>buy milk</p></li>"));
        assert!(html.contains("<input type=\"checkbox\" disabled checked> <p>done</p></li>"));
        assert!(!html.contains("[ ]"));
        assert!(!html.contains("[x]"));
    }

    #[test]
    fn test_task_marker_ignored_without_gfm() {
        let renderer = Renderer::new(RenderOptions {
            gfm: false,
            ..Default::default()
        });
        // Without the task extension the token is still literal item text.
        let html = renderer.render("- [ ] buy milk");
        assert!(html.contains("<input type=\"checkbox\" disabled> buy milk"));
    }

    #[test]
    fn test_code_block_python() {
        let html = render("```python\nprint(\"a < b\", 'x')\n```");
        assert!(html.contains("<div class=\"language\">python"));
        assert!(html.contains("&lt;"));
        assert!(!html.contains("a < b\""));
        assert!(html.contains("writeText('print(&quot;a < b&quot;, \\'x\\')');"));
    }

    #[test]
    fn test_code_block_without_language_is_plaintext() {
        let html = render("```\nhello world\n```");
        assert!(html.contains("<div class=\"language\">plaintext"));
        assert!(html.contains("<code class=\"code\">hello world</code>"));
    }

    #[test]
    fn test_indented_code_block() {
        let html = render("para\n\n    let x = 1;\n");
        assert!(html.contains("class=\"code-block\""));
        assert!(html.contains("<code class=\"code hljs language-"));
    }

    #[test]
    fn test_code_block_inside_list_item() {
        let html = render("- item\n\n  ```\n  a & b\n  ```");
        let item = html.find("<li class=\"markdown-list-item\">").unwrap();
        let code = html.find("<div class=\"code-block\">").unwrap();
        let item_end = html.find("</li>").unwrap();
        assert!(item < code && code < item_end);
        assert!(html.contains("writeText('a &amp; b');"));
        assert!(html.contains(">a &amp; b</code>"));
    }

    #[test]
    fn test_code_block_inside_block_quote() {
        let html = render("> ```\n> x\n> ```");
        let quote = html.find("<blockquote class=\"markdown-quote\">").unwrap();
        let code = html.find("<div class=\"code-block\">").unwrap();
        let quote_end = html.find("</blockquote>").unwrap();
        assert!(quote < code && code < quote_end);
        assert!(html.contains("writeText('x');"));
    }

    #[test]
    fn test_highlight_off_escapes_only() {
        let renderer = Renderer::new(RenderOptions {
            highlight: false,
            ..Default::default()
        });
        let html = renderer.render("```python\nif a < b: pass\n```");
        assert!(html.contains("<code class=\"code hljs language-python\">if a &lt; b: pass</code>"));
        assert!(!html.contains("hljs-keyword"));
    }

    #[test]
    fn test_custom_highlighter() {
        struct Shout;
        impl Highlighter for Shout {
            fn highlight(&self, code: &str, _language: Option<&str>) -> Highlighted {
                Highlighted::plain(&code.to_uppercase(), None)
            }
        }
        let html = Renderer::default().with_highlighter(Shout).render("```\nquiet\n```");
        assert!(html.contains(">QUIET</code>"));
        assert!(html.contains("writeText('quiet');"));
    }

    #[test]
    fn test_block_quote() {
        let html = render("> quoted text");
        assert_eq!(html, "<blockquote class=\"markdown-quote\"><p>quoted text</p>\n</blockquote>\n");
    }

    #[test]
    fn test_image() {
        let html = render("![alt text](http://example.com/a.png)");
        assert!(html.contains(
            "<img src=\"http://example.com/a.png\" alt=\"alt text\" class=\"markdown-image\"/>"
        ));
    }

    #[test]
    fn test_image_alt_drops_markup() {
        let html = render("![**bold** `code`](a.png)");
        assert!(html.contains("alt=\"bold code\""));
    }

    #[test]
    fn test_links_use_default_markup() {
        let html = render("[site](https://example.com)");
        assert_eq!(html, "<p><a href=\"https://example.com\">site</a></p>\n");
    }

    #[test]
    fn test_tables_use_default_markup() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_image_inside_table_keeps_body_cells() {
        let html = render("| A |\n|---|\n| ![x](x.png) |");
        assert!(html.contains("<td><img src=\"x.png\""));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_raw_html_passes_when_allowed() {
        let renderer = Renderer::new(RenderOptions {
            escape_raw_html: false,
            ..Default::default()
        });
        assert!(renderer.render("hi <b>x</b>").contains("<b>x</b>"));
    }

    #[test]
    fn test_smart_punctuation() {
        let html = render("\"quoted\" -- done...");
        assert!(html.contains('\u{201c}'));
        assert!(html.contains('\u{2013}'));
        assert!(html.contains('\u{2026}'));
    }

    #[test]
    fn test_smart_lists_split_glued_ordered_list() {
        let html = render("Steps:\n2. build\n3. run");
        assert!(html.contains("<p>Steps:</p>"));
        assert!(html.contains("start=\"2\""));
    }

    #[test]
    fn test_smart_lists_keep_setext_heading() {
        assert_eq!(render("Title\n-"), "<h2>Title</h2>\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let input = "# Title\n\n- [x] a\n- b\n\n```rust\nfn main() {}\n```\n\n> q\n\n![i](i.png)";
        let renderer = Renderer::default();
        assert_eq!(renderer.render(input), renderer.render(input));
    }

    #[test]
    fn test_panicking_handler_falls_back_to_escaped_text() {
        struct Broken;
        impl BlockRenderer for Broken {
            fn block_quote(&self, _text: &str) -> String {
                panic!("broken handler");
            }
        }
        let html = Renderer::default().with_blocks(Broken).render("> <x>\nnext");
        assert_eq!(html, "&gt; &lt;x&gt;<br>\nnext");
    }

    #[test]
    fn test_renderer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Renderer>();
    }
}
