//! Escaping routines for embedding source text in generated HTML.
//!
//! Two contexts are covered and they are not interchangeable:
//! - [`escape_html`] for element content and attribute values
//! - [`escape_script_literal`] for a single-quoted JavaScript string literal
//!   that itself sits inside a double-quoted `onclick` attribute

/// Escapes text for use as HTML element content or a quoted attribute value.
///
/// Replaces `&`, `<`, `>`, `"` and `'` with their entities.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text as the body of a single-quoted script literal placed in a
/// double-quoted HTML attribute, e.g. `onclick="f('...')"`.
///
/// Backslash, single quote, newline and carriage return get JavaScript
/// escapes. Double quote becomes `&quot;` so the attribute stays closed, and
/// `&` becomes `&amp;` so the attribute decodes back to the original text.
pub fn escape_script_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("&quot;"),
            '&' => out.push_str("&amp;"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text and turns line breaks into `<br>`.
///
/// Used for the degraded output when the Markdown pipeline cannot render.
pub fn escape_plain_text(text: &str) -> String {
    escape_html(text)
        .replace("\r\n", "\n")
        .replace('\n', "<br>\n")
}
