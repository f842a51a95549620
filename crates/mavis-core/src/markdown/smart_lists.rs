//! Smart list detection.
//!
//! CommonMark only lets a bullet list or an ordered list starting at 1
//! interrupt a paragraph. Chat text often has lists glued to the sentence
//! before them ("Steps:\n2. run it"), so this pre-pass inserts the blank
//! line the parser needs.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

// A marker needs item text; a bare `-` under a line is a setext underline.
static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:[-*+]|\d{1,9}[.)])[ \t]+\S").expect("list marker regex is valid")
});

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").expect("fence regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Paragraph,
    Other,
}

/// Inserts a blank line before list markers that directly follow paragraph
/// text outside of a list. Fenced code is left untouched.
pub fn separate_lists(text: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(text.len() + 16);
    let mut changed = false;
    let mut fence: Option<String> = None;
    let mut in_list = false;
    let mut prev = LineKind::Blank;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some(marker) = &fence {
            if content.trim_start().starts_with(marker.as_str()) {
                fence = None;
            }
            out.push_str(line);
            prev = LineKind::Other;
            continue;
        }

        if let Some(caps) = FENCE_OPEN.captures(content) {
            fence = Some(caps[1].to_string());
            out.push_str(line);
            prev = LineKind::Other;
            continue;
        }

        if content.trim().is_empty() {
            out.push_str(line);
            prev = LineKind::Blank;
            continue;
        }

        if LIST_MARKER.is_match(content) {
            if !in_list && prev == LineKind::Paragraph {
                out.push('\n');
                changed = true;
            }
            in_list = true;
            out.push_str(line);
            prev = LineKind::Other;
            continue;
        }

        let indented = content.starts_with([' ', '\t']);
        if prev == LineKind::Blank && !indented {
            in_list = false;
        }

        let trimmed = content.trim_start();
        prev = if trimmed.starts_with(['#', '>', '|']) {
            LineKind::Other
        } else {
            LineKind::Paragraph
        };
        out.push_str(line);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}
