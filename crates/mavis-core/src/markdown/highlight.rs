//! Code block highlighting hook.
//!
//! The pipeline calls a [`Highlighter`] once per code block and embeds the
//! returned markup inside `<pre><code>`. The built-in [`AutoHighlighter`]
//! runs syntect grammars and emits `hljs-` prefixed class spans so the page
//! stylesheet can color them; all source text stays escaped.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::escape::escape_html;

/// Output of a highlighter for one code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    /// Language used for highlighting, explicit or detected.
    pub language: Option<String>,
    /// Markup embedded as the code element's content. All source text in it
    /// must already be HTML-escaped.
    pub markup: String,
}

impl Highlighted {
    /// Escaped source with no highlighting.
    pub fn plain(code: &str, language: Option<&str>) -> Self {
        Self {
            language: language.map(str::to_string),
            markup: escape_html(code),
        }
    }
}

pub trait Highlighter: Send + Sync {
    /// Highlights `code`. `language` is the fence tag, if any.
    fn highlight(&self, code: &str, language: Option<&str>) -> Highlighted;
}

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

/// Detection data for languages common in chat answers.
struct LanguageDef {
    name: &'static str,
    aliases: &'static [&'static str],
    /// Token syntect resolves to a grammar.
    syntax: &'static str,
    keywords: &'static [&'static str],
    /// Substrings that strongly suggest the language.
    hints: &'static [&'static str],
    case_insensitive: bool,
}

const LANGUAGES: &[LanguageDef] = &[
    LanguageDef {
        name: "python",
        aliases: &["py", "python3"],
        syntax: "py",
        keywords: &[
            "def", "class", "import", "from", "return", "if", "elif", "else", "for", "while",
            "in", "not", "and", "or", "is", "None", "True", "False", "with", "as", "try",
            "except", "finally", "raise", "lambda", "yield", "pass", "self",
        ],
        hints: &["def ", "elif ", "import ", "print(", "self.", "__init__"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "rust",
        aliases: &["rs"],
        syntax: "rs",
        keywords: &[
            "fn", "let", "mut", "impl", "struct", "enum", "trait", "pub", "use", "mod", "match",
            "if", "else", "for", "while", "loop", "return", "self", "Self", "crate", "where",
            "async", "await", "move", "ref", "const", "static", "true", "false",
        ],
        hints: &["fn ", "let mut ", "impl ", "::", "println!", "-> "],
        case_insensitive: false,
    },
    LanguageDef {
        name: "javascript",
        aliases: &["js", "jsx", "node"],
        syntax: "js",
        keywords: &[
            "function", "const", "let", "var", "return", "if", "else", "for", "while", "new",
            "class", "this", "async", "await", "import", "export", "from", "null", "undefined",
            "true", "false", "typeof",
        ],
        hints: &["function ", "const ", "=> ", "console.", "document.", "===", "require("],
        case_insensitive: false,
    },
    // No TypeScript grammar ships with syntect; the JavaScript one is close.
    LanguageDef {
        name: "typescript",
        aliases: &["ts", "tsx"],
        syntax: "js",
        keywords: &[
            "function", "const", "let", "return", "if", "else", "interface", "type", "class",
            "implements", "extends", "export", "import", "from", "readonly", "enum",
            "string", "number", "boolean", "async", "await",
        ],
        hints: &["interface ", ": string", ": number", "readonly ", "as const"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "go",
        aliases: &["golang"],
        syntax: "go",
        keywords: &[
            "func", "package", "import", "var", "const", "type", "struct", "interface", "return",
            "if", "else", "for", "range", "go", "defer", "chan", "select", "nil", "map",
        ],
        hints: &["func ", "package ", ":= ", "fmt.", "go func"],
        case_insensitive: false,
    },
    LanguageDef {
        name: "bash",
        aliases: &["sh", "shell", "zsh", "console"],
        syntax: "sh",
        keywords: &[
            "if", "then", "else", "fi", "for", "do", "done", "while", "case", "esac", "echo",
            "export", "function", "local", "return", "cd", "sudo",
        ],
        hints: &["#!/bin/", "echo ", "sudo ", "$HOME", " | grep", "apt-get", "&& "],
        case_insensitive: false,
    },
    LanguageDef {
        name: "sql",
        aliases: &["postgres", "mysql", "sqlite"],
        syntax: "sql",
        keywords: &[
            "select", "from", "where", "insert", "into", "values", "update", "set", "delete",
            "create", "table", "join", "on", "group", "by", "order", "and", "or", "not", "null",
            "as", "limit",
        ],
        hints: &["SELECT ", "FROM ", "WHERE ", "INSERT INTO", "CREATE TABLE"],
        case_insensitive: true,
    },
];

fn find_language(tag: &str) -> Option<&'static LanguageDef> {
    let tag = tag.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|def| def.name == tag || def.aliases.contains(&tag.as_str()))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits text into alternating word and non-word runs.
fn tokens(code: &str) -> impl Iterator<Item = &str> {
    let mut rest = code;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let word = is_word_char(first);
        let end = rest
            .char_indices()
            .find(|&(_, c)| is_word_char(c) != word)
            .map_or(rest.len(), |(i, _)| i);
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

impl LanguageDef {
    fn is_keyword(&self, word: &str) -> bool {
        if self.case_insensitive {
            self.keywords.iter().any(|k| k.eq_ignore_ascii_case(word))
        } else {
            self.keywords.contains(&word)
        }
    }

    fn score(&self, code: &str) -> usize {
        let keyword_hits = tokens(code).filter(|t| self.is_keyword(t)).count();
        let hint_hits = self.hints.iter().filter(|h| code.contains(*h)).count();
        keyword_hits + hint_hits * 3
    }

    fn grammar(&self) -> Option<&'static SyntaxReference> {
        SYNTAX_SET.find_syntax_by_token(self.syntax)
    }
}

/// Class name for a grammar found without a table entry: the lowercased
/// grammar name when it is a single word, else its first file extension.
fn language_class(syntax: &SyntaxReference) -> String {
    let name = syntax.name.to_ascii_lowercase();
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-'))
    {
        return name;
    }
    syntax.file_extensions.first().cloned().unwrap_or(name)
}

fn is_plain_text(syntax: &SyntaxReference) -> bool {
    syntax.name == SYNTAX_SET.find_syntax_plain_text().name
}

/// Renders `code` with `syntax` as `hljs-` class spans. `None` if the
/// grammar fails on some line.
fn classed_html(code: &str, syntax: &SyntaxReference) -> Option<String> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        if let Err(err) = generator.parse_html_for_line_which_includes_newline(line) {
            tracing::warn!(syntax = %syntax.name, error = %err, "highlighting failed");
            return None;
        }
    }
    Some(generator.finalize())
}

/// Syntax highlighter backed by syntect's bundled grammars.
///
/// A fence tag is resolved through the alias table first, then through
/// syntect's name and extension lookup. An unknown tag is kept as the
/// language class with no highlighting. Without a tag the grammar is taken
/// from the first line (shebangs, `<?php`, ...), and failing that from the
/// highest scoring table language; ties go to the earlier entry so the
/// result is stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoHighlighter;

impl AutoHighlighter {
    /// Detects the language of `code` by keyword scoring, if any language scores.
    pub fn detect(code: &str) -> Option<&'static str> {
        let mut best: Option<(&LanguageDef, usize)> = None;
        for def in LANGUAGES {
            let score = def.score(code);
            if score > 0 && best.is_none_or(|(_, top)| score > top) {
                best = Some((def, score));
            }
        }
        best.map(|(def, _)| def.name)
    }

    fn resolve_tag(tag: &str) -> Option<(String, &'static SyntaxReference)> {
        if let Some(def) = find_language(tag) {
            return def.grammar().map(|syntax| (def.name.to_string(), syntax));
        }
        SYNTAX_SET
            .find_syntax_by_token(&tag.to_ascii_lowercase())
            .filter(|syntax| !is_plain_text(syntax))
            .map(|syntax| (language_class(syntax), syntax))
    }

    fn resolve_code(code: &str) -> Option<(String, &'static SyntaxReference)> {
        if let Some(syntax) = SYNTAX_SET
            .find_syntax_by_first_line(code)
            .filter(|syntax| !is_plain_text(syntax))
        {
            return Some((language_class(syntax), syntax));
        }
        let def = Self::detect(code).and_then(find_language)?;
        def.grammar().map(|syntax| (def.name.to_string(), syntax))
    }
}

impl Highlighter for AutoHighlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Highlighted {
        let resolved = match language {
            Some(tag) => match Self::resolve_tag(tag) {
                Some(resolved) => resolved,
                None => return Highlighted::plain(code, Some(&tag.to_ascii_lowercase())),
            },
            None => match Self::resolve_code(code) {
                Some(resolved) => resolved,
                None => return Highlighted::plain(code, None),
            },
        };

        let (name, syntax) = resolved;
        tracing::trace!(language = %name, len = code.len(), "highlighting code block");
        match classed_html(code, syntax) {
            Some(markup) => Highlighted {
                language: Some(name),
                markup,
            },
            None => Highlighted::plain(code, Some(&name)),
        }
    }
}
