// src/text.rs
//! Markup → plain text, and plain text → sentence candidates.
//!
//! The default implementation keeps source line breaks intact: the admission
//! filter relies on them to tell body text from stacked navigation lines.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Text/NLP collaborator used by the article pipeline.
pub trait TextProcessor: Send + Sync {
    /// Render markup as plain text (tags dropped, entities decoded).
    fn extract_plain_text(&self, markup: &str) -> String;
    /// Split plain text into ordered sentence-like fragments.
    fn split_sentences(&self, text: &str) -> Vec<String>;
}

/// Regex-based markup stripper plus a rule-based sentence splitter.
#[derive(Debug, Clone, Default)]
pub struct MarkupText;

impl MarkupText {
    pub fn new() -> Self {
        Self
    }
}

impl TextProcessor for MarkupText {
    fn extract_plain_text(&self, markup: &str) -> String {
        strip_markup(markup)
    }

    fn split_sentences(&self, text: &str) -> Vec<String> {
        split_sentences(text)
    }
}

fn re_script() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap())
}

fn re_style() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap())
}

fn re_comment() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn re_block_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)</?(p|div|br|hr|li|ul|ol|dl|dt|dd|h[1-6]|tr|td|th|table|section|article|header|footer|nav|aside|main|blockquote|figure|figcaption|pre|title|form)\b[^>]*>",
        )
        .unwrap()
    })
}

fn re_paragraph_break() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t\r\x{A0}]*\n").unwrap())
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[!/?]?[A-Za-z][^>]*>").unwrap())
}

/// Drop script/style bodies, comments and tags; decode HTML entities.
/// Block-level tags become line breaks, inline tags vanish; source
/// whitespace is otherwise kept as-is.
pub fn strip_markup(markup: &str) -> String {
    let out = re_script().replace_all(markup, "");
    let out = re_style().replace_all(&out, "");
    let out = re_comment().replace_all(&out, "");
    let out = re_block_tags().replace_all(&out, "\n");
    let out = re_tags().replace_all(&out, "");
    html_escape::decode_html_entities(&out).into_owned()
}

/// Tokens that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "inc", "corp", "co", "ltd", "plc",
    "llc", "vs", "etc", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept",
    "oct", "nov", "dec", "u.s", "u.k", "e.g", "i.e", "a.m", "p.m",
];

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// Last whitespace-delimited token before byte `end`, without leading punctuation.
fn token_before(text: &str, end: usize) -> &str {
    let head = &text[..end];
    let start = head
        .rfind(char::is_whitespace)
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    head[start..].trim_start_matches(|c: char| !c.is_alphanumeric())
}

/// True if a period at `dot` closes a known abbreviation, not a sentence.
/// Lone capitals are not initials: a one-letter ticker ("V.") ends a sentence.
fn is_abbreviation(text: &str, dot: usize) -> bool {
    let tok = token_before(text, dot);
    !tok.is_empty() && ABBREVIATIONS.contains(&tok.to_lowercase().as_str())
}

/// Split on blank lines, then after `.`/`!`/`?` (plus trailing quotes and
/// brackets) when followed by whitespace and the next word does not start in
/// lowercase. Fragments are trimmed; single internal newlines are kept.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in re_paragraph_break().split(text) {
        split_paragraph(paragraph, &mut out);
    }
    out
}

fn split_paragraph(text: &str, out: &mut Vec<String>) {
    let mut start = 0usize;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if !is_terminator(c) {
            continue;
        }
        // Absorb runs like "?!" or "..." and closing quotes.
        let mut end = i + c.len_utf8();
        while let Some(&(j, n)) = iter.peek() {
            if is_terminator(n) || is_closer(n) {
                end = j + n.len_utf8();
                iter.next();
            } else {
                break;
            }
        }

        let rest = &text[end..];
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let next = rest.trim_start().chars().next();
        if next.is_some_and(|n| n.is_lowercase()) {
            continue;
        }
        if c == '.' && end == i + 1 && is_abbreviation(text, i) {
            continue;
        }

        push_fragment(out, &text[start..end]);
        start = end;
    }
    push_fragment(out, &text[start..]);
}

fn push_fragment(out: &mut Vec<String>, raw: &str) {
    let t = raw.trim();
    if !t.is_empty() {
        out.push(t.to_string());
    }
}
