// src/sentence.rs
//! Sentence admission: decides which splitter fragments are genuine body text.
//!
//! Rendered article pages interleave the story with navigation, captions and
//! boilerplate. A fragment is admitted only when it looks like a proper
//! sentence *and* spans at most two source lines.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Max newline characters a fragment may carry and still count as body text.
pub const MAX_NEWLINES: usize = 1;

/// An admitted sentence with its whitespace token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub word_count: usize,
}

impl Sentence {
    /// Build from an admitted fragment; surrounding newlines are stripped.
    pub fn new(fragment: &str) -> Self {
        let text = fragment.trim_matches('\n').to_string();
        let word_count = text.split_whitespace().count();
        Self { text, word_count }
    }
}

fn body_regex() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    // Anchored at the start only: the first terminator closes the match.
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9][^.!?]*[.!?]").unwrap())
}

/// True if `fragment` starts like a sentence (uppercase ASCII letter or digit,
/// running to a `.`/`!`/`?`) and contains at most one newline.
pub fn is_body_sentence(fragment: &str) -> bool {
    body_regex().is_match(fragment) && fragment.matches('\n').count() <= MAX_NEWLINES
}

/// Keep only admissible fragments, preserving order.
pub fn admit_sentences<I, S>(fragments: I) -> Vec<Sentence>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter(|f| is_body_sentence(f.as_ref()))
        .map(|f| Sentence::new(f.as_ref()))
        .collect()
}
