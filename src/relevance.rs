// src/relevance.rs
//! Per-sentence relevance: how concentrated a sentence is on the subject.
//!
//! A sentence mentioning the ticker or the company name scores
//! `1 / (length * discount)`, so short mentions weigh more than a passing
//! reference buried in a long sentence. Everything else scores zero.

use crate::article::Subject;
use crate::sentence::Sentence;

pub const DEFAULT_DISCOUNT: f64 = 0.5;

/// Result of relevance evaluation for one sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceRelevance {
    /// Whitespace token count of the sentence.
    pub length: usize,
    pub relevant: bool,
    /// Clamped to [0, 1].
    pub score: f64,
}

/// Case-sensitive substring check against symbol and company name.
pub fn mentions_subject(text: &str, subject: &Subject) -> bool {
    let hit = |needle: &str| !needle.is_empty() && text.contains(needle);
    hit(&subject.symbol) || hit(&subject.company_name)
}

/// Score one sentence. Returns `None` for zero-length sentences, which take
/// no part in aggregation at all.
pub fn score_sentence(
    sentence: &Sentence,
    subject: &Subject,
    discount: f64,
) -> Option<SentenceRelevance> {
    let length = sentence.word_count;
    if length == 0 {
        return None;
    }

    let relevant = mentions_subject(&sentence.text, subject);
    let raw = if relevant {
        1.0 / (length as f64 * discount)
    } else {
        0.0
    };

    Some(SentenceRelevance {
        length,
        relevant,
        score: clamp_unit(raw),
    })
}

/// Clamp into [0, 1]; NaN collapses to 0.
pub(crate) fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
