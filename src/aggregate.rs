// src/aggregate.rs
//! # Document Aggregator
//! Pure function from admitted sentences to one article-level outcome.
//!
//! relevance = clamp(log10(raw * 19 + 1)), raw = relevant / total sentences;
//! sentiment = mean polarity of relevant sentences;
//! effective = sentiment * relevance.
//!
//! "No signal" is its own variant and never encoded as a zero triple, so a
//! genuinely neutral, relevant article stays distinguishable from an empty one.

use serde::{Deserialize, Serialize};

use crate::article::Subject;
use crate::polarity::{clamp_polarity, PolarityScorer};
use crate::relevance::{clamp_unit, score_sentence, DEFAULT_DISCOUNT};
use crate::sentence::Sentence;

pub const DEFAULT_LOG_SCALE_FACTOR: f64 = 19.0;

/// Tunables of the relevance formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Per-sentence relevance is `1 / (length * discount)`.
    pub discount: f64,
    /// Document relevance is `log10(raw * factor + 1)`.
    pub log_scale_factor: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            discount: DEFAULT_DISCOUNT,
            log_scale_factor: DEFAULT_LOG_SCALE_FACTOR,
        }
    }
}

/// Sentiment, relevance and their product for one article.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub sentiment: f64,
    pub relevance: f64,
    pub effective_sentiment: f64,
}

impl ScoreTriple {
    pub fn new(sentiment: f64, relevance: f64) -> Self {
        Self {
            sentiment,
            relevance,
            effective_sentiment: sentiment * relevance,
        }
    }

    /// Usable iff every field is a number. Only usable triples enter a series.
    pub fn is_usable(&self) -> bool {
        !self.sentiment.is_nan() && !self.relevance.is_nan() && !self.effective_sentiment.is_nan()
    }
}

/// Outcome of scoring one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentScore {
    Scored {
        triple: ScoreTriple,
        relevant_count: usize,
        total_sentences: usize,
    },
    /// Nothing survived the admission filter.
    NoBodyText,
    /// Body text exists but never mentions the subject.
    NoRelevantSentence,
}

impl DocumentScore {
    pub fn triple(&self) -> Option<&ScoreTriple> {
        match self {
            DocumentScore::Scored { triple, .. } => Some(triple),
            _ => None,
        }
    }
}

/// Log-scaled document relevance, clamped into [0, 1].
pub fn log_scale(raw_relevance: f64, factor: f64) -> f64 {
    clamp_unit((raw_relevance * factor + 1.0).ln() / 10f64.ln())
}

/// Aggregate admitted sentences into a document outcome.
///
/// Only sentences with relevance > 0 are sent to the polarity scorer.
pub fn score_sentences(
    sentences: &[Sentence],
    subject: &Subject,
    scorer: &dyn PolarityScorer,
    params: &ScoringParams,
) -> DocumentScore {
    if sentences.is_empty() {
        return DocumentScore::NoBodyText;
    }

    let mut total_sentences = 0usize;
    let mut sentiments: Vec<f64> = Vec::new();

    for s in sentences {
        let Some(rel) = score_sentence(s, subject, params.discount) else {
            continue;
        };
        total_sentences += 1;
        if rel.score > 0.0 {
            sentiments.push(clamp_polarity(scorer.score(&s.text)));
        }
    }

    if total_sentences == 0 {
        return DocumentScore::NoBodyText;
    }
    if sentiments.is_empty() {
        return DocumentScore::NoRelevantSentence;
    }

    let relevant_count = sentiments.len();
    let raw = relevant_count as f64 / total_sentences as f64;
    let relevance = log_scale(raw, params.log_scale_factor);
    let sentiment = sentiments.iter().sum::<f64>() / relevant_count as f64;

    DocumentScore::Scored {
        triple: ScoreTriple::new(sentiment, relevance),
        relevant_count,
        total_sentences,
    }
}
