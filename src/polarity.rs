// src/polarity.rs
//! Sentence polarity: a single compound value in [-1, 1].

use vader_sentiment::SentimentIntensityAnalyzer;

/// Polarity collaborator used by the document aggregator.
pub trait PolarityScorer: Send + Sync {
    /// Compound polarity of `text` in [-1, 1].
    fn score(&self, text: &str) -> f64;
}

/// VADER compound score (lexicon + rules, tuned for short news/social text).
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VaderScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaderScorer").finish_non_exhaustive()
    }
}

impl PolarityScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores.get("compound").copied().unwrap_or(0.0)
    }
}

/// Clamp a scorer value into [-1, 1]. NaN is passed through so the
/// usability check downstream can reject it.
pub(crate) fn clamp_polarity(x: f64) -> f64 {
    if x.is_nan() {
        x
    } else {
        x.clamp(-1.0, 1.0)
    }
}
