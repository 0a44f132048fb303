// src/pipeline.rs
//! Per-article pipeline: fetch → plain text → sentences → admission → scores.

use std::sync::Arc;

use crate::aggregate::{score_sentences, DocumentScore, ScoreTriple, ScoringParams};
use crate::article::{Article, Subject};
use crate::error::ArticleError;
use crate::fetch::ArticleFetcher;
use crate::polarity::PolarityScorer;
use crate::sentence::admit_sentences;
use crate::text::TextProcessor;

/// Bundles the three collaborators with the scoring tunables.
#[derive(Clone)]
pub struct ArticleAnalyzer {
    fetcher: Arc<dyn ArticleFetcher>,
    text: Arc<dyn TextProcessor>,
    scorer: Arc<dyn PolarityScorer>,
    params: ScoringParams,
}

impl ArticleAnalyzer {
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        text: Arc<dyn TextProcessor>,
        scorer: Arc<dyn PolarityScorer>,
    ) -> Self {
        Self {
            fetcher,
            text,
            scorer,
            params: ScoringParams::default(),
        }
    }

    pub fn with_params(mut self, params: ScoringParams) -> Self {
        self.params = params;
        self
    }

    /// Name of the fetch collaborator, for log fields.
    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Score already-extracted plain text. Never fails.
    pub fn score_text(&self, text: &str, subject: &Subject) -> DocumentScore {
        let fragments = self.text.split_sentences(text);
        let sentences = admit_sentences(&fragments);
        score_sentences(&sentences, subject, self.scorer.as_ref(), &self.params)
    }

    /// Score raw markup.
    pub fn score_markup(&self, markup: &str, subject: &Subject) -> DocumentScore {
        let text = self.text.extract_plain_text(markup);
        self.score_text(&text, subject)
    }

    /// Full pipeline for one URL. Every "no signal" outcome comes back as an
    /// `ArticleError`, so callers only see usable triples on `Ok`.
    pub async fn analyze_url(
        &self,
        url: &str,
        subject: &Subject,
    ) -> Result<ScoreTriple, ArticleError> {
        let markup = self.fetcher.fetch(url).await?;
        into_usable(self.score_markup(&markup, subject))
    }

    /// `analyze_url` for an article bound to its subject.
    pub async fn analyze(&self, article: Article<'_>) -> Result<ScoreTriple, ArticleError> {
        self.analyze_url(article.url(), article.subject).await
    }
}

/// Collapse a document outcome into a usable triple or the reason it is not one.
pub fn into_usable(score: DocumentScore) -> Result<ScoreTriple, ArticleError> {
    match score {
        DocumentScore::Scored { triple, .. } if triple.is_usable() => Ok(triple),
        DocumentScore::Scored { .. } => Err(ArticleError::InvalidScore),
        DocumentScore::NoBodyText => Err(ArticleError::NoBodyText),
        DocumentScore::NoRelevantSentence => Err(ArticleError::NoRelevantSentence),
    }
}
