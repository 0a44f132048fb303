// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod article;
pub mod batch;
pub mod config;
pub mod error;
pub mod fetch;
pub mod limiter;
pub mod pipeline;
pub mod polarity;
pub mod relevance;
pub mod sentence;
pub mod series;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{DocumentScore, ScoreTriple, ScoringParams};
pub use crate::article::{ArticleRef, Subject};
pub use crate::batch::{BatchDriver, BatchOutcome, BatchReport};
pub use crate::config::EngineConfig;
pub use crate::error::{ArticleError, FetchError};
pub use crate::pipeline::ArticleAnalyzer;
pub use crate::series::{SeriesEntry, SymbolSentimentSeries};

use std::sync::Arc;

use crate::fetch::HttpFetcher;
use crate::limiter::TokenBucket;
use crate::polarity::VaderScorer;
use crate::text::MarkupText;

/// Wire the default collaborators (HTTP fetch behind the shared token bucket,
/// markup stripping, VADER) according to `cfg`.
pub fn build_driver(cfg: &EngineConfig) -> anyhow::Result<BatchDriver> {
    let limiter = Arc::new(TokenBucket::new(
        cfg.rate_limit.requests,
        cfg.rate_interval(),
    ));
    let fetcher = HttpFetcher::new(&cfg.fetcher_cfg())?.with_limiter(limiter);
    let analyzer = ArticleAnalyzer::new(
        Arc::new(fetcher),
        Arc::new(MarkupText::new()),
        Arc::new(VaderScorer::new()),
    )
    .with_params(cfg.scoring_params());
    Ok(BatchDriver::new(analyzer).with_workers(cfg.batch.workers))
}
