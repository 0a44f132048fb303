// src/batch.rs
//! # Batch Driver
//! Runs the article pipeline over a symbol's article list and builds the
//! symbol's sentiment series.
//!
//! Articles are processed with at most `workers` in flight; results are put
//! back into list order before the series is built. Per-article failures are
//! counted and logged, never returned. Cancelling the run token resolves every
//! pending article as cancelled and yields the partial series.

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::ScoreTriple;
use crate::article::{load_articles_from, Article, ArticleRef, Subject};
use crate::error::ArticleError;
use crate::pipeline::ArticleAnalyzer;
use crate::series::{SeriesEntry, SymbolSentimentSeries};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sentiment_articles_total", "Articles taken into a batch run.");
        describe_counter!(
            "sentiment_articles_scored_total",
            "Articles that produced a usable sentiment triple."
        );
        describe_counter!(
            "sentiment_articles_skipped_total",
            "Articles without a usable signal, by reason."
        );
        describe_counter!(
            "sentiment_fetch_errors_total",
            "Article fetches that failed (transport or HTTP status)."
        );
        describe_histogram!(
            "sentiment_article_ms",
            "Per-article pipeline time in milliseconds."
        );
    });
}

/// Number of leading articles a run processes. `limit <= 0` means all.
pub fn effective_len(available: usize, limit: i64) -> usize {
    if limit <= 0 {
        available
    } else {
        available.min(usize::try_from(limit).unwrap_or(usize::MAX))
    }
}

/// Counters of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Articles selected for the run (after `limit`).
    pub total: usize,
    pub processed: usize,
    pub scored: usize,
    /// Reason label → count.
    pub skipped: BTreeMap<&'static str, usize>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: &str) -> usize {
        self.skipped.get(reason).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub series: SymbolSentimentSeries,
    pub report: BatchReport,
}

pub struct BatchDriver {
    analyzer: ArticleAnalyzer,
    workers: usize,
}

impl BatchDriver {
    pub fn new(analyzer: ArticleAnalyzer) -> Self {
        Self {
            analyzer,
            workers: 1,
        }
    }

    /// Max articles in flight; clamped to at least 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn analyzer(&self) -> &ArticleAnalyzer {
        &self.analyzer
    }

    /// Load the article list from `path`, then run. A list that cannot be
    /// loaded is the only error this returns.
    pub async fn run_from_path(
        &self,
        subject: &Subject,
        path: &Path,
        limit: i64,
        cancel: &CancellationToken,
    ) -> anyhow::Result<BatchOutcome> {
        let articles = load_articles_from(path)?;
        info!(
            target: "batch",
            symbol = %subject.symbol,
            path = %path.display(),
            articles = articles.len(),
            "article list loaded"
        );
        Ok(self.run(subject, &articles, limit, cancel).await)
    }

    /// Score the first `limit` articles (all when `limit <= 0`) and build the series.
    pub async fn run(
        &self,
        subject: &Subject,
        articles: &[ArticleRef],
        limit: i64,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        ensure_metrics_described();

        let total = effective_len(articles.len(), limit);
        let selected = &articles[..total];
        let analyzer = &self.analyzer;

        let mut pending = stream::iter(selected.iter().enumerate())
            .map(|(idx, entry)| async move {
                let t0 = Instant::now();
                let res = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ArticleError::Cancelled),
                    r = analyzer.analyze(Article { subject, entry }) => r,
                };
                (idx, res, t0.elapsed())
            })
            .buffer_unordered(self.workers);

        let mut done: Vec<(usize, Result<ScoreTriple, ArticleError>)> = Vec::with_capacity(total);
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        while let Some((idx, res, elapsed)) = pending.next().await {
            counter!("sentiment_articles_total").increment(1);
            let url = selected[idx].url.as_str();
            match &res {
                Ok(_) => {
                    report.scored += 1;
                    counter!("sentiment_articles_scored_total").increment(1);
                }
                Err(e) => {
                    *report.skipped.entry(e.reason()).or_insert(0) += 1;
                    counter!("sentiment_articles_skipped_total", "reason" => e.reason())
                        .increment(1);
                    match e {
                        ArticleError::Fetch(_) => warn!(
                            target: "batch",
                            url,
                            fetcher = analyzer.fetcher_name(),
                            error = %e,
                            "article fetch failed"
                        ),
                        ArticleError::Cancelled => {}
                        _ => debug!(target: "batch", url, reason = e.reason(), "no signal"),
                    }
                }
            }
            if !matches!(res, Err(ArticleError::Cancelled)) {
                histogram!("sentiment_article_ms").record(elapsed.as_secs_f64() * 1_000.0);
                report.processed += 1;
                info!(
                    target: "batch",
                    symbol = %subject.symbol,
                    processed = report.processed,
                    total,
                    "processed {} of {}",
                    report.processed,
                    total
                );
            }
            done.push((idx, res));
        }

        // A token fired after the last article finished cancelled nothing.
        report.cancelled = report.skipped_for("cancelled") > 0;

        // Completion order is arbitrary with workers > 1; restore list order.
        done.sort_by_key(|(idx, _)| *idx);
        let entries = done
            .into_iter()
            .filter_map(|(idx, res)| {
                res.ok().map(|triple| SeriesEntry {
                    triple,
                    published_at: selected[idx].published_at,
                })
            })
            .collect();

        let series = SymbolSentimentSeries::new(subject.symbol.clone(), entries);

        info!(
            target: "batch",
            symbol = %subject.symbol,
            total,
            scored = report.scored,
            skipped = report.skipped_total(),
            cancelled = report.cancelled,
            "batch finished"
        );

        BatchOutcome { series, report }
    }
}
