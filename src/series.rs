// src/series.rs
//! Per-symbol sentiment series and its tabular exports.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::aggregate::ScoreTriple;

/// One usable article outcome with its publication time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    #[serde(flatten)]
    pub triple: ScoreTriple,
    pub published_at: Option<DateTime<Utc>>,
}

/// Ordered, usable results for one symbol. Built once per batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSentimentSeries {
    pub symbol: String,
    entries: Vec<SeriesEntry>,
}

/// Per-day means, keyed by UTC calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub sentiment: f64,
    pub relevance: f64,
    pub effective_sentiment: f64,
    pub articles: usize,
}

#[derive(Serialize)]
struct EntryRow {
    sentiment: f64,
    relevance: f64,
    effective_sentiment: f64,
    time_published: String,
}

impl SymbolSentimentSeries {
    /// Build from entries already in article-list order.
    pub fn new(symbol: impl Into<String>, entries: Vec<SeriesEntry>) -> Self {
        Self {
            symbol: symbol.into(),
            entries,
        }
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sentiments(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.triple.sentiment).collect()
    }

    /// Mean (sentiment, relevance, effective) over the whole series.
    pub fn mean(&self) -> Option<ScoreTriple> {
        if self.entries.is_empty() {
            return None;
        }
        let n = self.entries.len() as f64;
        let (s, r, e) = self.entries.iter().fold((0.0, 0.0, 0.0), |acc, x| {
            (
                acc.0 + x.triple.sentiment,
                acc.1 + x.triple.relevance,
                acc.2 + x.triple.effective_sentiment,
            )
        });
        Some(ScoreTriple {
            sentiment: s / n,
            relevance: r / n,
            effective_sentiment: e / n,
        })
    }

    /// Per-day means, ascending by date. Entries without a timestamp are left out.
    pub fn daily(&self) -> Vec<DailySentiment> {
        let mut days: BTreeMap<NaiveDate, (f64, f64, f64, usize)> = BTreeMap::new();
        for e in &self.entries {
            let Some(ts) = e.published_at else {
                continue;
            };
            let d = days.entry(ts.date_naive()).or_insert((0.0, 0.0, 0.0, 0));
            d.0 += e.triple.sentiment;
            d.1 += e.triple.relevance;
            d.2 += e.triple.effective_sentiment;
            d.3 += 1;
        }
        days.into_iter()
            .map(|(date, (s, r, e, n))| {
                let k = n as f64;
                DailySentiment {
                    date,
                    sentiment: s / k,
                    relevance: r / k,
                    effective_sentiment: e / k,
                    articles: n,
                }
            })
            .collect()
    }

    /// `sentiment,relevance,effective_sentiment,time_published`, one row per entry.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(out);
        for e in &self.entries {
            w.serialize(EntryRow {
                sentiment: e.triple.sentiment,
                relevance: e.triple.relevance,
                effective_sentiment: e.triple.effective_sentiment,
                time_published: e
                    .published_at
                    .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_default(),
            })?;
        }
        if self.entries.is_empty() {
            w.write_record([
                "sentiment",
                "relevance",
                "effective_sentiment",
                "time_published",
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    /// `date,sentiment,relevance,effective_sentiment,articles`, one row per day.
    pub fn write_daily_csv<W: Write>(&self, out: W) -> Result<()> {
        let days = self.daily();
        let mut w = csv::Writer::from_writer(out);
        if days.is_empty() {
            w.write_record([
                "date",
                "sentiment",
                "relevance",
                "effective_sentiment",
                "articles",
            ])?;
        }
        for d in days {
            w.serialize(d)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let f = create_file(path)?;
        self.write_csv(f)
            .with_context(|| format!("writing series to {}", path.display()))
    }

    pub fn save_daily_csv(&self, path: &Path) -> Result<()> {
        let f = create_file(path)?;
        self.write_daily_csv(f)
            .with_context(|| format!("writing daily series to {}", path.display()))
    }
}

fn create_file(path: &Path) -> Result<std::fs::File> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))
}
