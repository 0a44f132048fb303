// src/article.rs
//! Article records and article-list loading.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default article-list location: `market_data/AlphaIntelligence/<SYMBOL>.csv`.
pub const DEFAULT_ARTICLES_DIR: &str = "market_data/AlphaIntelligence";

/// The thing an article is scored against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub symbol: String,       // e.g. "AAPL"
    pub company_name: String, // e.g. "Apple"
}

impl Subject {
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
        }
    }
}

/// One entry of a symbol's article list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl ArticleRef {
    pub fn new(url: impl Into<String>, published_at: Option<DateTime<Utc>>) -> Self {
        Self {
            url: url.into(),
            published_at,
        }
    }
}

/// An article bound to its subject.
#[derive(Debug, Clone, Copy)]
pub struct Article<'a> {
    pub subject: &'a Subject,
    pub entry: &'a ArticleRef,
}

impl<'a> Article<'a> {
    pub fn url(&self) -> &'a str {
        &self.entry.url
    }

    pub fn symbol(&self) -> &'a str {
        &self.subject.symbol
    }

    pub fn company_name(&self) -> &'a str {
        &self.subject.company_name
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.entry.published_at
    }
}

pub fn default_articles_path(symbol: &str) -> PathBuf {
    PathBuf::from(DEFAULT_ARTICLES_DIR).join(format!("{symbol}.csv"))
}

/// Parse a publication timestamp. Accepts the compact news-feed form
/// (`20221209T202200`, `20221209T2022`), RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// and bare dates. Naive values are taken as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y%m%dT%H%M%S",
        "%Y%m%dT%H%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Load an article list from a delimited file with a header row.
pub fn load_articles_from(path: &Path) -> Result<Vec<ArticleRef>> {
    let file =
        File::open(path).with_context(|| format!("opening article list {}", path.display()))?;
    read_articles(file).with_context(|| format!("reading article list {}", path.display()))
}

/// Read articles from any CSV source. Requires a `url` column; `time_published`
/// is optional. Other columns are ignored. Rows with an empty url are dropped.
pub fn read_articles<R: Read>(rdr: R) -> Result<Vec<ArticleRef>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader.headers()?.clone();

    let col = |name: &str| headers.iter().position(|h| h.trim() == name);
    let url_idx = col("url").ok_or_else(|| anyhow!("missing `url` column"))?;
    let time_idx = col("time_published");

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        let url = record.get(url_idx).unwrap_or_default().trim();
        if url.is_empty() {
            skipped += 1;
            continue;
        }
        let published_at = time_idx
            .and_then(|i| record.get(i))
            .and_then(parse_published);
        out.push(ArticleRef::new(url, published_at));
    }

    tracing::debug!(target: "article", loaded = out.len(), skipped, "article list read");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_compact_feed_timestamps() {
        let t = parse_published("20221209T202200").unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2022, 12, 9));
        assert_eq!((t.hour(), t.minute()), (20, 22));

        let short = parse_published("20221209T2022").unwrap();
        assert_eq!(short, t);
    }

    #[test]
    fn parses_rfc3339_and_dates() {
        let t = parse_published("2023-01-02T03:04:05+01:00").unwrap();
        assert_eq!(t.hour(), 2);
        let d = parse_published("2023-01-02").unwrap();
        assert_eq!((d.day(), d.hour()), (2, 0));
        assert!(parse_published("").is_none());
        assert!(parse_published("yesterday").is_none());
    }

    #[test]
    fn reads_url_and_time_columns_ignoring_others() {
        let csv = "\
,title,url,time_published,summary
0,A,https://a.test/1,20221209T202200,x
1,B,,20221209T202200,y
2,C,https://a.test/3,,z
";
        let v = read_articles(csv.as_bytes()).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].url, "https://a.test/1");
        assert!(v[0].published_at.is_some());
        assert_eq!(v[1].url, "https://a.test/3");
        assert!(v[1].published_at.is_none());
    }

    #[test]
    fn missing_url_column_is_an_error() {
        let err = read_articles("title,time_published\nA,20221209T2022\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn article_binds_entry_to_subject() {
        let subject = Subject::new("TSLA", "Tesla");
        let entry = ArticleRef::new("https://a.test/t", parse_published("2023-01-02"));
        let a = Article {
            subject: &subject,
            entry: &entry,
        };
        assert_eq!(a.url(), "https://a.test/t");
        assert_eq!((a.symbol(), a.company_name()), ("TSLA", "Tesla"));
        assert_eq!(a.published_at(), entry.published_at);
    }

    #[test]
    fn default_path_uses_symbol() {
        assert_eq!(
            default_articles_path("AAPL"),
            PathBuf::from("market_data/AlphaIntelligence/AAPL.csv")
        );
    }
}
