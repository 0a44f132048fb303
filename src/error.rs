// src/error.rs
//! Per-article error taxonomy. Everything here is absorbed at the article
//! boundary by the batch driver; only systemic failures (article list, config)
//! surface to callers, as `anyhow::Error`.

use thiserror::Error;

/// Retrieval failure for one URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Used by non-HTTP fetchers (fixtures, caches, test doubles).
    #[error("fetch of {url} failed: {reason}")]
    Other { url: String, reason: String },
}

impl FetchError {
    pub fn other(url: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Other {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Why an article contributed no entry to the series.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("no admissible body sentences")]
    NoBodyText,

    #[error("no sentence mentions the subject")]
    NoRelevantSentence,

    #[error("sentiment is not a number")]
    InvalidScore,

    #[error("cancelled")]
    Cancelled,
}

impl ArticleError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ArticleError::Fetch(_) => "fetch",
            ArticleError::NoBodyText => "no_body_text",
            ArticleError::NoRelevantSentence => "no_relevant_sentence",
            ArticleError::InvalidScore => "invalid_score",
            ArticleError::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_convert_and_label() {
        let e: ArticleError = FetchError::other("https://x.test", "boom").into();
        assert_eq!(e.reason(), "fetch");
        assert!(e.to_string().contains("https://x.test"));
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn status_message_carries_code() {
        let e = FetchError::Status {
            url: "https://x.test/a".into(),
            status: 403,
        };
        assert_eq!(e.to_string(), "https://x.test/a answered HTTP 403");
    }
}
