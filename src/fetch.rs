// src/fetch.rs
//! Article retrieval: the fetch collaborator and its HTTP implementation.

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::limiter::TokenBucket;

/// Browser-like identity; many news sites refuse clients without one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:20.0) Gecko/20100101 Firefox/20.0";

#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Raw markup of the page at `url`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct HttpFetcherCfg {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for HttpFetcherCfg {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(4),
            timeout: Duration::from_secs(15),
        }
    }
}

/// reqwest-backed fetcher. Every request first takes a token from the shared
/// bucket when one is attached. No retries.
pub struct HttpFetcher {
    http: reqwest::Client,
    limiter: Option<Arc<TokenBucket>>,
}

impl HttpFetcher {
    pub fn new(cfg: &HttpFetcherCfg) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(cfg.connect_timeout)
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            limiter: None,
        })
    }

    pub fn with_limiter(mut self, limiter: Arc<TokenBucket>) -> Self {
        self.limiter = Some(limiter);
        self
    }
}

#[async_trait]
impl ArticleFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(l) = &self.limiter {
            l.acquire().await;
        }

        let res = self.http.get(url).send().await.map_err(|source| {
            counter!("sentiment_fetch_errors_total").increment(1);
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status = res.status();
        if !status.is_success() {
            counter!("sentiment_fetch_errors_total").increment(1);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        res.text().await.map_err(|source| {
            counter!("sentiment_fetch_errors_total").increment(1);
            FetchError::Body {
                url: url.to_string(),
                source,
            }
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
