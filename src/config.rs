// src/config.rs
//! Engine configuration: TOML file + environment overrides.
//!
//! Resolution order:
//! 1) $TICKER_SENTIMENT_CONFIG (must exist)
//! 2) config/engine.toml
//! 3) built-in defaults
//!
//! Then SENTIMENT_WORKERS / SENTIMENT_LIMIT override the batch section.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::{ScoringParams, DEFAULT_LOG_SCALE_FACTOR};
use crate::fetch::{HttpFetcherCfg, DEFAULT_USER_AGENT};
use crate::relevance::DEFAULT_DISCOUNT;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_CONFIG_PATH: &str = "TICKER_SENTIMENT_CONFIG";
pub const ENV_WORKERS: &str = "SENTIMENT_WORKERS";
pub const ENV_LIMIT: &str = "SENTIMENT_LIMIT";

fn default_discount() -> f64 {
    DEFAULT_DISCOUNT
}
fn default_log_scale_factor() -> f64 {
    DEFAULT_LOG_SCALE_FACTOR
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_workers() -> usize {
    4
}
fn default_requests() -> u32 {
    150
}
fn default_per_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSection {
    #[serde(default = "default_discount")]
    pub discount: f64,
    #[serde(default = "default_log_scale_factor")]
    pub log_scale_factor: f64,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            discount: default_discount(),
            log_scale_factor: default_log_scale_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchSection {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSection {
    /// Max articles in flight. 1 = strictly sequential.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// First `limit` articles only; <= 0 means all.
    #[serde(default)]
    pub limit: i64,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            limit: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    #[serde(default = "default_requests")]
    pub requests: u32,
    #[serde(default = "default_per_secs")]
    pub per_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            per_secs: default_per_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    /// Symbol → company name.
    #[serde(default)]
    pub companies: BTreeMap<String, String>,
}

impl EngineConfig {
    /// Resolve the config file (env, then default path, then built-ins) and
    /// apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!(
                        "{ENV_CONFIG_PATH} points to non-existent path {}",
                        pb.display()
                    ));
                }
                Self::from_path(&pb)?
            }
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::from_path(&p)?
                } else {
                    Self::with_default_companies()
                }
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing engine config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Built-in defaults plus the stock watch list.
    pub fn with_default_companies() -> Self {
        let mut cfg = Self::default();
        cfg.companies = default_companies();
        cfg
    }

    fn sanitize(&mut self) {
        if !(self.scoring.discount.is_finite() && self.scoring.discount > 0.0) {
            self.scoring.discount = default_discount();
        }
        if !(self.scoring.log_scale_factor.is_finite() && self.scoring.log_scale_factor >= 0.0) {
            self.scoring.log_scale_factor = default_log_scale_factor();
        }
        self.fetch.connect_timeout_secs = self.fetch.connect_timeout_secs.max(1);
        self.fetch.timeout_secs = self.fetch.timeout_secs.max(1);
        self.batch.workers = self.batch.workers.max(1);
        self.rate_limit.requests = self.rate_limit.requests.max(1);
        self.rate_limit.per_secs = self.rate_limit.per_secs.max(1);
        self.companies = std::mem::take(&mut self.companies)
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
    }

    fn apply_env(&mut self) {
        if let Some(w) = parse_env::<usize>(std::env::var(ENV_WORKERS).ok()) {
            self.batch.workers = w.max(1);
        }
        if let Some(l) = parse_env::<i64>(std::env::var(ENV_LIMIT).ok()) {
            self.batch.limit = l;
        }
    }

    pub fn scoring_params(&self) -> ScoringParams {
        ScoringParams {
            discount: self.scoring.discount,
            log_scale_factor: self.scoring.log_scale_factor,
        }
    }

    pub fn fetcher_cfg(&self) -> HttpFetcherCfg {
        HttpFetcherCfg {
            user_agent: self.fetch.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            timeout: Duration::from_secs(self.fetch.timeout_secs),
        }
    }

    pub fn rate_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit.per_secs)
    }

    /// Company name for `symbol`, if configured.
    pub fn company_name(&self, symbol: &str) -> Option<&str> {
        self.companies.get(symbol).map(String::as_str)
    }
}

fn parse_env<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse::<T>().ok())
}

fn default_companies() -> BTreeMap<String, String> {
    [
        ("AAPL", "Apple"),
        ("MSFT", "Microsoft"),
        ("GOOG", "Google"),
        ("GOOGL", "Google"),
        ("AMZN", "Amazon"),
        ("PCAR", "Paccar"),
        ("TSLA", "Tesla"),
        ("NVDA", "Nvidia"),
        ("V", "Visa"),
        ("TSM", "Taiwan Semiconductor"),
        ("UNH", "UnitedHealth"),
    ]
    .into_iter()
    .map(|(s, n)| (s.to_string(), n.to_string()))
    .collect()
}
