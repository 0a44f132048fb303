//! ticker-sentiment — CLI entrypoint.
//! Scores a symbol's news articles into a relevance-weighted sentiment series.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ticker_sentiment::article::default_articles_path;
use ticker_sentiment::pipeline::into_usable;
use ticker_sentiment::polarity::{PolarityScorer, VaderScorer};
use ticker_sentiment::{build_driver, DocumentScore, EngineConfig, Subject};

#[derive(Debug, Parser)]
#[command(name = "ticker-sentiment", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score every article listed for a symbol.
    Run {
        #[arg(long)]
        symbol: String,
        /// Company name; defaults to the `[companies]` config entry.
        #[arg(long)]
        name: Option<String>,
        /// Article list (CSV with `url` and `time_published` columns).
        #[arg(long)]
        articles: Option<PathBuf>,
        /// Process only the first N articles; 0 = all.
        #[arg(long)]
        limit: Option<i64>,
        /// Max articles in flight.
        #[arg(long)]
        workers: Option<usize>,
        /// Write the series CSV here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write per-day means.
        #[arg(long)]
        daily: Option<PathBuf>,
    },
    /// Score one plain-text document (file or stdin) against a symbol.
    Score {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Compound polarity of free text.
    Polarity { text: String },
}

/// Log to stderr; RUST_LOG filters, LOG_FORMAT=json switches the layout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ticker_sentiment=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_subject(cfg: &EngineConfig, symbol: &str, name: Option<String>) -> Result<Subject> {
    let name = match name {
        Some(n) => n,
        None => cfg
            .company_name(symbol)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no company name for {symbol}; pass --name"))?,
    };
    Ok(Subject::new(symbol, name))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let mut cfg = EngineConfig::load()?;

    match cli.command {
        Command::Run {
            symbol,
            name,
            articles,
            limit,
            workers,
            out,
            daily,
        } => {
            let subject = resolve_subject(&cfg, &symbol, name)?;
            if let Some(w) = workers {
                cfg.batch.workers = w.max(1);
            }
            let limit = limit.unwrap_or(cfg.batch.limit);
            let path = articles.unwrap_or_else(|| default_articles_path(&subject.symbol));

            let driver = build_driver(&cfg)?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, finishing with partial results");
                    on_signal.cancel();
                }
            });

            let outcome = driver
                .run_from_path(&subject, &path, limit, &cancel)
                .await?;

            match out {
                Some(p) => {
                    outcome.series.save_csv(&p)?;
                    info!(path = %p.display(), rows = outcome.series.len(), "series written");
                }
                None => outcome.series.write_csv(std::io::stdout().lock())?,
            }
            if let Some(p) = daily {
                outcome.series.save_daily_csv(&p)?;
                info!(path = %p.display(), "daily series written");
            }

            if let Some(m) = outcome.series.mean() {
                info!(
                    symbol = %subject.symbol,
                    sentiment = m.sentiment,
                    relevance = m.relevance,
                    effective_sentiment = m.effective_sentiment,
                    "overall"
                );
            }
            eprintln!("{}", serde_json::to_string(&outcome.report)?);
        }
        Command::Score { symbol, name, file } => {
            let subject = resolve_subject(&cfg, &symbol, name)?;
            let text = match file {
                Some(p) => std::fs::read_to_string(&p)
                    .with_context(|| format!("reading {}", p.display()))?,
                None => {
                    let mut s = String::new();
                    std::io::stdin().read_to_string(&mut s)?;
                    s
                }
            };
            let driver = build_driver(&cfg)?;
            let score = driver.analyzer().score_text(&text, &subject);
            let body = match score {
                DocumentScore::Scored {
                    triple,
                    relevant_count,
                    total_sentences,
                } if triple.is_usable() => serde_json::json!({
                    "signal": true,
                    "sentiment": triple.sentiment,
                    "relevance": triple.relevance,
                    "effective_sentiment": triple.effective_sentiment,
                    "relevant_sentences": relevant_count,
                    "total_sentences": total_sentences,
                }),
                other => serde_json::json!({
                    "signal": false,
                    "reason": into_usable(other).err().map(|e| e.reason()),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Polarity { text } => {
            println!("{}", VaderScorer::new().score(&text));
        }
    }

    Ok(())
}
