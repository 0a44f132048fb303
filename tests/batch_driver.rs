// tests/batch_driver.rs
// Batch driver behaviour with an in-memory fetcher: ordering, limits,
// failure absorption and cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use ticker_sentiment::fetch::ArticleFetcher;
use ticker_sentiment::polarity::PolarityScorer;
use ticker_sentiment::text::MarkupText;
use ticker_sentiment::{ArticleAnalyzer, ArticleRef, BatchDriver, FetchError, Subject};

/// Serves canned pages with per-URL delays; records every URL it was asked for.
#[derive(Default)]
struct FakeWeb {
    pages: HashMap<String, (u64, Result<String, String>)>,
    requested: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeWeb {
    fn page(mut self, url: &str, delay_ms: u64, body: &str) -> Self {
        self.pages
            .insert(url.to_string(), (delay_ms, Ok(body.to_string())));
        self
    }

    fn failing(mut self, url: &str, delay_ms: u64) -> Self {
        self.pages
            .insert(url.to_string(), (delay_ms, Err("connection reset".to_string())));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleFetcher for FakeWeb {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, res) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or((0, Err("not found".to_string())));
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res.map_err(|reason| FetchError::other(url, reason))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Reads a polarity straight out of the sentence: "... scored 0.4." → 0.4.
struct Tagged;

impl PolarityScorer for Tagged {
    fn score(&self, text: &str) -> f64 {
        text.split_whitespace()
            .filter_map(|w| w.trim_end_matches('.').parse::<f64>().ok())
            .next()
            .unwrap_or(0.0)
    }
}

fn body(score: &str) -> String {
    format!("<p>Apple scored {score}.</p><p>Unrelated filler here.</p>")
}

fn driver(web: Arc<FakeWeb>, workers: usize) -> BatchDriver {
    let analyzer = ArticleAnalyzer::new(web, Arc::new(MarkupText::new()), Arc::new(Tagged));
    BatchDriver::new(analyzer).with_workers(workers)
}

fn refs(urls: &[&str]) -> Vec<ArticleRef> {
    urls.iter()
        .enumerate()
        .map(|(i, u)| {
            ArticleRef::new(
                *u,
                Some(Utc.with_ymd_and_hms(2022, 12, 1 + i as u32, 12, 0, 0).unwrap()),
            )
        })
        .collect()
}

fn aapl() -> Subject {
    Subject::new("AAPL", "Apple")
}

#[tokio::test]
async fn scenario_c_fetch_failure_is_skipped_order_kept() {
    let web = Arc::new(
        FakeWeb::default()
            .page("u1", 0, &body("0.1"))
            .failing("u2", 0)
            .page("u3", 0, &body("0.3")),
    );
    let articles = refs(&["u1", "u2", "u3"]);
    let out = driver(web, 1)
        .run(&aapl(), &articles, 0, &CancellationToken::new())
        .await;

    assert_eq!(out.series.len(), 2);
    assert_eq!(out.series.sentiments(), vec![0.1, 0.3]);
    let times: Vec<_> = out.series.entries().iter().map(|e| e.published_at).collect();
    assert_eq!(times, vec![articles[0].published_at, articles[2].published_at]);

    assert_eq!(out.report.total, 3);
    assert_eq!(out.report.processed, 3);
    assert_eq!(out.report.scored, 2);
    assert_eq!(out.report.skipped_for("fetch"), 1);
    assert!(!out.report.cancelled);
}

#[tokio::test]
async fn scenario_d_limit_processes_only_the_head() {
    let mut fake = FakeWeb::default();
    for u in ["a", "b", "c", "d", "e"] {
        fake = fake.page(u, 0, &body("0.5"));
    }
    let web = Arc::new(fake);
    let articles = refs(&["a", "b", "c", "d", "e"]);
    let out = driver(web.clone(), 3)
        .run(&aapl(), &articles, 2, &CancellationToken::new())
        .await;

    let mut asked = web.requested();
    asked.sort();
    assert_eq!(asked, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(out.report.total, 2);
    assert!(out.series.len() <= 2);
}

#[tokio::test]
async fn non_positive_limit_means_all() {
    let web = Arc::new(
        FakeWeb::default()
            .page("a", 0, &body("0.1"))
            .page("b", 0, &body("0.2"))
            .page("c", 0, &body("0.3")),
    );
    let articles = refs(&["a", "b", "c"]);
    for limit in [0, -1] {
        let out = driver(web.clone(), 2)
            .run(&aapl(), &articles, limit, &CancellationToken::new())
            .await;
        assert_eq!(out.series.len(), 3);
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_completion_out_of_order_still_emits_list_order() {
    // Later articles finish first.
    let web = Arc::new(
        FakeWeb::default()
            .page("slow", 300, &body("0.1"))
            .page("mid", 200, &body("0.2"))
            .failing("bad", 50)
            .page("fast", 10, &body("0.4")),
    );
    let articles = refs(&["slow", "mid", "bad", "fast"]);
    let out = driver(web.clone(), 4)
        .run(&aapl(), &articles, 0, &CancellationToken::new())
        .await;

    assert_eq!(out.series.sentiments(), vec![0.1, 0.2, 0.4]);
    assert!(web.max_in_flight.load(Ordering::SeqCst) > 1);
}

#[tokio::test(start_paused = true)]
async fn single_worker_is_sequential() {
    let web = Arc::new(
        FakeWeb::default()
            .page("a", 30, &body("0.1"))
            .page("b", 10, &body("0.2")),
    );
    let out = driver(web.clone(), 1)
        .run(&aapl(), &refs(&["a", "b"]), 0, &CancellationToken::new())
        .await;
    assert_eq!(web.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(web.requested(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(out.series.len(), 2);
}

#[tokio::test]
async fn no_signal_articles_are_excluded_and_counted() {
    let web = Arc::new(
        FakeWeb::default()
            .page("nav", 0, "<ul>\n<li>Home</li>\n<li>About</li>\n</ul>")
            .page("offtopic", 0, "<p>The weather was sunny.</p>")
            .page("nan", 0, "<p>Apple scored NaN.</p>")
            .page("ok", 0, &body("-0.6")),
    );
    let out = driver(web, 2)
        .run(
            &aapl(),
            &refs(&["nav", "offtopic", "nan", "ok"]),
            0,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(out.series.sentiments(), vec![-0.6]);
    assert_eq!(out.report.skipped_for("no_body_text"), 1);
    assert_eq!(out.report.skipped_for("no_relevant_sentence"), 1);
    assert_eq!(out.report.skipped_for("invalid_score"), 1);
    assert_eq!(out.report.scored, 1);
}

#[tokio::test]
async fn duplicate_urls_are_not_deduplicated() {
    let web = Arc::new(FakeWeb::default().page("same", 0, &body("0.2")));
    let out = driver(web, 2)
        .run(&aapl(), &refs(&["same", "same"]), 0, &CancellationToken::new())
        .await;
    assert_eq!(out.series.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancellation_returns_partial_series() {
    let web = Arc::new(
        FakeWeb::default()
            .page("a", 10, &body("0.1"))
            .page("b", 20, &body("0.2"))
            .page("c", 10_000, &body("0.3"))
            .page("d", 10_000, &body("0.4")),
    );
    let articles = refs(&["a", "b", "c", "d"]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let out = driver(web, 4).run(&aapl(), &articles, 0, &cancel).await;

    assert!(out.report.cancelled);
    assert_eq!(out.series.sentiments(), vec![0.1, 0.2]);
    assert_eq!(out.report.processed, 2);
    assert_eq!(out.report.skipped_for("cancelled"), 2);
}

#[tokio::test]
async fn already_cancelled_run_is_empty() {
    let web = Arc::new(FakeWeb::default().page("a", 0, &body("0.1")));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let out = driver(web, 2).run(&aapl(), &refs(&["a"]), 0, &cancel).await;
    assert!(out.series.is_empty());
    assert!(out.report.cancelled);
}

/// Fires the run token while serving the last page, after its result is ready.
struct CancelsOnServe(CancellationToken);

#[async_trait]
impl ArticleFetcher for CancelsOnServe {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.0.cancel();
        Ok(body("0.3"))
    }

    fn name(&self) -> &'static str {
        "cancels-on-serve"
    }
}

#[tokio::test]
async fn token_fired_after_all_articles_finished_is_not_a_cancelled_run() {
    let cancel = CancellationToken::new();
    let analyzer = ArticleAnalyzer::new(
        Arc::new(CancelsOnServe(cancel.clone())),
        Arc::new(MarkupText::new()),
        Arc::new(Tagged),
    );
    let out = BatchDriver::new(analyzer)
        .run(&aapl(), &refs(&["only"]), 0, &cancel)
        .await;

    assert!(cancel.is_cancelled());
    assert_eq!(out.series.sentiments(), vec![0.3]);
    assert_eq!(out.report.skipped_for("cancelled"), 0);
    assert!(!out.report.cancelled);
}
