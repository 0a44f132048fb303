// src/limiter.rs
//! Token-bucket request limiter.
//!
//! Allows `capacity` requests per `interval`, refilled continuously. One bucket
//! is shared (via `Arc`) by every concurrent fetch of a run, so the sustained
//! rate holds regardless of how many workers are in flight or how long each
//! request takes.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    /// Tokens per second.
    refill_rate: f64,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// `requests` per `interval`; both are floored at 1 (request, millisecond).
    pub fn new(requests: u32, interval: Duration) -> Self {
        let capacity = requests.max(1) as f64;
        let secs = interval.max(Duration::from_millis(1)).as_secs_f64();
        Self {
            capacity,
            refill_rate: capacity / secs,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    fn refill(&self, st: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(st.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            st.tokens = (st.tokens + elapsed * self.refill_rate).min(self.capacity);
            st.last_refill = now;
        }
    }

    /// Take a token if one is available right now.
    pub async fn try_acquire(&self) -> bool {
        let mut st = self.state.lock().await;
        self.refill(&mut st, Instant::now());
        if st.tokens >= 1.0 {
            st.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait until a token is available, then take it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut st = self.state.lock().await;
                self.refill(&mut st, Instant::now());
                if st.tokens >= 1.0 {
                    st.tokens -= 1.0;
                    return;
                }
                Duration::from_secs_f64((1.0 - st.tokens) / self.refill_rate)
            };
            debug!(target: "fetch", wait_ms = wait.as_millis() as u64, "rate limited, waiting for token");
            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }
}
