use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const UNKNOWN: u64 = u64::MAX;

/// Request quota and usage accounting for one API client
pub struct RateBudget {
    limiter: DirectRateLimiter,
    requests_made: AtomicU64,
    remaining: AtomicU64,
    used: AtomicU64,
}

impl RateBudget {
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::direct(quota),
            requests_made: AtomicU64::new(0),
            remaining: AtomicU64::new(UNKNOWN),
            used: AtomicU64::new(UNKNOWN),
        }
    }

    /// Wait for a slot in the quota and count the request
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
        self.requests_made.fetch_add(1, Ordering::Relaxed);
    }

    /// Remember the usage headers of the latest response
    pub fn record(&self, headers: &HeaderMap) {
        if let Some(remaining) = header_count(headers, "x-requests-remaining") {
            self.remaining.store(remaining, Ordering::Relaxed);
        }
        if let Some(used) = header_count(headers, "x-requests-used") {
            self.used.store(used, Ordering::Relaxed);
        }
        debug!(
            "API usage: {} made this run, {:?} remaining",
            self.requests_made(),
            self.remaining()
        );
    }

    pub fn requests_made(&self) -> u64 {
        self.requests_made.load(Ordering::Relaxed)
    }

    /// Remaining account quota as last reported by the API
    pub fn remaining(&self) -> Option<u64> {
        known(self.remaining.load(Ordering::Relaxed))
    }

    /// Account-wide usage as last reported by the API
    pub fn used(&self) -> Option<u64> {
        known(self.used.load(Ordering::Relaxed))
    }
}

fn known(value: u64) -> Option<u64> {
    (value != UNKNOWN).then_some(value)
}

// The API sometimes reports usage as a decimal ("12.0")
fn header_count(headers: &HeaderMap, name: &str) -> Option<u64> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    value
        .parse::<u64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|v| v.max(0.0) as u64))
}
