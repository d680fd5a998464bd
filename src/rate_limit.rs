//! Sliding-window request limiter for outbound provider calls.
//!
//! Constructed explicitly with its thresholds; the caller supplies `now`, so
//! tests drive time directly instead of resetting global state.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    hits: HashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: HashMap::new(),
        }
    }

    /// Record an attempt for `key` at `now` and return whether it is within
    /// budget. Expired entries are dropped as a side effect.
    pub fn check(&mut self, key: &str, now: Instant) -> bool {
        let q = self.hits.entry(key.to_string()).or_default();
        while let Some(front) = q.front() {
            if now.duration_since(*front) >= self.window {
                q.pop_front();
            } else {
                break;
            }
        }
        if q.len() as u32 >= self.max_requests {
            return false;
        }
        q.push_back(now);
        true
    }

    /// Requests still available for `key` at `now`, without recording one.
    pub fn remaining(&self, key: &str, now: Instant) -> u32 {
        let used = self
            .hits
            .get(key)
            .map(|q| {
                q.iter()
                    .filter(|t| now.duration_since(**t) < self.window)
                    .count() as u32
            })
            .unwrap_or(0);
        self.max_requests.saturating_sub(used)
    }
}
