use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::{Result, TravelAgentError};

/// Sliding-window limiter keyed by caller identity. Process-local: a
/// multi-process deployment needs a shared store instead.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    ledger: Mutex<Ledger>,
}

struct Ledger {
    requests: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl Ledger {
    /// Drops every key whose requests all fell out of the window.
    fn sweep(&mut self, now: Instant, window: Duration) {
        self.requests.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
        self.last_sweep = now;
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while timestamps
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) >= window)
    {
        timestamps.pop_front();
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(u64::from(window_seconds)),
            ledger: Mutex::new(Ledger {
                requests: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Records one request for `key`, or fails once `key` already made
    /// `max_requests` requests inside the window.
    pub async fn check_rate_limit(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let mut ledger = self.ledger.lock().await;
        if now.saturating_duration_since(ledger.last_sweep) >= self.window {
            ledger.sweep(now, self.window);
        }

        let timestamps = ledger.requests.entry(key.to_string()).or_default();
        prune(timestamps, now, self.window);

        if timestamps.len() >= self.max_requests as usize {
            return Err(TravelAgentError::RateLimit {
                limit: self.max_requests,
                window_seconds: self.window.as_secs() as u32,
            });
        }
        timestamps.push_back(now);
        Ok(())
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.ledger.lock().await.requests.len()
    }
}
