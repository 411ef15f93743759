//! Fixed-window request limiter for the coach endpoint, keyed by user email.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::interval;
use tracing::{debug, info};
use ts_rs::TS;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_REQUESTS: u32 = 15;

/// Structured verdict returned to the caller; the caller renders the
/// user-visible wait-and-retry message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in_seconds: u64,
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    window_ends_at: Instant,
}

/// Process-wide fixed-window limiter.
///
/// The dashmap entry lock makes the check-then-increment sequence atomic per
/// key, which matters on a multi-threaded runtime where two requests for the
/// same email can race.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_requests,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_REQUESTS)
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Clock-injected form of [`check`](Self::check).
    ///
    /// A fresh key, or one whose window has elapsed, resets to count 1 with a
    /// new window end. A denied call does not increment further.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                window_ends_at: now + self.window,
            });

        if now >= entry.window_ends_at {
            entry.count = 0;
            entry.window_ends_at = now + self.window;
        }

        let reset_in_seconds = entry
            .window_ends_at
            .saturating_duration_since(now)
            .as_secs();

        if entry.count >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_in_seconds,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - entry.count,
            reset_in_seconds,
        }
    }

    /// Evict entries whose window has fully elapsed; returns how many
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.window_ends_at);
        before - self.entries.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }

    /// Spawn the background sweeper that bounds key growth over the process
    /// lifetime
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("starting rate limit sweeper with interval {:?}", period);
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let removed = self.sweep_at(Instant::now());
                if removed > 0 {
                    debug!(removed, "evicted expired rate limit entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_window_counts_down_from_fourteen() {
        let limiter = RateLimiter::with_defaults();
        let now = Instant::now();

        for expected_remaining in (0..DEFAULT_MAX_REQUESTS).rev() {
            let decision = limiter.check_at("jan@example.com", now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }
    }

    #[test]
    fn sixteenth_call_in_the_window_is_denied() {
        let limiter = RateLimiter::with_defaults();
        let now = Instant::now();

        for _ in 0..DEFAULT_MAX_REQUESTS {
            assert!(limiter.check_at("jan@example.com", now).allowed);
        }
        let denied = limiter.check_at("jan@example.com", now);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.reset_in_seconds <= DEFAULT_WINDOW.as_secs());

        // denial does not consume the window's budget after reset
        let denied_again = limiter.check_at("jan@example.com", now);
        assert!(!denied_again.allowed);
    }

    #[test]
    fn elapsed_window_resets_lazily() {
        let limiter = RateLimiter::with_defaults();
        let now = Instant::now();

        for _ in 0..=DEFAULT_MAX_REQUESTS {
            limiter.check_at("jan@example.com", now);
        }

        let later = now + DEFAULT_WINDOW + Duration::from_secs(1);
        let decision = limiter.check_at("jan@example.com", later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, DEFAULT_MAX_REQUESTS - 1);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(DEFAULT_WINDOW, 1);
        let now = Instant::now();

        assert!(limiter.check_at("a@example.com", now).allowed);
        assert!(!limiter.check_at("a@example.com", now).allowed);
        assert!(limiter.check_at("b@example.com", now).allowed);
    }

    #[test]
    fn sweep_evicts_only_expired_entries() {
        let limiter = RateLimiter::with_defaults();
        let now = Instant::now();

        limiter.check_at("old@example.com", now);
        let later = now + Duration::from_secs(30);
        limiter.check_at("fresh@example.com", later);
        assert_eq!(limiter.tracked_keys(), 2);

        let removed = limiter.sweep_at(now + DEFAULT_WINDOW + Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys(), 1);

        // the surviving key's window is still live
        let decision = limiter.check_at("fresh@example.com", later);
        assert!(decision.allowed);
    }
}
