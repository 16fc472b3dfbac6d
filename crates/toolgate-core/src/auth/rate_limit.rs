//! Sliding-window rate limiting
//!
//! Per-key lists of request instants, trimmed to the trailing window on
//! every check. Rejected requests are not recorded, so a storm of
//! rejections cannot extend the window. Each credential can carry its own
//! limit; anonymous callers are keyed by network origin.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use toolgate_domain::RateLimitSpec;
use tracing::warn;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// The request budget for the window
    pub limit: u32,
    /// Requests remaining in the window after this one
    pub remaining: u32,
    /// When the caller's window resets
    pub reset_at: DateTime<Utc>,
}

/// Sliding-window request counter keyed by credential or origin
pub struct SlidingWindowLimiter {
    enabled: bool,
    windows: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl SlidingWindowLimiter {
    /// Create a new limiter
    ///
    /// When disabled, every check passes and no state is kept.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Check and record a request for a key
    ///
    /// Atomic read-trim-append under the write lock: concurrent requests
    /// sharing a credential can neither undercount nor overcount.
    pub fn check_and_record(&self, key: &str, spec: RateLimitSpec) -> RateDecision {
        self.check_at(key, spec, Utc::now())
    }

    /// The check against an explicit clock (tests drive this directly)
    fn check_at(&self, key: &str, spec: RateLimitSpec, now: DateTime<Utc>) -> RateDecision {
        let window = Duration::milliseconds(i64::try_from(spec.window_ms).unwrap_or(i64::MAX));

        if !self.enabled {
            return RateDecision {
                allowed: true,
                limit: spec.max_requests,
                remaining: spec.max_requests,
                reset_at: now + window,
            };
        }

        let Ok(mut windows) = self.windows.write() else {
            warn!("Rate limiter lock poisoned, allowing request");
            return RateDecision {
                allowed: true,
                limit: spec.max_requests,
                remaining: spec.max_requests,
                reset_at: now + window,
            };
        };

        let instants = windows.entry(key.to_string()).or_default();
        let cutoff = now - window;
        instants.retain(|t| *t > cutoff);

        if instants.len() >= spec.max_requests as usize {
            // reject without recording, so rejected calls don't extend the window
            let oldest = instants.first().copied().unwrap_or(now);
            return RateDecision {
                allowed: false,
                limit: spec.max_requests,
                remaining: 0,
                reset_at: oldest + window,
            };
        }

        instants.push(now);
        let remaining = spec.max_requests - u32::try_from(instants.len()).unwrap_or(u32::MAX);
        RateDecision {
            allowed: true,
            limit: spec.max_requests,
            remaining,
            reset_at: now + window,
        }
    }

    /// Drop keys with no instant newer than the given horizon
    ///
    /// Call periodically to bound memory across many one-off callers.
    pub fn cleanup(&self, horizon: Duration) {
        let Ok(mut windows) = self.windows.write() else {
            warn!("Rate limiter lock poisoned, cannot cleanup");
            return;
        };
        let cutoff = Utc::now() - horizon;
        windows.retain(|_, instants| instants.iter().any(|t| *t > cutoff));
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.read().map(|w| w.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(max_requests: u32, window_ms: u64) -> RateLimitSpec {
        RateLimitSpec {
            max_requests,
            window_ms,
        }
    }

    #[test]
    fn test_fourth_request_in_window_rejected() {
        let limiter = SlidingWindowLimiter::new(true);
        let spec = spec(3, 1000);
        let t0 = Utc::now();

        assert!(limiter.check_at("k", spec, t0).allowed);
        assert!(limiter.check_at("k", spec, t0 + Duration::milliseconds(100)).allowed);
        assert!(limiter.check_at("k", spec, t0 + Duration::milliseconds(200)).allowed);

        let rejected = limiter.check_at("k", spec, t0 + Duration::milliseconds(300));
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        // reset derives from the oldest surviving instant
        assert_eq!(rejected.reset_at, t0 + Duration::milliseconds(1000));
    }

    #[test]
    fn test_allowed_again_after_window_elapses() {
        let limiter = SlidingWindowLimiter::new(true);
        let spec = spec(3, 1000);
        let t0 = Utc::now();

        for offset in [0, 100, 200] {
            assert!(limiter.check_at("k", spec, t0 + Duration::milliseconds(offset)).allowed);
        }
        assert!(!limiter.check_at("k", spec, t0 + Duration::milliseconds(300)).allowed);

        // once the first instants age out, requests are admitted again
        let later = t0 + Duration::milliseconds(1500);
        assert!(limiter.check_at("k", spec, later).allowed);
    }

    #[test]
    fn test_rejections_do_not_extend_window() {
        let limiter = SlidingWindowLimiter::new(true);
        let spec = spec(1, 1000);
        let t0 = Utc::now();

        assert!(limiter.check_at("k", spec, t0).allowed);
        // hammer with rejected requests inside the window
        for offset in [100, 300, 500, 700, 900] {
            assert!(!limiter.check_at("k", spec, t0 + Duration::milliseconds(offset)).allowed);
        }
        // the original instant still expires on schedule
        assert!(limiter.check_at("k", spec, t0 + Duration::milliseconds(1001)).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = SlidingWindowLimiter::new(true);
        let spec = spec(1, 1000);
        let t0 = Utc::now();

        assert!(limiter.check_at("a", spec, t0).allowed);
        assert!(!limiter.check_at("a", spec, t0).allowed);
        assert!(limiter.check_at("b", spec, t0).allowed);
    }

    #[test]
    fn test_disabled_limiter_keeps_no_state() {
        let limiter = SlidingWindowLimiter::new(false);
        let spec = spec(1, 1000);
        let t0 = Utc::now();

        for _ in 0..10 {
            assert!(limiter.check_at("k", spec, t0).allowed);
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = SlidingWindowLimiter::new(true);
        let spec = spec(3, 1000);
        let t0 = Utc::now();

        assert_eq!(limiter.check_at("k", spec, t0).remaining, 2);
        assert_eq!(limiter.check_at("k", spec, t0).remaining, 1);
        assert_eq!(limiter.check_at("k", spec, t0).remaining, 0);
    }

    #[test]
    fn test_cleanup_drops_stale_keys() {
        let limiter = SlidingWindowLimiter::new(true);
        let spec = spec(3, 50);
        limiter.check_and_record("stale", spec);

        std::thread::sleep(std::time::Duration::from_millis(60));
        limiter.cleanup(Duration::milliseconds(50));
        assert_eq!(limiter.tracked_keys(), 0);
    }
}
