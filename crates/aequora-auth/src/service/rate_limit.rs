//! Login attempt rate limiting
//!
//! Failed logins are counted per key (the normalised email). Reaching the
//! limit inside the window locks the key out for the lockout duration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Authentication rate limiter configuration
#[derive(Clone, Debug)]
pub struct AuthRateLimitConfig {
    /// Maximum failed attempts per window
    pub max_attempts: u32,
    /// Time window duration for attempt counting
    pub window_duration: Duration,
    /// Lockout duration after exceeding max attempts
    pub lockout_duration: Duration,
    /// Whether auth rate limiting is enabled
    pub enabled: bool,
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_duration: Duration::from_secs(60),
            lockout_duration: Duration::from_secs(300), // 5 minutes lockout
            enabled: true,
        }
    }
}

/// Outcome of a limiter check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub allowed: bool,
    pub remaining: u32,
    pub lockout_secs: u64,
}

impl AttemptOutcome {
    fn allowed(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            lockout_secs: 0,
        }
    }

    fn locked(lockout_secs: u64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            lockout_secs,
        }
    }
}

/// Entry tracking failed login attempts
struct AttemptEntry {
    failures: u32,
    first_failure: Instant,
    locked_until: Option<Instant>,
}

impl AttemptEntry {
    fn new() -> Self {
        Self {
            failures: 0,
            first_failure: Instant::now(),
            locked_until: None,
        }
    }

    fn remaining_lockout_secs(&self, now: Instant) -> Option<u64> {
        match self.locked_until {
            // Round up so a locked key never reports zero seconds
            Some(until) if now < until => Some((until - now).as_secs().max(1)),
            _ => None,
        }
    }

    fn reset_if_window_passed(&mut self, now: Instant, window: Duration) {
        if self.locked_until.is_none() && now.duration_since(self.first_failure) >= window {
            self.failures = 0;
            self.first_failure = now;
        }
    }
}

/// Authentication rate limiter for protecting the login endpoint
pub struct AuthRateLimiter {
    entries: DashMap<String, AttemptEntry>,
    config: AuthRateLimitConfig,
}

impl AuthRateLimiter {
    pub fn new(config: AuthRateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(AuthRateLimitConfig::default())
    }

    /// Check whether a login attempt may proceed for `key`
    pub fn check(&self, key: &str) -> AttemptOutcome {
        if !self.config.enabled {
            return AttemptOutcome::allowed(self.config.max_attempts);
        }

        let now = Instant::now();
        let Some(mut entry) = self.entries.get_mut(key) else {
            return AttemptOutcome::allowed(self.config.max_attempts);
        };

        if let Some(secs) = entry.remaining_lockout_secs(now) {
            return AttemptOutcome::locked(secs);
        }

        if entry.locked_until.is_some() {
            // Lockout elapsed
            *entry = AttemptEntry::new();
        }
        entry.reset_if_window_passed(now, self.config.window_duration);

        AttemptOutcome::allowed(self.config.max_attempts.saturating_sub(entry.failures))
    }

    /// Record a failed login
    pub fn record_failure(&self, key: &str) -> AttemptOutcome {
        if !self.config.enabled {
            return AttemptOutcome::allowed(self.config.max_attempts);
        }

        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(AttemptEntry::new);

        if let Some(secs) = entry.remaining_lockout_secs(now) {
            return AttemptOutcome::locked(secs);
        }

        if entry.locked_until.is_some() {
            *entry = AttemptEntry::new();
        }
        entry.reset_if_window_passed(now, self.config.window_duration);
        if entry.failures == 0 {
            entry.first_failure = now;
        }

        entry.failures += 1;

        if entry.failures >= self.config.max_attempts {
            entry.locked_until = Some(now + self.config.lockout_duration);
            tracing::warn!(
                key = %key,
                lockout_secs = self.config.lockout_duration.as_secs(),
                "Login rate limit exceeded"
            );
            return AttemptOutcome::locked(self.config.lockout_duration.as_secs());
        }

        AttemptOutcome::allowed(self.config.max_attempts - entry.failures)
    }

    /// Record a successful login (resets the failure counter)
    pub fn record_success(&self, key: &str) {
        if !self.config.enabled {
            return;
        }

        self.entries.remove(key);
    }

    /// Drop entries that are neither locked nor inside their window
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.config.window_duration;

        self.entries.retain(|_, entry| {
            entry.remaining_lockout_secs(now).is_some()
                || (entry.locked_until.is_none() && now.duration_since(entry.first_failure) < window)
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cleanup interval for limiter entries (5 minutes)
const CLEANUP_INTERVAL_SECS: u64 = 300;

/// Start a background task that periodically drops stale limiter entries
pub fn start_cleanup_task(limiter: Arc<AuthRateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            limiter.cleanup();
            tracing::debug!(entries = limiter.len(), "Login rate limiter cleanup completed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_attempts: u32) -> AuthRateLimiter {
        AuthRateLimiter::new(AuthRateLimitConfig {
            max_attempts,
            window_duration: Duration::from_secs(60),
            lockout_duration: Duration::from_secs(300),
            enabled: true,
        })
    }

    #[test]
    fn test_locks_after_max_failures() {
        let limiter = limiter(3);

        assert!(limiter.check("a@b.com").allowed);
        assert_eq!(limiter.record_failure("a@b.com"), AttemptOutcome::allowed(2));
        assert_eq!(limiter.record_failure("a@b.com"), AttemptOutcome::allowed(1));

        let outcome = limiter.record_failure("a@b.com");
        assert!(!outcome.allowed);
        assert_eq!(outcome.lockout_secs, 300);

        let outcome = limiter.check("a@b.com");
        assert!(!outcome.allowed);
        assert!(outcome.lockout_secs > 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1);

        assert!(!limiter.record_failure("a@b.com").allowed);
        assert!(limiter.check("c@d.com").allowed);
    }

    #[test]
    fn test_success_resets_counter() {
        let limiter = limiter(3);

        limiter.record_failure("a@b.com");
        limiter.record_failure("a@b.com");
        limiter.record_success("a@b.com");

        assert_eq!(limiter.check("a@b.com"), AttemptOutcome::allowed(3));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = AuthRateLimiter::new(AuthRateLimitConfig {
            max_attempts: 1,
            enabled: false,
            ..Default::default()
        });

        for _ in 0..10 {
            assert!(limiter.record_failure("a@b.com").allowed);
        }
        assert!(limiter.check("a@b.com").allowed);
    }

    #[test]
    fn test_window_expiry_resets_failures() {
        let limiter = AuthRateLimiter::new(AuthRateLimitConfig {
            max_attempts: 2,
            window_duration: Duration::from_millis(20),
            lockout_duration: Duration::from_secs(300),
            enabled: true,
        });

        assert!(limiter.record_failure("a@b.com").allowed);
        std::thread::sleep(Duration::from_millis(40));

        // The earlier failure fell out of the window
        assert!(limiter.record_failure("a@b.com").allowed);
    }

    #[test]
    fn test_cleanup_keeps_locked_entries() {
        let limiter = AuthRateLimiter::new(AuthRateLimitConfig {
            max_attempts: 1,
            window_duration: Duration::from_millis(10),
            lockout_duration: Duration::from_secs(300),
            enabled: true,
        });

        limiter.record_failure("locked@b.com");
        std::thread::sleep(Duration::from_millis(30));
        limiter.cleanup();

        assert_eq!(limiter.len(), 1);
        assert!(!limiter.check("locked@b.com").allowed);
    }
}
