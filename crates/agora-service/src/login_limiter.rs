//! Login-failure lockout.
//!
//! A bounded counter with TTL semantics, keyed by user id: five
//! consecutive failed attempts lock the account for fifteen minutes,
//! counted from the *first* failure of the streak; a successful login
//! clears the streak.  State is process-local and shared across request
//! workers; the only synchronization is the map's own mutex.
//!
//! Credential verification itself lives in the auth stack: callers
//! report outcomes here and ask whether an account is currently locked.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

/// Failures tolerated before the lockout engages.
pub const MAX_FAILURES: u32 = 5;
/// How long a streak (and therefore a lockout) lasts.
pub const LOCKOUT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct FailureStreak {
    count: u32,
    /// When the streak stops counting, fixed at the first failure.
    expires_at: Instant,
}

impl FailureStreak {
    fn expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Per-user login failure tracker.
#[derive(Clone)]
pub struct LoginLimiter {
    streaks: Arc<Mutex<HashMap<i64, FailureStreak>>>,
    max_failures: u32,
    window: Duration,
}

impl LoginLimiter {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            streaks: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window,
        }
    }

    /// If the user is currently locked out, how long until the lock
    /// lifts.
    pub async fn locked_remaining(&self, user_id: i64) -> Option<Duration> {
        let now = Instant::now();
        let streaks = self.streaks.lock().await;
        let streak = streaks.get(&user_id)?;
        if streak.expired(now) || streak.count < self.max_failures {
            return None;
        }
        Some(streak.expires_at - now)
    }

    /// Record a failed attempt.  Returns how many attempts remain before
    /// the lockout engages (zero once locked).
    pub async fn record_failure(&self, user_id: i64) -> u32 {
        let now = Instant::now();
        let mut streaks = self.streaks.lock().await;
        let streak = streaks
            .entry(user_id)
            .and_modify(|s| {
                if s.expired(now) {
                    // Stale streak from a previous window: start over.
                    s.count = 1;
                    s.expires_at = now + self.window;
                } else {
                    s.count += 1;
                }
            })
            .or_insert(FailureStreak {
                count: 1,
                expires_at: now + self.window,
            });

        if streak.count >= self.max_failures {
            warn!(user_id, failures = streak.count, "login lockout engaged");
            0
        } else {
            self.max_failures - streak.count
        }
    }

    /// Record a successful login: the streak is forgiven.
    pub async fn record_success(&self, user_id: i64) {
        self.streaks.lock().await.remove(&user_id);
    }

    /// Drop expired streaks.  Run periodically; correctness does not
    /// depend on it (expiry is checked on read), it only bounds memory.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.streaks.lock().await.retain(|_, s| !s.expired(now));
    }
}

impl Default for LoginLimiter {
    fn default() -> Self {
        Self::new(MAX_FAILURES, LOCKOUT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn locks_after_max_failures() {
        let limiter = LoginLimiter::default();

        for expected_remaining in (1..MAX_FAILURES).rev() {
            assert_eq!(limiter.record_failure(7).await, expected_remaining);
            assert!(limiter.locked_remaining(7).await.is_none());
        }

        assert_eq!(limiter.record_failure(7).await, 0);
        let remaining = limiter.locked_remaining(7).await.expect("locked");
        assert!(remaining <= LOCKOUT_WINDOW);

        // Other users are unaffected.
        assert!(limiter.locked_remaining(8).await.is_none());
    }

    #[tokio::test]
    async fn success_resets_the_streak() {
        let limiter = LoginLimiter::default();

        for _ in 0..4 {
            limiter.record_failure(7).await;
        }
        limiter.record_success(7).await;

        // Full allowance again.
        assert_eq!(limiter.record_failure(7).await, MAX_FAILURES - 1);
        assert!(limiter.locked_remaining(7).await.is_none());
    }

    #[tokio::test]
    async fn lock_expires_with_the_window() {
        let limiter = LoginLimiter::new(2, Duration::from_millis(20));

        limiter.record_failure(7).await;
        limiter.record_failure(7).await;
        assert!(limiter.locked_remaining(7).await.is_some());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.locked_remaining(7).await.is_none());

        // A failure after expiry starts a fresh streak.
        assert_eq!(limiter.record_failure(7).await, 1);
    }

    #[tokio::test]
    async fn purge_drops_expired_streaks_only() {
        let limiter = LoginLimiter::new(5, Duration::from_millis(10));
        limiter.record_failure(1).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.record_failure(2).await;
        limiter.purge_expired().await;

        let streaks = limiter.streaks.lock().await;
        assert!(!streaks.contains_key(&1));
        assert!(streaks.contains_key(&2));
    }
}
