//! In-process rate limiting for callers without an agent identity.
//!
//! Buckets live in memory keyed by `(identity, category)` and are lost on
//! restart. The limiter is owned by the application state and swept by a
//! background task; it is not shared between server processes, so running
//! several replicas multiplies the effective limit.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::rate_limit::bucket::{self, BucketState, RateLimitDecision};
use crate::rate_limit::{policy_for, RateCategory};
use crate::types::Timestamp;

/// Entries untouched for longer than this are dropped by [`EphemeralRateLimiter::sweep`].
pub const STALE_AFTER: Duration = Duration::from_secs(3600); // 1 hour

/// How often the background sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

type BucketKey = (String, RateCategory);

#[derive(Debug, Default)]
pub struct EphemeralRateLimiter {
    buckets: Mutex<HashMap<BucketKey, BucketState>>,
}

impl EphemeralRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and consume one request for `identity` under `category`.
    ///
    /// A key seen for the first time starts with a full bucket. The lock is
    /// held across the read and the write so concurrent requests for the
    /// same key cannot both spend the same token.
    pub fn check(
        &self,
        identity: &str,
        category: RateCategory,
        now: Timestamp,
    ) -> RateLimitDecision {
        let policy = category.policy();
        let key = (identity.to_string(), category);

        let mut buckets = self.lock();
        let state = buckets
            .get(&key)
            .copied()
            .unwrap_or_else(|| BucketState::full(&policy, now));

        let eval = bucket::evaluate(&policy, &state, now);
        if let Some(next) = eval.next {
            buckets.insert(key, next);
        } else {
            tracing::debug!(identity, %category, "Ephemeral rate limit denied");
        }
        eval.decision
    }

    /// Like [`check`](Self::check) but by category name; unknown names are
    /// unlimited.
    pub fn check_named(&self, identity: &str, category: &str, now: Timestamp) -> RateLimitDecision {
        match policy_for(category) {
            Some((category, _)) => self.check(identity, category, now),
            None => RateLimitDecision::unlimited(),
        }
    }

    /// Drop every entry whose last update is more than `max_age` before
    /// `now`. Returns how many entries were removed.
    pub fn sweep(&self, now: Timestamp, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let mut buckets = self.lock();
        let before = buckets.len();
        buckets.retain(|_, state| now - state.last_update <= max_age);
        before - buckets.len()
    }

    /// Number of tracked `(identity, category)` pairs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The map holds plain values, so a panic mid-update cannot leave it
    // half-written; keep serving after poisoning.
    fn lock(&self) -> MutexGuard<'_, HashMap<BucketKey, BucketState>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
