//! Per-agent rate limiting backed by the store.
//!
//! Each `(agent, category)` pair has its own bucket row. Writes are
//! compare-and-swap against the state that was read, so two concurrent
//! requests cannot both spend the same token. Any store failure denies the
//! request.

use crate::rate_limit::bucket::{self, BucketState, RateLimitDecision};
use crate::rate_limit::{policy_for, RateCategory};
use crate::store::{RateLimitStore, StoredBucket};
use crate::types::{DbId, Timestamp};

/// Attempts before giving up on a bucket that keeps changing underneath us.
pub const MAX_SWAP_ATTEMPTS: usize = 3;

/// Check and consume one request for `agent_id` under `category`.
pub async fn check<S>(
    store: &S,
    agent_id: DbId,
    category: RateCategory,
    now: Timestamp,
) -> RateLimitDecision
where
    S: RateLimitStore + ?Sized,
{
    let policy = category.policy();

    for attempt in 1..=MAX_SWAP_ATTEMPTS {
        let stored = match store.load_bucket(agent_id, category).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, %agent_id, %category, "Failed to load rate limit state");
                return RateLimitDecision::agent_not_found();
            }
        };

        let (prior, expected) = match stored {
            StoredBucket::UnknownAgent => {
                tracing::warn!(%agent_id, %category, "Rate limit check for unknown agent");
                return RateLimitDecision::agent_not_found();
            }
            StoredBucket::Empty => (BucketState::unseen_agent(&policy, now), None),
            StoredBucket::Present(state) => (state, Some(state)),
        };

        let eval = bucket::evaluate(&policy, &prior, now);
        let Some(next) = eval.next else {
            tracing::debug!(%agent_id, %category, remaining = eval.decision.remaining, "Rate limited");
            return eval.decision;
        };

        match store
            .swap_bucket(agent_id, category, expected.as_ref(), &next)
            .await
        {
            Ok(true) => return eval.decision,
            Ok(false) => {
                tracing::debug!(%agent_id, %category, attempt, "Rate limit state changed concurrently, retrying");
            }
            Err(e) => {
                tracing::error!(error = %e, %agent_id, %category, "Failed to store rate limit state");
                return RateLimitDecision::agent_not_found();
            }
        }
    }

    tracing::warn!(%agent_id, %category, "Rate limit state contended, denying request");
    RateLimitDecision {
        allowed: false,
        remaining: 0,
        reset_in_secs: 1,
        error: Some("Too many concurrent requests. Try again in 1 seconds.".to_string()),
    }
}

/// Like [`check`] but by category name; unknown names are unlimited.
pub async fn check_named<S>(
    store: &S,
    agent_id: DbId,
    category: &str,
    now: Timestamp,
) -> RateLimitDecision
where
    S: RateLimitStore + ?Sized,
{
    match policy_for(category) {
        Some((category, _)) => check(store, agent_id, category, now).await,
        None => RateLimitDecision::unlimited(),
    }
}
