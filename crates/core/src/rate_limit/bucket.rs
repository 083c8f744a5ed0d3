//! Pure token-bucket arithmetic. No storage, no clocks: the caller supplies
//! the prior state and the current time.

use chrono::Duration;
use serde::Serialize;

use crate::rate_limit::RatePolicy;
use crate::types::Timestamp;

/// How far back an agent's first request pretends its last one was.
pub const UNSEEN_AGENT_LOOKBACK_SECS: i64 = 60;

/// `remaining` reported for categories without a policy.
pub const UNLIMITED_REMAINING: u32 = u32::MAX;

/// Tokens left in a bucket as of `last_update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketState {
    pub tokens: f64,
    pub last_update: Timestamp,
}

impl BucketState {
    /// A bucket filled to capacity at `now`.
    pub fn full(policy: &RatePolicy, now: Timestamp) -> Self {
        Self {
            tokens: policy.max_tokens,
            last_update: now,
        }
    }

    /// Starting state for an agent with nothing stored for a category.
    pub fn unseen_agent(policy: &RatePolicy, now: Timestamp) -> Self {
        Self {
            tokens: policy.max_tokens,
            last_update: now - Duration::seconds(UNSEEN_AGENT_LOOKBACK_SECS),
        }
    }

    /// Tokens available at `now` after refilling, capped at the policy max.
    ///
    /// A `now` earlier than `last_update` (clock skew) refills nothing.
    pub fn available(&self, policy: &RatePolicy, now: Timestamp) -> f64 {
        let elapsed_ms = (now - self.last_update).num_milliseconds().max(0);
        let refill = elapsed_ms as f64 / 1000.0 * policy.refill_rate;
        (self.tokens + refill).min(policy.max_tokens)
    }
}

/// Outcome of a rate-limit check, mapped onto `X-RateLimit-*` headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Seconds until the next request is allowed (on denial) or until the
    /// bucket is full again (on success).
    pub reset_in_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RateLimitDecision {
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: UNLIMITED_REMAINING,
            reset_in_secs: 0,
            error: None,
        }
    }

    /// Fail-closed denial used when the agent's state cannot be read.
    pub fn agent_not_found() -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_in_secs: 60,
            error: Some("Agent not found".to_string()),
        }
    }
}

/// A decision plus the state to store. `next` is `None` on denial: a
/// denied request never changes the bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: RateLimitDecision,
    pub next: Option<BucketState>,
}

/// Refill `state` up to `now` and try to take one request's worth of tokens.
pub fn evaluate(policy: &RatePolicy, state: &BucketState, now: Timestamp) -> Evaluation {
    let current = state.available(policy, now);

    if current < policy.tokens_per_request {
        let wait = ceil_secs((policy.tokens_per_request - current) / policy.refill_rate);
        return Evaluation {
            decision: RateLimitDecision {
                allowed: false,
                remaining: floor_tokens(current),
                reset_in_secs: wait,
                error: Some(format!(
                    "Rate limit exceeded. Try again in {wait} seconds."
                )),
            },
            next: None,
        };
    }

    let tokens = current - policy.tokens_per_request;
    Evaluation {
        decision: RateLimitDecision {
            allowed: true,
            remaining: floor_tokens(tokens),
            reset_in_secs: ceil_secs((policy.max_tokens - tokens) / policy.refill_rate),
            error: None,
        },
        next: Some(BucketState {
            tokens,
            last_update: now,
        }),
    }
}

fn floor_tokens(tokens: f64) -> u32 {
    tokens.floor().max(0.0) as u32
}

fn ceil_secs(secs: f64) -> u64 {
    secs.ceil().max(0.0) as u64
}
