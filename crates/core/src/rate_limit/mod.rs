//! Token-bucket rate limiting.
//!
//! - [`bucket`] holds the pure refill/consume arithmetic.
//! - [`ephemeral`] keeps buckets in process memory, keyed by caller identity
//!   (usually the client IP) for unauthenticated routes.
//! - [`persisted`] keeps one bucket per agent and category in the store.
//!
//! All three share the policy table below.

pub mod bucket;
pub mod ephemeral;
pub mod persisted;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

pub use bucket::{BucketState, RateLimitDecision};
pub use ephemeral::EphemeralRateLimiter;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A named group of endpoints sharing one rate policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateCategory {
    Register,
    Deposit,
    Order,
    Message,
    Action,
    Read,
}

impl RateCategory {
    pub const ALL: [RateCategory; 6] = [
        RateCategory::Register,
        RateCategory::Deposit,
        RateCategory::Order,
        RateCategory::Message,
        RateCategory::Action,
        RateCategory::Read,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RateCategory::Register => "register",
            RateCategory::Deposit => "deposit",
            RateCategory::Order => "order",
            RateCategory::Message => "message",
            RateCategory::Action => "action",
            RateCategory::Read => "read",
        }
    }

    /// The static policy for this category.
    pub fn policy(self) -> RatePolicy {
        match self {
            RateCategory::Register | RateCategory::Deposit => RatePolicy::per_hour(5.0),
            RateCategory::Order => RatePolicy::per_minute(30.0),
            RateCategory::Message => RatePolicy::per_minute(20.0),
            RateCategory::Action => RatePolicy::per_minute(10.0),
            RateCategory::Read => RatePolicy::per_minute(60.0),
        }
    }
}

impl fmt::Display for RateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RateCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown rate category '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Bucket size, refill speed and per-request cost for one category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePolicy {
    pub max_tokens: f64,
    /// Tokens added per second.
    pub refill_rate: f64,
    pub tokens_per_request: f64,
}

impl RatePolicy {
    /// `n` requests per hour, bursting up to `n`.
    pub fn per_hour(n: f64) -> Self {
        Self {
            max_tokens: n,
            refill_rate: n / 3600.0,
            tokens_per_request: 1.0,
        }
    }

    /// `n` requests per minute, bursting up to `n`.
    pub fn per_minute(n: f64) -> Self {
        Self {
            max_tokens: n,
            refill_rate: n / 60.0,
            tokens_per_request: 1.0,
        }
    }
}

/// Look up a policy by category name. Unknown names have no policy and are
/// treated as unlimited by the limiters.
pub fn policy_for(name: &str) -> Option<(RateCategory, RatePolicy)> {
    name.parse::<RateCategory>().ok().map(|c| (c, c.policy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table_matches_published_limits() {
        let order = RateCategory::Order.policy();
        assert_eq!(order.max_tokens, 30.0);
        assert!((order.refill_rate - 0.5).abs() < f64::EPSILON);

        let register = RateCategory::Register.policy();
        assert_eq!(register.max_tokens, 5.0);
        assert!((register.refill_rate - 5.0 / 3600.0).abs() < f64::EPSILON);

        assert_eq!(RateCategory::Deposit.policy(), register);
        assert_eq!(RateCategory::Message.policy().max_tokens, 20.0);
        assert_eq!(RateCategory::Action.policy().max_tokens, 10.0);
        assert_eq!(RateCategory::Read.policy().refill_rate, 1.0);
    }

    #[test]
    fn every_category_costs_one_token() {
        for category in RateCategory::ALL {
            assert_eq!(category.policy().tokens_per_request, 1.0);
        }
    }

    #[test]
    fn category_names_round_trip() {
        for category in RateCategory::ALL {
            assert_eq!(category.as_str().parse::<RateCategory>().unwrap(), category);
        }
    }

    #[test]
    fn unknown_category_has_no_policy() {
        assert!(policy_for("karaoke").is_none());
        assert!(policy_for("order").is_some());
    }
}
