//! Caller identity for routes that run before an agent is known.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::Utc;
use clawdbar_core::error::CoreError;
use clawdbar_core::rate_limit::RateCategory;

use crate::error::AppError;
use crate::state::AppState;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity used when neither a proxy header nor the peer address is known.
/// Every such caller shares one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The client address: the first `X-Forwarded-For` hop when the proxy is
/// trusted, otherwise the TCP peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// Spend one request from this caller's bucket for `category`.
    pub fn limit(&self, state: &AppState, category: RateCategory) -> Result<(), AppError> {
        let decision = state.ip_limiter.check(&self.0, category, Utc::now());
        if decision.allowed {
            Ok(())
        } else {
            Err(CoreError::RateLimited(decision).into())
        }
    }
}

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if state.config.trust_forwarded_for {
            if let Some(ip) = forwarded_for(&parts.headers) {
                return Ok(ClientIp(ip));
            }
        }

        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Ok(ClientIp(ip))
    }
}

/// First non-empty entry of `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .map(str::to_string)
}
