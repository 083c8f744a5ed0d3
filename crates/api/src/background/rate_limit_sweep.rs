//! Periodic eviction of idle per-IP rate-limit buckets.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clawdbar_core::rate_limit::ephemeral::{STALE_AFTER, SWEEP_INTERVAL};
use clawdbar_core::rate_limit::EphemeralRateLimiter;
use tokio_util::sync::CancellationToken;

/// Run the sweep loop every [`SWEEP_INTERVAL`] until `cancel` is triggered.
pub async fn run(limiter: Arc<EphemeralRateLimiter>, cancel: CancellationToken) {
    run_every(limiter, SWEEP_INTERVAL, cancel).await;
}

/// [`run`] with a custom period.
pub async fn run_every(
    limiter: Arc<EphemeralRateLimiter>,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = period.as_secs(),
        stale_after_secs = STALE_AFTER.as_secs(),
        "Rate limit sweep started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Rate limit sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let removed = limiter.sweep(Utc::now(), STALE_AFTER);
                if removed > 0 {
                    tracing::info!(removed, remaining = limiter.len(), "Rate limit sweep: evicted idle buckets");
                } else {
                    tracing::debug!("Rate limit sweep: nothing to evict");
                }
            }
        }
    }
}
