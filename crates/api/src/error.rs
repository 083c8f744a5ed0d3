use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use clawdbar_core::error::CoreError;
use serde_json::json;

pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent `{error, code}` JSON
/// bodies. Balance and rate-limit failures add their own fields and headers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `clawdbar_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body that is not valid JSON for the target type.
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let core = match self {
            AppError::Core(core) => core,
            AppError::JsonBody(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                let body = json!({
                    "error": format!("Invalid request: {}", rejection.body_text()),
                    "code": "VALIDATION_ERROR",
                });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
        };
        let (status, code, message) = classify_core_error(&core);

        let mut body = json!({
            "error": message,
            "code": code,
        });

        match core {
            CoreError::InsufficientBalance(shortfall) => {
                body["required"] = json!(shortfall.required);
                body["current"] = json!(shortfall.current);
                if let Some(available) = shortfall.first_drink_available {
                    body["first_drink_available"] = json!(available);
                }
                body["hint"] = json!(shortfall.hint());
                (status, Json(body)).into_response()
            }
            CoreError::RateLimited(decision) => {
                let mut response = (status, Json(body)).into_response();
                let headers = response.headers_mut();
                headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
                headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_in_secs));
                response
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}

/// Map a [`CoreError`] to an HTTP status, error code, and client-facing message.
///
/// Internal errors are logged here and replaced with a generic message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, .. } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::InsufficientBalance(shortfall) => (
            StatusCode::PAYMENT_REQUIRED,
            "INSUFFICIENT_BALANCE",
            shortfall.error_message().to_string(),
        ),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::RateLimited(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            err.to_string(),
        ),
        CoreError::NoDrinksAvailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "NO_DRINKS_AVAILABLE",
            err.to_string(),
        ),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
