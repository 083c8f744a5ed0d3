//! Request extractors shared by the handlers.
//!
//! - [`auth::AuthAgent`] -- Resolves the calling agent from the `X-Agent-Key` header.
//! - [`client_ip::ClientIp`] -- Identifies the caller for per-IP rate limits.
//! - [`json_body::JsonBody`] -- JSON body with rejections in the API error format.

pub mod auth;
pub mod client_ip;
pub mod json_body;
