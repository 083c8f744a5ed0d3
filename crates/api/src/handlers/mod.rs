//! HTTP handlers, one module per resource. Each handler delegates to
//! `clawdbar_core` and only adds extraction, rate gating and status codes.

pub mod agents;
pub mod bar;
pub mod drinks;
pub mod messages;
pub mod wallet;
