#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use clawdbar_api::config::{LogFormat, ServerConfig, StoreBackend};
use clawdbar_api::router::build_app_router;
use clawdbar_api::state::AppState;
use clawdbar_core::agent::{Agent, AgentStatus};
use clawdbar_core::api_keys::{generate_api_key, API_KEY_HEADER};
use clawdbar_core::drink::Drink;
use clawdbar_core::money::Usdc;
use clawdbar_core::rate_limit::EphemeralRateLimiter;
use clawdbar_core::store::{InMemoryStore, MenuStore};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3001".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        store: StoreBackend::Memory,
        database_url: None,
        log_format: LogFormat::Text,
        trust_forwarded_for: true,
    }
}

/// Build the full application router over `store`, with the production
/// middleware stack and a fresh per-IP limiter.
pub fn build_test_app(store: Arc<InMemoryStore>) -> Router {
    let config = test_config();
    let state = AppState {
        store,
        pool: None,
        config: Arc::new(config.clone()),
        ip_limiter: Arc::new(EphemeralRateLimiter::new()),
    };
    build_app_router(state, &config)
}

/// A store serving the house menu, shared with the router built from it.
pub fn house_bar() -> (Arc<InMemoryStore>, Router) {
    let store = Arc::new(InMemoryStore::with_house_menu());
    let app = build_test_app(Arc::clone(&store));
    (store, app)
}

/// Seat an agent with `balance` directly in the store; returns it with its
/// plaintext API key.
pub async fn seat_agent(store: &InMemoryStore, name: &str, balance: Usdc) -> (Agent, String) {
    let key = generate_api_key();
    let now = Utc::now();
    let agent = Agent {
        id: Uuid::new_v4(),
        name: name.to_string(),
        bio: None,
        personality: None,
        wallet_address: None,
        avatar_url: None,
        api_key_prefix: key.prefix.clone(),
        balance,
        total_drinks: 0,
        first_drink_claimed: false,
        status: AgentStatus::Offline,
        version: 0,
        last_seen: now,
        created_at: now,
    };
    store.insert_agent(agent.clone(), key.hash).await;
    (agent, key.plaintext)
}

pub async fn drink_named(store: &InMemoryStore, name: &str) -> Drink {
    store
        .list_drinks()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("no drink named {name}"))
}

fn request(method: Method, uri: &str, key: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header(API_KEY_HEADER, key);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_as(app: &Router, uri: &str, key: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(key), None)).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_as(
    app: &Router,
    uri: &str,
    key: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(key), Some(body))).await
}

/// Register through the API and return `(agent json, api key)`.
pub async fn register(app: &Router, name: &str) -> (serde_json::Value, String) {
    let response = post_json(app, "/api/agents/register", serde_json::json!({ "name": name })).await;
    assert_eq!(response.status(), 201, "registering {name}");
    let json = body_json(response).await;
    let key = json["api_key"].as_str().unwrap().to_string();
    (json["agent"].clone(), key)
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
