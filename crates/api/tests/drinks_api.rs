//! HTTP-level tests for the menu and ordering endpoints.

mod common;

use axum::http::StatusCode;
use clawdbar_core::money::Usdc;
use common::{body_json, drink_named, get, house_bar, post_json, post_json_as, register, seat_agent};
use serde_json::json;

#[tokio::test]
async fn menu_lists_every_drink_cheapest_first() {
    let (_store, app) = house_bar();

    let response = get(&app, "/api/drinks").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let drinks = json["drinks"].as_array().unwrap();
    assert_eq!(drinks.len(), 8);
    assert_eq!(drinks[0]["name"], "Token Lager");
    assert_eq!(drinks[0]["type"], "beer");
    assert_eq!(drinks[0]["price_usdc"], 1.0);

    let prices: Vec<f64> = drinks.iter().map(|d| d["price_usdc"].as_f64().unwrap()).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn ordering_without_a_key_is_unauthorized() {
    let (store, app) = house_bar();
    let lager = drink_named(&store, "Token Lager").await;

    let response = post_json(&app, "/api/drinks/order", json!({ "drink_id": lager.id })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(
        json["error"],
        "Invalid or missing API key. Include X-Agent-Key header."
    );
}

#[tokio::test]
async fn unknown_key_is_unauthorized() {
    let (store, app) = house_bar();
    let lager = drink_named(&store, "Token Lager").await;

    let response = post_json_as(
        &app,
        "/api/drinks/order",
        "clwdbar_notarealkeynotarealkeynotareal",
        json!({ "drink_id": lager.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_beer_is_free_then_the_tab_is_empty() {
    let (store, app) = house_bar();
    let lager = drink_named(&store, "Token Lager").await;
    let (_agent, key) = register(&app, "Newcomer").await;

    let response = post_json_as(
        &app,
        "/api/drinks/order",
        &key,
        json!({ "drink_id": lager.id, "mood": "curious" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["order_id"].is_string());
    assert_eq!(json["drink"]["name"], "Token Lager");
    assert_eq!(json["balance_remaining"], 0.0);
    assert_eq!(json["first_drink_promotion"], true);
    assert!(json["message"].as_str().unwrap().contains("on the house"));

    let response = post_json_as(&app, "/api/drinks/order", &key, json!({ "drink_id": lager.id })).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INSUFFICIENT_BALANCE");
    assert_eq!(json["error"], "Insufficient balance");
    assert_eq!(json["required"], 1.0);
    assert_eq!(json["current"], 0.0);
    assert_eq!(json["first_drink_available"], false);
    assert!(json["hint"].is_string());
}

#[tokio::test]
async fn unaffordable_drink_keeps_the_promotion_open() {
    let (store, app) = house_bar();
    let stout = drink_named(&store, "Gradient Descent Stout").await;
    let (agent, key) = seat_agent(&store, "Broke", Usdc::from_cents(50)).await;

    let response = post_json_as(&app, "/api/drinks/order", &key, json!({ "drink_id": stout.id })).await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let json = body_json(response).await;
    assert_eq!(json["required"], 3.0);
    assert_eq!(json["current"], 0.5);
    assert_eq!(json["first_drink_available"], true);
    assert_eq!(
        json["hint"],
        "Your first beer is free! Order a beer instead, or deposit USDC to your wallet."
    );
    assert!(store.orders().await.iter().all(|o| o.agent_id != agent.id));
}

#[tokio::test]
async fn paid_order_debits_the_balance() {
    let (store, app) = house_bar();
    let stout = drink_named(&store, "Gradient Descent Stout").await;
    let (agent, key) = seat_agent(&store, "Regular", Usdc::from_cents(500)).await;

    let response = post_json_as(
        &app,
        "/api/drinks/order",
        &key,
        json!({ "drink_id": stout.id, "reason": "long day of inference" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["balance_remaining"], 2.0);
    assert!(json.get("first_drink_promotion").is_none());

    let orders = store.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].agent_id, agent.id);
    assert_eq!(orders[0].paid_by, agent.id);
    assert_eq!(orders[0].price_paid, Usdc::from_cents(300));
    assert_eq!(orders[0].reason.as_deref(), Some("long day of inference"));
}

#[tokio::test]
async fn unknown_or_malformed_drink_ids_are_rejected() {
    let (store, app) = house_bar();
    let (_agent, key) = seat_agent(&store, "Picky", Usdc::from_cents(500)).await;

    let response = post_json_as(
        &app,
        "/api/drinks/order",
        &key,
        json!({ "drink_id": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Drink not found");

    let response = post_json_as(&app, "/api/drinks/order", &key, json!({ "drink_id": "house-special" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = post_json_as(&app, "/api/drinks/order", &key, json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "drink_id is required");
}

#[tokio::test]
async fn wrongly_typed_order_body_is_a_validation_error() {
    let (store, app) = house_bar();
    let (_agent, key) = seat_agent(&store, "Typo", Usdc::from_cents(500)).await;

    let response = post_json_as(&app, "/api/drinks/order", &key, json!({ "drink_id": 123 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request"));
    assert!(store.orders().await.is_empty());
}
