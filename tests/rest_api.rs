//! REST API integration tests. Spawn the server and call endpoints with reqwest.

use dealer::app;
use dealer::audit::InMemoryAuditSink;
use dealer::config::Config;
use dealer::MemoryStore;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

async fn spawn_app() -> (SocketAddr, InMemoryAuditSink) {
    let _ = env_logger::try_init();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let audit = InMemoryAuditSink::new();
    let app = app::start(&Config::default(), Arc::new(MemoryStore::new()), Arc::new(audit.clone()))
        .await
        .unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.router.into_make_service()).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, audit)
}

async fn post_order(client: &reqwest::Client, addr: SocketAddr, body: Value) -> reqwest::Response {
    client
        .post(format!("http://{}/v1/order", addr))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn book(client: &reqwest::Client, addr: SocketAddr) -> Value {
    client
        .get(format!("http://{}/v1/book", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn status_returns_ok() {
    let (addr, _) = spawn_app().await;
    let response = reqwest::get(format!("http://{}/status", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn new_limit_order_rests_and_gets_an_id() {
    let (addr, audit) = spawn_app().await;
    let client = reqwest::Client::new();
    let response = post_order(
        &client,
        addr,
        json!({ "side": "sell", "quantity": 5, "price_kind": "limit", "limit_price": "100" }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["order"]["id"], 1);
    assert_eq!(body["order"]["remaining_quantity"], 5);
    assert_eq!(body["deals"], json!([]));

    let snapshot = book(&client, addr).await;
    assert_eq!(snapshot["asks"][0]["id"], 1);
    assert_eq!(audit.actions(), vec!["order_submit".to_string()]);
}

#[tokio::test]
async fn market_buy_fills_against_resting_sell() {
    let (addr, _) = spawn_app().await;
    let client = reqwest::Client::new();
    post_order(
        &client,
        addr,
        json!({ "side": "sell", "quantity": 2, "price_kind": "limit", "limit_price": "10" }),
    )
    .await;
    let response = post_order(&client, addr, json!({ "side": "buy", "quantity": 1, "price_kind": "market" })).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["order"]["remaining_quantity"], 0);
    assert_eq!(body["deals"][0]["quantity"], 1);
    assert_eq!(body["deals"][0]["price"], "10");
    assert_eq!(body["deals"][0]["maker_order_id"], 1);
    assert_eq!(body["deals"][0]["taker_order_id"], 2);

    let snapshot = book(&client, addr).await;
    assert_eq!(snapshot["asks"][0]["remaining_quantity"], 1);
    assert_eq!(snapshot["bids"], json!([]));
    assert_eq!(snapshot["last_traded_price"], "10");

    let deals: Value = client
        .get(format!("http://{}/v1/deals", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deals.as_array().map(|d| d.len()), Some(1));
}

#[tokio::test]
async fn invalid_side_returns_400() {
    let (addr, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let response = post_order(&client, addr, json!({ "side": "hold", "quantity": 1, "price_kind": "market" })).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("invalid side"));
}

#[tokio::test]
async fn limit_without_price_returns_400() {
    let (addr, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let response = post_order(&client, addr, json!({ "side": "buy", "quantity": 1, "price_kind": "limit" })).await;
    assert_eq!(response.status(), 400);
    let snapshot = book(&client, addr).await;
    assert_eq!(snapshot["bids"], json!([]));
}

#[tokio::test]
async fn malformed_body_returns_400_json() {
    let (addr, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let response = post_order(&client, addr, json!({ "side": "buy", "price_kind": "market" })).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("quantity"));

    let response = post_order(
        &client,
        addr,
        json!({ "side": "buy", "quantity": "lots", "price_kind": "market" }),
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn market_order_before_first_trade_is_rejected_and_withdrawn() {
    let (addr, _) = spawn_app().await;
    let client = reqwest::Client::new();
    post_order(&client, addr, json!({ "side": "sell", "quantity": 1, "price_kind": "market" })).await;
    let response = post_order(&client, addr, json!({ "side": "buy", "quantity": 1, "price_kind": "market" })).await;
    assert_eq!(response.status(), 409);

    let stored: Value = client
        .get(format!("http://{}/v1/order/2", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["cancel_requested"], true);
    let snapshot = book(&client, addr).await;
    assert_eq!(snapshot["bids"], json!([]));
    assert_eq!(snapshot["asks"][0]["id"], 1);
}

#[tokio::test]
async fn cancel_removes_resting_order_through_the_queue() {
    let (addr, audit) = spawn_app().await;
    let client = reqwest::Client::new();
    post_order(
        &client,
        addr,
        json!({ "side": "sell", "quantity": 1, "price_kind": "limit", "limit_price": "10" }),
    )
    .await;
    post_order(
        &client,
        addr,
        json!({ "side": "buy", "quantity": 1, "price_kind": "limit", "limit_price": "5" }),
    )
    .await;

    let response = client
        .delete(format!("http://{}/v1/order/1", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["cancelled"], true);

    let mut snapshot = book(&client, addr).await;
    for _ in 0..50 {
        if snapshot["asks"] == json!([]) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        snapshot = book(&client, addr).await;
    }
    assert_eq!(snapshot["asks"], json!([]));
    assert_eq!(snapshot["bids"][0]["id"], 2);

    let stored: Value = client
        .get(format!("http://{}/v1/order/1", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["cancel_requested"], true);
    assert!(audit.actions().contains(&"order_cancel".to_string()));
}

#[tokio::test]
async fn cancel_unknown_order_is_not_an_error() {
    let (addr, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let response = client
        .delete(format!("http://{}/v1/order/999", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unknown_order_returns_404() {
    let (addr, _) = spawn_app().await;
    let response = reqwest::get(format!("http://{}/v1/order/42", addr)).await.unwrap();
    assert_eq!(response.status(), 404);
}
