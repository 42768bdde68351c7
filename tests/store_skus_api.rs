mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn links_carry_their_parents() {
    let app = TestApp::new();
    app.seed_basics().await;

    let (status, body) = app.get("/api/store-skus/store/S1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["sku_id"], "K1");
    assert_eq!(body["data"][0]["skus"]["name"], "Milk 1L");

    let (_, body) = app.get("/api/store-skus/sku/K1").await;
    assert_eq!(body["data"][0]["stores"]["geo"], "New York");

    let (_, body) = app.get("/api/store-skus/exists/S1/K1").await;
    assert_eq!(body["data"]["exists"], true);
    let (_, body) = app.get("/api/store-skus/exists/S2/K1").await;
    assert_eq!(body["data"]["exists"], false);
}

#[tokio::test]
async fn duplicate_pair_conflicts() {
    let app = TestApp::new();
    app.seed_basics().await;
    let (status, body) = app
        .post("/api/store-skus", json!({"store_id": "S1", "sku_id": "K1"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Store-SKU relationship already exists");
}

#[tokio::test]
async fn missing_parent_is_a_server_error() {
    let app = TestApp::new();
    app.seed_basics().await;
    let (status, body) = app
        .post("/api/store-skus", json!({"store_id": "S9", "sku_id": "K1"}))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal server error");
}

#[tokio::test]
async fn batch_and_counts() {
    let app = TestApp::new();
    app.seed_basics().await;
    let (status, body) = app
        .post(
            "/api/store-skus/batch",
            json!({"relationships": [{"store_id": "S1", "sku_id": "K2"}, {"store_id": "S2", "sku_id": "K1"}]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "2 Store-SKU relationships created successfully");

    let (_, body) = app.get("/api/store-skus/analytics/sku-count-by-store").await;
    assert_eq!(
        body["data"],
        json!([
            {"store_id": "S1", "store_info": {"geo": "New York", "religion": "Christian"}, "sku_count": 2},
            {"store_id": "S2", "store_info": {"geo": "Los Angeles", "religion": "Jewish"}, "sku_count": 1}
        ])
    );

    let (_, body) = app.get("/api/store-skus?limit=2&offset=2").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unlink() {
    let app = TestApp::new();
    app.seed_basics().await;
    let (status, body) = app.write(Method::DELETE, "/api/store-skus/S1/K1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Store-SKU relationship deleted successfully");
    let (_, body) = app.get("/api/store-skus/exists/S1/K1").await;
    assert_eq!(body["data"]["exists"], false);
}
