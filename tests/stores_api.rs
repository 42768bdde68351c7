mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

fn ids(body: &Value, key: &str) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r[key].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn store_crud() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/stores", json!({"store_id": "S1", "geo": "New York"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Store created successfully");
    assert!(body["data"]["religion"].is_null());

    let (status, body) = app
        .write(Method::PUT, "/api/stores/S1", Some(json!({"religion": "Christian"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["religion"], "Christian");

    let (status, _) = app
        .write(Method::PUT, "/api/stores/S1", Some(json!({"geo": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.write(Method::DELETE, "/api/stores/S1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/stores/S1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn geo_and_religion_lookups() {
    let app = TestApp::new();
    for (id, geo, religion) in [
        ("S1", "New York", Some("Christian")),
        ("S2", "Los Angeles", Some("Jewish")),
        ("S3", "New York", None),
    ] {
        let mut body = json!({"store_id": id, "geo": geo});
        if let Some(r) = religion {
            body["religion"] = json!(r);
        }
        let (status, _) = app.post("/api/stores", body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get("/api/stores/filter/geo/New%20York").await;
    assert_eq!(ids(&body, "store_id"), vec!["S1", "S3"]);

    let (_, body) = app.get("/api/stores/geo/unique").await;
    assert_eq!(body["data"], json!(["Los Angeles", "New York"]));

    let (_, body) = app.get("/api/stores/religion/unique").await;
    assert_eq!(body["data"], json!(["Christian", "Jewish"]));

    let (_, body) = app.get("/api/stores?search=york").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/stores/count?geo=New%20York").await;
    assert_eq!(body["data"]["count"], 2);
}

#[tokio::test]
async fn deleting_a_store_cascades() {
    let app = TestApp::new();
    app.seed_basics().await;
    let (status, _) = app
        .post(
            "/api/sales-data",
            json!({"store_id": "S1", "sku_id": "K1", "year": 2024, "day": 1, "date": "2024-01-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.write(Method::DELETE, "/api/stores/S1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/store-skus/store/S1").await;
    assert_eq!(body["data"], json!([]));
    let (_, body) = app.get("/api/sales-data/store/S1").await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn geo_search_pages() {
    let app = TestApp::new();
    for (id, geo) in [("S1", "New York"), ("S2", "York"), ("S3", "Yorkshire")] {
        app.post("/api/stores", json!({"store_id": id, "geo": geo})).await;
    }
    let (_, body) = app.get("/api/stores?search=york&limit=1&offset=2").await;
    assert_eq!(ids(&body, "store_id"), vec!["S3"]);
}
