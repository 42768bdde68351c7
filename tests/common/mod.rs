use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use inventory_api::auth::{AuthError, AuthResponse, AuthUser, Session};
use inventory_api::{app, AppConfig, AppState, AuthProvider, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const USER_TOKEN: &str = "user-token";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Auth double: two fixed tokens, sign-in accepts any password except "wrong".
pub struct StubAuth;

fn stub_user(token: &str) -> Option<AuthUser> {
    let (id, role) = match token {
        USER_TOKEN => ("00000000-0000-0000-0000-000000000001", "user"),
        ADMIN_TOKEN => ("00000000-0000-0000-0000-000000000002", "admin"),
        _ => return None,
    };
    Some(AuthUser {
        id: id.to_string(),
        email: Some(format!("{}@example.com", role)),
        user_metadata: json!({ "role": role }),
    })
}

#[async_trait]
impl AuthProvider for StubAuth {
    async fn sign_up(&self, email: &str, _password: &str, metadata: Value) -> Result<AuthResponse, AuthError> {
        Ok(AuthResponse {
            user: Some(AuthUser {
                id: "00000000-0000-0000-0000-000000000003".into(),
                email: Some(email.to_string()),
                user_metadata: metadata,
            }),
            session: None,
        })
    }

    async fn sign_in(&self, _email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        if password == "wrong" {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(AuthResponse {
            user: stub_user(USER_TOKEN),
            session: Some(Session {
                access_token: USER_TOKEN.into(),
                token_type: Some("bearer".into()),
                expires_in: Some(3600),
                refresh_token: None,
            }),
        })
    }

    async fn sign_out(&self, _token: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError> {
        stub_user(token).ok_or(AuthError::InvalidToken)
    }
}

/// Full router over an in-memory store and the stub auth provider.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Extra environment entries on top of a dummy `DATABASE_URL`.
    pub fn with_env(pairs: &[(&str, &str)]) -> Self {
        let mut env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        env.insert("DATABASE_URL".into(), "postgres://localhost/inventory_test".into());
        env.entry("APP_ENV".into()).or_insert_with(|| "test".into());
        let config = AppConfig::from_lookup(|k| env.get(k).cloned()).expect("test config");
        let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(StubAuth), config);
        TestApp {
            router: app(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }

    #[allow(dead_code)]
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    /// Write as the plain user.
    #[allow(dead_code)]
    pub async fn write(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, body, Some(USER_TOKEN)).await
    }

    #[allow(dead_code)]
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.write(Method::POST, uri, Some(body)).await
    }

    /// Two SKUs, two stores, and the S1/K1 link.
    #[allow(dead_code)]
    pub async fn seed_basics(&self) {
        for body in [
            json!({"sku_id": "K1", "name": "Milk 1L", "shelf_life_days": 7}),
            json!({"sku_id": "K2", "name": "Bread Loaf", "shelf_life_days": 3}),
        ] {
            let (status, _) = self.post("/api/skus", body).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        for body in [
            json!({"store_id": "S1", "geo": "New York", "religion": "Christian"}),
            json!({"store_id": "S2", "geo": "Los Angeles", "religion": "Jewish"}),
        ] {
            let (status, _) = self.post("/api/stores", body).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _) = self
            .post("/api/store-skus", json!({"store_id": "S1", "sku_id": "K1"}))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
