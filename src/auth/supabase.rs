//! GoTrue-compatible REST client (`{base}/auth/v1/...`).

use super::{AuthError, AuthProvider, AuthResponse, AuthUser, Session};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

pub struct SupabaseAuth {
    base_url: String,
    api_key: String,
    http: Client,
}

impl SupabaseAuth {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        SupabaseAuth {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<(StatusCode, Value), AuthError> {
        let resp = req
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            return Ok((status, Value::Null));
        }
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        if status.is_server_error() {
            return Err(AuthError::Upstream(format!("{} {}", status.as_u16(), error_message(&body))));
        }
        Ok((status, body))
    }
}

/// GoTrue reports errors under several keys depending on the endpoint.
fn error_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .unwrap_or("request rejected")
        .to_string()
}

fn parse_user(v: &Value) -> Option<AuthUser> {
    serde_json::from_value(v.clone()).ok()
}

/// Token responses carry the session at top level and the user under `user`;
/// unconfirmed sign-ups return the bare user.
fn parse_auth_response(body: &Value) -> AuthResponse {
    let session: Option<Session> = body
        .get("access_token")
        .and_then(|_| serde_json::from_value(body.clone()).ok());
    let user = match body.get("user") {
        Some(u) => parse_user(u),
        None => parse_user(body),
    };
    AuthResponse { user, session }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<AuthResponse, AuthError> {
        let req = self
            .http
            .post(self.url("signup"))
            .json(&json!({"email": email, "password": password, "data": metadata}));
        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            return Err(AuthError::Rejected(error_message(&body)));
        }
        tracing::info!(email, "user registered");
        Ok(parse_auth_response(&body))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let req = self
            .http
            .post(self.url("token?grant_type=password"))
            .json(&json!({"email": email, "password": password}));
        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            tracing::debug!(email, status = status.as_u16(), "sign-in refused");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(parse_auth_response(&body))
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let req = self.http.post(self.url("logout")).bearer_auth(token);
        let (status, _) = self.send(req).await?;
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::InvalidToken),
            _ => Err(AuthError::Rejected(format!("sign-out failed with {}", status.as_u16()))),
        }
    }

    async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError> {
        let req = self.http.get(self.url("user")).bearer_auth(token);
        let (status, body) = self.send(req).await?;
        if !status.is_success() {
            return Err(AuthError::InvalidToken);
        }
        parse_user(&body).ok_or_else(|| AuthError::Upstream("malformed user payload".into()))
    }
}
