//! Authentication is delegated to a hosted auth service; this crate only forwards credentials
//! and validates bearer tokens.

mod middleware;
mod supabase;

pub use middleware::{bearer_token, guard_writes, require_admin, require_auth};
pub use supabase::SupabaseAuth;

use crate::error::AppError;
use crate::response::messages;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// User as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    pub fn role(&self) -> Option<&str> {
        self.user_metadata.get("role").and_then(Value::as_str)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some("admin")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Sign-up and sign-in result. Sign-up without auto-confirm yields no session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    /// The auth service refused the request (e.g. user already registered).
    #[error("{0}")]
    Rejected(String),
    #[error("auth service unavailable: {0}")]
    Upstream(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken => AppError::Unauthorized(messages::UNAUTHORIZED.into()),
            AuthError::Rejected(msg) => AppError::BadRequest(msg),
            AuthError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<AuthResponse, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Resolve a bearer token to its user.
    async fn get_user(&self, token: &str) -> Result<AuthUser, AuthError>;
}

/// Stand-in when no auth service is configured: every call fails as unavailable.
pub struct UnconfiguredAuth;

#[async_trait]
impl AuthProvider for UnconfiguredAuth {
    async fn sign_up(&self, _: &str, _: &str, _: Value) -> Result<AuthResponse, AuthError> {
        Err(AuthError::Upstream("SUPABASE_URL is not set".into()))
    }

    async fn sign_in(&self, _: &str, _: &str) -> Result<AuthResponse, AuthError> {
        Err(AuthError::Upstream("SUPABASE_URL is not set".into()))
    }

    async fn sign_out(&self, _: &str) -> Result<(), AuthError> {
        Err(AuthError::Upstream("SUPABASE_URL is not set".into()))
    }

    async fn get_user(&self, _: &str) -> Result<AuthUser, AuthError> {
        Err(AuthError::Upstream("SUPABASE_URL is not set".into()))
    }
}
