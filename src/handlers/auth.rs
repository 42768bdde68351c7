//! Thin delegation to the auth provider.

use crate::error::AppError;
use crate::extractors::{BearerToken, CurrentUser, JsonObject};
use crate::response::{created, done, ok, ok_with};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use serde_json::{Map, Value};

fn credentials(body: &mut Map<String, Value>) -> Result<(String, String), AppError> {
    let take = |body: &mut Map<String, Value>, k: &str| match body.remove(k) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    };
    match (take(body, "email"), take(body, "password")) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AppError::Validation("Email and password are required".into())),
    }
}

/// Fields other than email and password become user metadata.
pub async fn sign_up(State(state): State<AppState>, JsonObject(mut body): JsonObject) -> Result<impl IntoResponse, AppError> {
    let (email, password) = credentials(&mut body)?;
    let result = state.auth.sign_up(&email, &password, Value::Object(body)).await?;
    Ok(created(result, "User registered successfully"))
}

pub async fn sign_in(State(state): State<AppState>, JsonObject(mut body): JsonObject) -> Result<impl IntoResponse, AppError> {
    let (email, password) = credentials(&mut body)?;
    let result = state.auth.sign_in(&email, &password).await?;
    Ok(ok_with(result, "User signed in successfully"))
}

pub async fn sign_out(State(state): State<AppState>, BearerToken(token): BearerToken) -> Result<impl IntoResponse, AppError> {
    state.auth.sign_out(&token).await?;
    Ok(done("User signed out successfully"))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    ok(user)
}
