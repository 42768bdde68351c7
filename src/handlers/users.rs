//! Profile administration (admin only).

use super::{page_options, param, text_filters, Params};
use crate::config::PROFILES;
use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::query::Key;
use crate::response::{created, done, ok, ok_with};
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

fn profile_key(id: &str) -> Result<Key, AppError> {
    let id = uuid::Uuid::parse_str(id).map_err(|_| AppError::BadRequest("invalid user id".into()))?;
    Ok(Key::single(id.to_string()))
}

/// `?active=true` lists active profiles only.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let svc = &state.services.profiles;
    let rows = if matches!(param(&params, "active"), Some("true" | "1")) {
        svc.active_profiles().await?
    } else {
        let opts = text_filters(page_options(&params)?, &params, &["role", "email", "username"]);
        svc.crud().find_all(&opts).await?
    };
    Ok(ok(rows))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.profiles.crud().get(&profile_key(&id)?).await?))
}

pub async fn create(State(state): State<AppState>, body: JsonObject) -> Result<impl IntoResponse, AppError> {
    let row = RequestValidator::validate(&PROFILES, body.into_row())?;
    let user = state.services.profiles.crud().create(row).await?;
    Ok(created(user, "User created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let key = profile_key(&id)?;
    let patch = RequestValidator::validate_partial(&PROFILES, body.into_row())?;
    let user = state.services.profiles.crud().update(&key, patch).await?;
    Ok(ok_with(user, "User updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    state.services.profiles.crud().delete(&profile_key(&id)?).await?;
    Ok(done("User deleted successfully"))
}
