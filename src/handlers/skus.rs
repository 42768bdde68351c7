use super::{int_param, page_options, param, Params};
use crate::config::SKUS;
use crate::error::AppError;
use crate::extractors::{batch_items, JsonObject};
use crate::query::Key;
use crate::response::{created, done, ok, ok_with};
use crate::service::{RequestValidator, SHORT_SHELF_LIFE_DAYS};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

/// `?search=` (name substring) or `?shelf_life_min=&shelf_life_max=`, else a plain list. `limit`/`offset` apply to all three.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let svc = &state.services.skus;
    let opts = page_options(&params)?;
    let min: Option<i32> = int_param(&params, "shelf_life_min")?;
    let max: Option<i32> = int_param(&params, "shelf_life_max")?;
    let rows = if let Some(term) = param(&params, "search") {
        svc.search_by_name(term, opts.page()).await?
    } else if min.is_some() || max.is_some() {
        svc.find_by_shelf_life_range(min.unwrap_or(0), max.unwrap_or(i32::MAX), opts.page())
            .await?
    } else {
        svc.crud().find_all(&opts).await?
    };
    Ok(ok(rows))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let row = state.services.skus.crud().get(&Key::single(id)).await?;
    Ok(ok(row))
}

pub async fn by_name(State(state): State<AppState>, Path(name): Path<String>) -> Result<impl IntoResponse, AppError> {
    let row = state
        .services
        .skus
        .find_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("SKU named '{}'", name)))?;
    Ok(ok(row))
}

pub async fn short_shelf_life(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let max_days: i32 = int_param(&params, "max_days")?.unwrap_or(SHORT_SHELF_LIFE_DAYS);
    Ok(ok(state.services.skus.short_shelf_life(max_days).await?))
}

pub async fn count(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let n = state.services.skus.crud().count(&[]).await?;
    Ok(ok(json!({ "count": n })))
}

pub async fn create(State(state): State<AppState>, body: JsonObject) -> Result<impl IntoResponse, AppError> {
    let row = RequestValidator::validate(&SKUS, body.into_row())?;
    let sku = state.services.skus.crud().create(row).await?;
    Ok(created(sku, "SKU created successfully"))
}

pub async fn batch(State(state): State<AppState>, JsonObject(mut body): JsonObject) -> Result<impl IntoResponse, AppError> {
    let rows = RequestValidator::validate_batch(&SKUS, batch_items(&mut body, "skus")?)?;
    let skus = state.services.skus.crud().create_many(rows).await?;
    let message = format!("{} SKUs created successfully", skus.len());
    Ok(created(skus, message))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let patch = RequestValidator::validate_partial(&SKUS, body.into_row())?;
    let sku = state.services.skus.crud().update(&Key::single(id), patch).await?;
    Ok(ok_with(sku, "SKU updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    state.services.skus.crud().delete(&Key::single(id)).await?;
    Ok(done("SKU deleted successfully"))
}
