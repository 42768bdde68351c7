use super::{page_options, text_field, text_filters, Params};
use crate::config::STORE_SKUS;
use crate::error::AppError;
use crate::extractors::{batch_items, JsonObject};
use crate::response::{created, done, ok};
use crate::service::RequestValidator;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let opts = text_filters(page_options(&params)?, &params, &["store_id", "sku_id"]);
    Ok(ok(state.services.store_skus.list(&opts).await?))
}

pub async fn for_store(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.store_skus.skus_for_store(&store_id).await?))
}

pub async fn for_sku(State(state): State<AppState>, Path(sku_id): Path<String>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.store_skus.stores_for_sku(&sku_id).await?))
}

pub async fn exists(
    State(state): State<AppState>,
    Path((store_id, sku_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exists = state.services.store_skus.exists(&store_id, &sku_id).await?;
    Ok(ok(json!({ "exists": exists })))
}

pub async fn sku_count_by_store(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.store_skus.sku_count_by_store().await?))
}

/// A duplicate pair is a 409 from the primary key.
pub async fn create(State(state): State<AppState>, body: JsonObject) -> Result<impl IntoResponse, AppError> {
    let row = RequestValidator::validate(&STORE_SKUS, body.into_row())?;
    let link = state
        .services
        .store_skus
        .create(&text_field(&row, "store_id"), &text_field(&row, "sku_id"))
        .await?;
    Ok(created(link, "Store-SKU relationship created successfully"))
}

pub async fn batch(State(state): State<AppState>, JsonObject(mut body): JsonObject) -> Result<impl IntoResponse, AppError> {
    let rows = RequestValidator::validate_batch(&STORE_SKUS, batch_items(&mut body, "relationships")?)?;
    let links = state.services.store_skus.create_many(rows).await?;
    let message = format!("{} Store-SKU relationships created successfully", links.len());
    Ok(created(links, message))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((store_id, sku_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.services.store_skus.delete(&store_id, &sku_id).await?;
    Ok(done("Store-SKU relationship deleted successfully"))
}
