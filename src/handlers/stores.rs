use super::{page_options, param, text_filters, Params};
use crate::config::STORES;
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
use serde_json::json;

/// `?search=` matches geo; `?geo=` and `?religion=` are exact filters. Paging applies to both.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let svc = &state.services.stores;
    let opts = page_options(&params)?;
    let rows = match param(&params, "search") {
        Some(term) => svc.search_by_geo(term, opts.page()).await?,
        None => {
            let opts = text_filters(opts, &params, &["geo", "religion"]);
            svc.crud().find_all(&opts).await?
        }
    };
    Ok(ok(rows))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.stores.crud().get(&Key::single(id)).await?))
}

pub async fn unique_geos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.stores.unique_geos().await?))
}

pub async fn unique_religions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.stores.unique_religions().await?))
}

pub async fn by_geo(State(state): State<AppState>, Path(geo): Path<String>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.stores.find_by_geo(&geo).await?))
}

pub async fn by_religion(
    State(state): State<AppState>,
    Path(religion): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.services.stores.find_by_religion(&religion).await?))
}

pub async fn count(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let filters = text_filters(Default::default(), &params, &["geo", "religion"]).filters;
    let n = state.services.stores.crud().count(&filters).await?;
    Ok(ok(json!({ "count": n })))
}

pub async fn create(State(state): State<AppState>, body: JsonObject) -> Result<impl IntoResponse, AppError> {
    let row = RequestValidator::validate(&STORES, body.into_row())?;
    let store = state.services.stores.crud().create(row).await?;
    Ok(created(store, "Store created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let patch = RequestValidator::validate_partial(&STORES, body.into_row())?;
    let store = state.services.stores.crud().update(&Key::single(id), patch).await?;
    Ok(ok_with(store, "Store updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    state.services.stores.crud().delete(&Key::single(id)).await?;
    Ok(done("Store deleted successfully"))
}
