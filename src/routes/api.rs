//! `/api` resources and the full application router.

use super::common::common_routes;
use crate::auth::{guard_writes, require_admin, require_auth};
use crate::handlers::{auth, sales_data, skus, store_skus, stores, users};
use crate::state::AppState;
use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest accepted request body (batch inserts included).
const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

fn sku_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(skus::list).post(skus::create))
        .route("/count", get(skus::count))
        .route("/batch", post(skus::batch))
        .route("/name/:name", get(skus::by_name))
        .route("/filter/short-shelf-life", get(skus::short_shelf_life))
        .route("/:id", get(skus::get).put(skus::update).delete(skus::delete))
}

fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::list).post(stores::create))
        .route("/count", get(stores::count))
        .route("/geo/unique", get(stores::unique_geos))
        .route("/religion/unique", get(stores::unique_religions))
        .route("/filter/geo/:geo", get(stores::by_geo))
        .route("/filter/religion/:religion", get(stores::by_religion))
        .route("/:id", get(stores::get).put(stores::update).delete(stores::delete))
}

fn store_sku_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(store_skus::list).post(store_skus::create))
        .route("/batch", post(store_skus::batch))
        .route("/store/:store_id", get(store_skus::for_store))
        .route("/sku/:sku_id", get(store_skus::for_sku))
        .route("/exists/:store_id/:sku_id", get(store_skus::exists))
        .route("/analytics/sku-count-by-store", get(store_skus::sku_count_by_store))
        .route("/:store_id/:sku_id", axum::routing::delete(store_skus::delete))
}

fn sales_data_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(sales_data::list).post(sales_data::create))
        .route("/batch", post(sales_data::batch))
        .route("/store/:store_id", get(sales_data::by_store))
        .route("/sku/:sku_id", get(sales_data::by_sku))
        .route("/type-of-day/:type_of_day", get(sales_data::by_type_of_day))
        .route("/analytics/store/:store_id", get(sales_data::store_analytics))
        .route(
            "/:store_id/:sku_id/:year/:day",
            get(sales_data::get).put(sales_data::update).delete(sales_data::delete),
        )
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let signed_in = Router::new()
        .route("/signout", post(auth::sign_out))
        .route("/user", get(auth::current_user))
        .route_layer(from_fn_with_state(state.clone(), require_auth));
    Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .merge(signed_in)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/:id", get(users::get).put(users::update).delete(users::delete))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

/// Resources under `/api`. Writes on inventory resources pass through `guard_writes`.
pub fn api_routes(state: AppState) -> Router {
    let inventory = Router::new()
        .nest("/skus", sku_routes())
        .nest("/stores", store_routes())
        .nest("/store-skus", store_sku_routes())
        .nest("/sales-data", sales_data_routes())
        .route_layer(from_fn_with_state(state.clone(), guard_writes));
    Router::new()
        .merge(inventory)
        .nest("/auth", auth_routes(&state))
        .nest("/users", user_routes(&state))
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}

/// Full application: common routes, `/api`, 404 fallback, tracing, CORS and body limit.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
