use super::{date_param, int_param, page_options, param, parse_int, text_filters, Params};
use crate::config::SALES_DATA;
use crate::error::AppError;
use crate::extractors::{batch_items, JsonObject};
use crate::response::{created, done, ok, ok_with};
use crate::service::{DateRange, RequestValidator, SalesFilter, SalesKey};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};

type KeyPath = Path<(String, String, String, String)>;

fn sales_key((store_id, sku_id, year, day): (String, String, String, String)) -> Result<SalesKey, AppError> {
    Ok(SalesKey {
        store_id,
        sku_id,
        year: parse_int("year", &year)?,
        day: parse_int("day", &day)?,
    })
}

/// `year`, `start_date`+`end_date`, `store_id`, `sku_id`, `type_of_day`, `limit`.
fn sales_filter(params: &Params) -> Result<SalesFilter, AppError> {
    let date_range = match (date_param(params, "start_date")?, date_param(params, "end_date")?) {
        (Some(start), Some(end)) => Some(DateRange {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => None,
    };
    Ok(SalesFilter {
        year: int_param(params, "year")?,
        date_range,
        store_id: param(params, "store_id").map(str::to_string),
        sku_id: param(params, "sku_id").map(str::to_string),
        type_of_day: param(params, "type_of_day").map(str::to_string),
        limit: int_param(params, "limit")?,
    })
}

/// With both `start_date` and `end_date` the date-range read applies; otherwise a paged list.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let svc = &state.services.sales_data;
    let mut filter = sales_filter(&params)?;
    let rows = match filter.date_range.take() {
        Some(range) => svc.find_by_date_range(&range.start, &range.end, &filter).await?,
        None => {
            let mut opts = text_filters(page_options(&params)?, &params, &["store_id", "sku_id", "type_of_day"]);
            if let Some(year) = filter.year {
                opts = opts.filter("year", year);
            }
            svc.list(&opts).await?
        }
    };
    Ok(ok(rows))
}

pub async fn get(State(state): State<AppState>, Path(parts): KeyPath) -> Result<impl IntoResponse, AppError> {
    let key = sales_key(parts)?;
    let row = state
        .services
        .sales_data
        .find_by_key(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sales data '{}'", key.to_key().display())))?;
    Ok(ok(row))
}

pub async fn by_store(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let filter = sales_filter(&params)?;
    Ok(ok(state.services.sales_data.find_by_store(&store_id, &filter).await?))
}

pub async fn by_sku(
    State(state): State<AppState>,
    Path(sku_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let filter = sales_filter(&params)?;
    Ok(ok(state.services.sales_data.find_by_sku(&sku_id, &filter).await?))
}

pub async fn by_type_of_day(
    State(state): State<AppState>,
    Path(type_of_day): Path<String>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let filter = sales_filter(&params)?;
    Ok(ok(state
        .services
        .sales_data
        .find_by_type_of_day(&type_of_day, &filter)
        .await?))
}

pub async fn store_analytics(
    State(state): State<AppState>,
    Path(store_id): Path<String>,
    Query(params): Query<Params>,
) -> Result<impl IntoResponse, AppError> {
    let filter = sales_filter(&params)?;
    Ok(ok(state.services.sales_data.store_analytics(&store_id, &filter).await?))
}

/// Counters omitted from the body default to 0.
pub async fn create(State(state): State<AppState>, body: JsonObject) -> Result<impl IntoResponse, AppError> {
    let row = RequestValidator::validate(&SALES_DATA, body.into_row())?;
    let record = state.services.sales_data.create(row).await?;
    Ok(created(record, "Sales data created successfully"))
}

/// Every element is validated before anything is inserted.
pub async fn batch(State(state): State<AppState>, JsonObject(mut body): JsonObject) -> Result<impl IntoResponse, AppError> {
    let rows = RequestValidator::validate_batch(&SALES_DATA, batch_items(&mut body, "salesDataArray")?)?;
    let records = state.services.sales_data.create_many(rows).await?;
    let message = format!("{} sales data records created successfully", records.len());
    Ok(created(records, message))
}

pub async fn update(
    State(state): State<AppState>,
    Path(parts): KeyPath,
    body: JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let key = sales_key(parts)?;
    let patch = RequestValidator::validate_partial(&SALES_DATA, body.into_row())?;
    let record = state.services.sales_data.update(&key, patch).await?;
    Ok(ok_with(record, "Sales data updated successfully"))
}

pub async fn delete(State(state): State<AppState>, Path(parts): KeyPath) -> Result<impl IntoResponse, AppError> {
    let key = sales_key(parts)?;
    state.services.sales_data.delete(&key).await?;
    Ok(done("Sales data deleted successfully"))
}
