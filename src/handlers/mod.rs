//! HTTP handlers per resource, plus query/path parameter helpers.

pub mod auth;
pub mod sales_data;
pub mod skus;
pub mod store_skus;
pub mod stores;
pub mod users;

use crate::error::AppError;
use crate::query::{OrderBy, QueryOptions};
use crate::store::Row;
use serde_json::Value;
use std::collections::HashMap;

pub type Params = HashMap<String, String>;

/// Non-empty query parameter.
fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_int<T: std::str::FromStr>(name: &str, s: &str) -> Result<T, AppError> {
    s.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))
}

fn int_param<T: std::str::FromStr>(params: &Params, name: &str) -> Result<Option<T>, AppError> {
    param(params, name).map(|s| parse_int(name, s)).transpose()
}

fn date_param<'a>(params: &'a Params, name: &str) -> Result<Option<&'a str>, AppError> {
    match param(params, name) {
        Some(s) if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() => Err(AppError::BadRequest(format!(
            "{} must be a date (YYYY-MM-DD)",
            name
        ))),
        other => Ok(other),
    }
}

/// `limit`, `offset`, `order_by`, `ascending` from the query string.
fn page_options(params: &Params) -> Result<QueryOptions, AppError> {
    let mut opts = QueryOptions::new();
    if let Some(n) = int_param(params, "limit")? {
        opts = opts.limit(n);
    }
    if let Some(n) = int_param(params, "offset")? {
        opts = opts.offset(n);
    }
    if let Some(col) = param(params, "order_by") {
        let ascending = !matches!(param(params, "ascending"), Some("false" | "0"));
        opts = opts.order_by(OrderBy {
            column: col.to_string(),
            ascending,
        });
    }
    Ok(opts)
}

/// Equality filters for the listed text parameters that are present.
fn text_filters(mut opts: QueryOptions, params: &Params, names: &[&str]) -> QueryOptions {
    for name in names {
        if let Some(v) = param(params, name) {
            opts = opts.filter(*name, v);
        }
    }
    opts
}

/// Validated text field of a row.
fn text_field(row: &Row, name: &str) -> String {
    match row.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
