//! JSON object body with rejections rendered as the standard error envelope.

use crate::case::object_keys_to_snake_case;
use crate::error::AppError;
use crate::store::Row;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde_json::{Map, Value};

/// Request body that must be a JSON object. Keys are left as sent.
#[derive(Debug, Clone)]
pub struct JsonObject(pub Map<String, Value>);

impl JsonObject {
    /// Keys normalized to column spelling (snake_case).
    pub fn into_row(self) -> Row {
        object_keys_to_snake_case(self.0)
    }
}

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match value {
            Value::Object(m) => Ok(JsonObject(m)),
            _ => Err(AppError::BadRequest("request body must be a JSON object".into())),
        }
    }
}

/// Array under `key`, each element an object with snake_case keys. Empty or missing is a 400.
pub fn batch_items(body: &mut Map<String, Value>, key: &str) -> Result<Vec<Row>, AppError> {
    let items = match body.remove(key) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(AppError::Validation(format!("{} is required", key))),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(m) => Ok(object_keys_to_snake_case(m)),
            _ => Err(AppError::Validation(format!("record {}: must be an object", i))),
        })
        .collect()
}
