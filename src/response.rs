//! Standard response envelope: `{ success, data?, message, error? }`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub mod messages {
    pub const SUCCESS: &str = "Operation successful";
    pub const ERROR: &str = "An error occurred";
    pub const UNAUTHORIZED: &str = "Unauthorized access";
}

#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type Reply<T> = (StatusCode, Json<Envelope<T>>);

fn reply<T: Serialize>(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Reply<T> {
    (
        status,
        Json(Envelope {
            success: true,
            data,
            message: message.into(),
            error: None,
        }),
    )
}

/// 200 with the generic success message.
pub fn ok<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::OK, Some(data), messages::SUCCESS)
}

pub fn ok_with<T: Serialize>(data: T, message: impl Into<String>) -> Reply<T> {
    reply(StatusCode::OK, Some(data), message)
}

pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> Reply<T> {
    reply(StatusCode::CREATED, Some(data), message)
}

/// 200 without a payload (deletes, sign-out).
pub fn done(message: impl Into<String>) -> Reply<()> {
    reply(StatusCode::OK, None, message)
}
