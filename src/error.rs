//! Typed errors and HTTP mapping.

use crate::response::{messages, Envelope};
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    MissingRequired(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: table {table} column {column}")]
    InvalidPrimaryKey { table: String, column: String },
    #[error("duplicate table definition: {0}")]
    DuplicateTable(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("store: {0}")]
    Store(StoreError),
    #[error("auth service: {0}")]
    Upstream(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { table, .. } => AppError::Conflict(format!("{} record already exists", table)),
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Config(_) | AppError::Store(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Config(_) | AppError::Store(_) | AppError::Upstream(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, error) = if status.is_server_error() {
            // Internal detail stays in the log.
            tracing::error!(error = %self, "request failed");
            (messages::ERROR.to_string(), "internal server error".to_string())
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
            (self.to_string(), self.code().to_string())
        };
        let body: Envelope<()> = Envelope {
            success: false,
            data: None,
            message,
            error: Some(error),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: AppError = StoreError::UniqueViolation {
            table: "store_skus".into(),
            detail: "duplicate key".into(),
        }
        .into();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_store_faults_are_internal() {
        let err: AppError = StoreError::UnknownColumn {
            table: "skus".into(),
            column: "colour".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::NotFound("SKU 'K9'".into());
        assert_eq!(err.to_string(), "SKU 'K9' not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("Admin access required".into()).status(), StatusCode::FORBIDDEN);
    }
}
