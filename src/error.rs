use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

use crate::types::Collection;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Value \"{value}\" does not exist in collection \"{collection}\".")]
    NotExist { value: i64, collection: Collection },

    #[error("Duplicate value \"{value}\" found in collection \"{collection}\".")]
    DuplicateValue { value: String, collection: Collection },

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body returned to API clients for any failed request.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Stable name of the failure class, as exposed in `ErrorBody::error`.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotExist { .. } => "NotExistError",
            AppError::DuplicateValue { .. } => "DuplicateValueError",
            AppError::Validation(_) => "ValidationError",
            AppError::Database(_) => "DatabaseError",
            AppError::Migration(_) => "MigrationError",
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) => "IoError",
        }
    }

    /// Maps an error to the status code and body the boundary layer should send.
    pub fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        let status = match self {
            AppError::DuplicateValue { .. } | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotExist { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, body)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!(kind = body.error, "Request failed: {}", body.message);
        }
        (status, Json(body)).into_response()
    }
}
