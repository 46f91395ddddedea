use axum::{
    Json,
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// AppError
///
/// The single error type returned by repositories, form parsing and handlers.
/// Every variant maps to one HTTP status and is rendered as the `{"error": <message>}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing fields, password mismatch, write to an inactive region.
    #[error("{0}")]
    Validation(String),

    /// A query parameter outside the endpoint's whitelist, or an unparseable filter value.
    #[error("{0}")]
    InvalidParameter(String),

    /// Unknown id, slug or region_slug.
    #[error("{0}")]
    NotFound(String),

    /// Slug uniqueness could not be resolved.
    #[error("{0}")]
    SlugConflict(String),

    /// Missing, malformed or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The object store rejected an upload.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias used across handlers and repositories.
pub type AppResult<T> = Result<T, AppError>;

/// ErrorBody
///
/// The JSON envelope carried by every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// The HTTP status this error is surfaced with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SlugConflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The client-facing message. Infrastructure failures are logged and replaced by a generic text.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(sqlx::Error::RowNotFound) => "Resource not found".to_string(),
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "An internal error occurred".to_string()
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "storage error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    /// Flattens field errors into the same `field: message; ...` text the form parser produces.
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|err| err.message.as_ref())
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| "Invalid value.".to_string());
                format!("{field}: {message}")
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    /// Malformed or incomplete JSON bodies are validation failures, not axum's plain-text 4xx.
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
