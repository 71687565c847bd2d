use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by the directory, match engine and conversation store
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A server-side fault outside the store, e.g. token signing
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidOperation(_) => "invalid_operation",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Validation(_) => "validation_failed",
            ServiceError::Unauthorized(_) => "unauthorized",
            ServiceError::Store(_) | ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl error::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidOperation(_)
            | ServiceError::Conflict(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Store(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Store details stay in the logs
        let message = match self {
            ServiceError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                "Internal server error".to_string()
            }
            ServiceError::Internal(e) => {
                tracing::error!("Internal failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ServiceError::Validation(format!("Invalid JSON: {}", err)).into()
}

/// Handle path extraction errors, e.g. a non-numeric user id
pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    ServiceError::Validation(format!("Invalid path: {}", err)).into()
}
