use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::ValidationError;
use crate::gateway::GatewayError;

const RETRY_MESSAGE: &str = "Something went wrong, please try again";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Gateway error: {0}")]
    Gateway(GatewayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unconfigured(reason) => AppError::Unavailable(reason),
            GatewayError::NotFound(_) => AppError::NotFound,
            GatewayError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Gateway(other),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unavailable(reason) => {
                tracing::error!("Storage unavailable: {}", reason);
                (StatusCode::SERVICE_UNAVAILABLE, RETRY_MESSAGE.to_string())
            }
            AppError::Gateway(e) => {
                tracing::error!("Gateway error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE.to_string())
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
