use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid program: {0}")]
    InvalidProgram(String),
    #[error("too many requests, try again in a minute")]
    RateLimited,
    #[error("ai backend error: {0}")]
    Ai(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidProgram(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Ai(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self);
        } else {
            tracing::warn!(status = %status, error = %self);
        }

        let rate_limited = matches!(self, AppError::RateLimited);
        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        let mut response = (status, body).into_response();
        if rate_limited {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("60"));
        }
        response
    }
}

impl From<jimmy_core::Error> for AppError {
    fn from(value: jimmy_core::Error) -> Self {
        match value {
            jimmy_core::Error::InvalidDocument(msg) => AppError::BadRequest(msg),
            jimmy_core::Error::InvalidProgram(msg) => AppError::InvalidProgram(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<turso::Error> for AppError {
    fn from(value: turso::Error) -> Self {
        match value {
            turso::Error::QueryReturnedNoRows => AppError::NotFound("record not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
