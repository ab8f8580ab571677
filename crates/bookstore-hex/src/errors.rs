use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bookstore_types::api::{STATUS_ERROR, STATUS_FAIL};
use bookstore_types::domain::ValidationError;
use bookstore_types::ports::RepoError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data store deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(m) => AppError::Conflict(m),
            RepoError::DbError(m) => AppError::Internal(anyhow::anyhow!(m)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(r: JsonRejection) -> Self {
        AppError::BadRequest(r.body_text())
    }
}

/// Underlying cause of a 5xx, kept out of the body unless a development
/// layer chooses to expose it.
#[derive(Clone, Debug)]
pub struct ErrorDetail {
    pub message: String,
    pub detail: String,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DeadlineExceeded | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let (msg, detail) = match &self {
            AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m) => (m.clone(), None),
            AppError::DeadlineExceeded => (
                "data store timed out, retry the request".to_string(),
                Some(self.to_string()),
            ),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                ("internal error".to_string(), Some(format!("{e:#}")))
            }
        };

        let body = ErrorBody {
            status: if code.is_server_error() {
                STATUS_ERROR
            } else {
                STATUS_FAIL
            },
            message: msg.clone(),
            detail: None,
        };
        let mut response = (code, Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(ErrorDetail {
                message: msg,
                detail,
            });
        }
        response
    }
}
