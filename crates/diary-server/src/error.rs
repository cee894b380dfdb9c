//! HTTP error mapping.
//!
//! Every failure leaves the server as `{"error": "<message>"}`. Persistence
//! failures carry a fixed public message per operation; the underlying
//! error is logged and never sent to the client.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diary_resources::ResourceError;
use diary_store::StoreError;
use diary_tasks::TaskError;
use serde::Serialize;
use tracing::error;

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// A request failure with its HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400: malformed or invalid input.
    #[error("{0}")]
    BadRequest(String),
    /// 404: no such entity or route.
    #[error("{0}")]
    NotFound(String),
    /// 500: persistence failure; the message is the public one.
    #[error("{0}")]
    Internal(&'static str),
    /// 501: known route without an implementation.
    #[error("{0}")]
    NotImplemented(String),
}

impl ApiError {
    /// Log `source` and return a 500 carrying only `public`.
    pub fn internal(public: &'static str, source: &StoreError) -> Self {
        error!(error = %source, "{public}");
        Self::Internal(public)
    }

    /// Map a task error; `failure` is the public 500 message.
    pub fn from_task(err: TaskError, failure: &'static str) -> Self {
        match err {
            TaskError::Validation(msg) => Self::BadRequest(msg),
            TaskError::NotFound(_) => Self::NotFound("Task not found".into()),
            TaskError::Store(source) => Self::internal(failure, &source),
        }
    }

    /// Map a resource error; `failure` is the public 500 message.
    pub fn from_resource(err: ResourceError, failure: &'static str) -> Self {
        match err {
            ResourceError::Validation(msg) => Self::BadRequest(msg),
            ResourceError::NotFound(_) => Self::NotFound("Resource not found".into()),
            ResourceError::Store(source) => Self::internal(failure, &source),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(_: QueryRejection) -> Self {
        Self::BadRequest("Invalid query parameters".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
