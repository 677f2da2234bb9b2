//! Error types for larder-web
//!
//! Handlers render user mistakes as flash messages; `ApiError` covers what is
//! left (storage failures, a dead blocking task) and renders a plain HTML
//! error page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::pages::escape;

/// Handler error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Blocking store task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// larder-common error
    #[error(transparent)]
    Common(#[from] larder_common::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Common(larder_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(larder_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(larder_common::Error::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Join(_) | ApiError::Common(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>{code} - Larder</title>
<link rel="stylesheet" href="/static/larder.css"></head>
<body><main class="container">
<h1>{code}</h1>
<p class="flash flash-error">{message}</p>
<p><a href="/home">Back to the larder</a></p>
</main></body>
</html>"#,
            code = status,
            message = escape(&self.to_string()),
        );

        (status, Html(body)).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Common(larder_common::Error::InvalidInput("bad".into()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Common(larder_common::Error::Io(std::io::Error::other("disk")))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
