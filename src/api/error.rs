//! Mapping of library errors onto HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// API errors
#[derive(Debug)]
pub enum ApiError {
    /// Resource does not exist
    NotFound(String),
    /// Failure from the conversation layer
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Core(e)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) | Self::Core(Error::SessionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            Self::Core(Error::UnknownTool(_)) => (StatusCode::BAD_REQUEST, "unknown_tool"),
            Self::Core(Error::Tool(_)) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_arguments"),
            Self::Core(Error::NotAnnounced { .. }) => (StatusCode::BAD_GATEWAY, "not_announced"),
            Self::Core(Error::Store(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "store_failed"),
            Self::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
            persisted: bool,
        }

        let (status, code) = self.parts();
        let (message, persisted) = match &self {
            Self::NotFound(what) => (format!("{what} not found"), false),
            Self::Core(e) => (e.to_string(), e.is_persisted()),
        };

        if status.is_server_error() {
            tracing::warn!(code, error = %message, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code,
                    message,
                    persisted,
                },
            }),
        )
            .into_response()
    }
}
