// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the Webmention receiver.

use crate::detector::DetectError;
use crate::store::StoreError;
use crate::validator::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    PolicyRejected(String),

    #[error("`source` could not be fetched: {0}")]
    SourceUnreachable(String),

    #[error("`source` could not be parsed: {0}")]
    MalformedSource(String),

    #[error("Unknown Content-Type {0}")]
    UnsupportedContentType(String),

    #[error("`source` does not mention `target`.")]
    NotMentioned,

    #[error("Missing `{0}` query parameter.")]
    MissingQuery(&'static str),

    #[error("That user is not known!")]
    UnknownAccount,

    #[error("{0}")]
    MethodNotAllowed(&'static str),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownAccount => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code, also used as the metrics outcome label.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(ValidationError::MalformedBody(_)) => "MALFORMED_BODY",
            AppError::Validation(ValidationError::MissingParameter(_)) => "MISSING_PARAMETER",
            AppError::Validation(ValidationError::InvalidUrl(_)) => "INVALID_URL",
            AppError::Validation(ValidationError::UnsupportedScheme(_)) => "UNSUPPORTED_SCHEME",
            AppError::MissingQuery(_) => "MISSING_PARAMETER",
            AppError::PolicyRejected(_) => "POLICY_REJECTED",
            AppError::SourceUnreachable(_) => "SOURCE_UNREACHABLE",
            AppError::MalformedSource(_) => "MALFORMED_SOURCE",
            AppError::UnsupportedContentType(_) => "UNSUPPORTED_CONTENT_TYPE",
            AppError::NotMentioned => "NOT_MENTIONED",
            AppError::UnknownAccount => "UNKNOWN_ACCOUNT",
            AppError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            AppError::Store(_) => "STORE_FAILURE",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<DetectError> for AppError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::UnsupportedContentType(raw) => AppError::UnsupportedContentType(raw),
            DetectError::Body(e) => AppError::SourceUnreachable(e.to_string()),
            DetectError::Json(e) => AppError::MalformedSource(e.to_string()),
            DetectError::Html(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            // Cause stays in the logs
            error!(error = %self, code = self.code(), "Request failed");
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: self.code(),
            }),
        )
            .into_response()
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
