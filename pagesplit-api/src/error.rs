use axum::{
    extract::rejection::BytesRejection,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pagesplit::{DecodeError, RetrievalError, SplitError};
use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
    /// Diagnostic detail, when there is any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Application-specific error types for the API
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("Missing session or page parameter")]
    MissingDownloadParams,

    #[error("{0}")]
    BadRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body could not be read (too large, broken stream)
    #[error("{message}")]
    BodyRejected { status: StatusCode, message: String },

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Split(SplitError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Split(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Retrieval(_) => StatusCode::NOT_FOUND,
            AppError::MissingDownloadParams | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BodyRejected { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            AppError::Decode(DecodeError::EmptyPayload) => {
                ErrorResponse::new("No PDF data provided")
            }
            AppError::Decode(e) => ErrorResponse::with_details("No PDF data provided", e.to_string()),
            AppError::Split(SplitError::TooLarge { actual, max }) => ErrorResponse::with_details(
                "File too large",
                format!(
                    "{:.2}MB exceeds maximum allowed size of {}MB",
                    *actual as f64 / BYTES_PER_MB,
                    *max as f64 / BYTES_PER_MB
                ),
            ),
            AppError::Split(e) => ErrorResponse::with_details("Failed to process PDF", e.to_string()),
            AppError::BodyRejected { status, message } => {
                let error = if *status == StatusCode::PAYLOAD_TOO_LARGE {
                    "File too large"
                } else {
                    "Failed to read request body"
                };
                ErrorResponse::with_details(error, message.clone())
            }
            AppError::Internal(message) => {
                ErrorResponse::with_details("Internal server error", message.clone())
            }
            other => ErrorResponse::new(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::warn!(%status, error = %self, "Request rejected");
        }

        (status, Json(self.to_error_response())).into_response()
    }
}

impl AppError {
    /// Map a body that could not be buffered. An over-limit body that
    /// declared its length is reported like any other oversized document.
    pub fn from_body_rejection(
        rejection: BytesRejection,
        headers: &HeaderMap,
        max_document_bytes: usize,
    ) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            if let Some(actual) = declared_length(headers) {
                return AppError::Split(SplitError::TooLarge {
                    actual,
                    max: max_document_bytes,
                });
            }
        }
        rejection.into()
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::BodyRejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
