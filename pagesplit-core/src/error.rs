use thiserror::Error;

/// Errors produced while normalizing an inbound request body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("No PDF data found in request body")]
    MissingPayload,

    #[error("No PDF data provided")]
    EmptyPayload,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}

/// Errors produced by the splitting engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("Document too large: {actual} bytes (maximum {max} bytes)")]
    TooLarge { actual: usize, max: usize },

    #[error("Invalid PDF document: {0}")]
    InvalidDocument(String),

    #[error("Failed to copy page {index}: {message}")]
    PageCopyFailed { index: usize, message: String },
}

/// Lookup failures reported by a session store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Page not found")]
    PageNotFound,
}

/// Client-visible retrieval failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Session not found or expired")]
    SessionNotFound,

    #[error("Page not found")]
    PageNotFound,
}

impl From<StoreError> for RetrievalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound => RetrievalError::SessionNotFound,
            StoreError::PageNotFound => RetrievalError::PageNotFound,
        }
    }
}

/// Failure reported by a document backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
pub type SplitResult<T> = std::result::Result<T, SplitError>;
