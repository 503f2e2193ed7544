// ABOUTME: Error taxonomy for the resolve endpoint
// ABOUTME: Each variant maps to one HTTP status and a JSON error body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::ResolveResponse;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Missing url")]
    MissingUrl,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Video is private or requires login. Please log in through the app first.")]
    ContentUnavailable,

    #[error("Unsupported URL or no video found")]
    UnsupportedUrl,

    #[error("No video URL found")]
    NoUrlFound,

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Request timeout. The video extraction took too long.")]
    Timeout,

    #[error("Server error: {0}")]
    Internal(String),
}

impl ResolveError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResolveError::Unauthorized => StatusCode::UNAUTHORIZED,
            ResolveError::MissingUrl => StatusCode::BAD_REQUEST,
            ResolveError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ResolveError::ContentUnavailable
            | ResolveError::UnsupportedUrl
            | ResolveError::NoUrlFound
            | ResolveError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ResolveError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ResolveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ResolveResponse::failure(self.message()))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
