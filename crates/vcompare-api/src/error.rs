//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use vcompare_media::MediaError;
use vcompare_models::ErrorBody;
use vcompare_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Video processing failed with exit code {exit_code:?}")]
    Processing {
        exit_code: Option<i32>,
        /// Bounded prefix of the tool's diagnostics
        excerpt: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn processing(exit_code: Option<i32>, excerpt: impl Into<String>) -> Self {
        Self::Processing {
            exit_code,
            excerpt: excerpt.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::Storage(StorageError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::BadRequest(_)
            | ApiError::Media(MediaError::InvalidMethod(_))
            | ApiError::Storage(StorageError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Processing { .. }
            | ApiError::Internal(_)
            | ApiError::Media(_)
            | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client.
    ///
    /// Unexpected failures only get a generic message; details go to the log.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Media(MediaError::InvalidMethod(method)) => {
                format!("Invalid comparison method: {}", method)
            }
            ApiError::Storage(StorageError::NotFound(_)) => "File not found".to_string(),
            ApiError::Storage(StorageError::InvalidKey(_)) => "Invalid filename".to_string(),
            ApiError::Processing { excerpt, .. } => format!(
                "Video processing failed. Check server logs. Details: {}...",
                excerpt
            ),
            ApiError::Internal(_) | ApiError::Media(_) | ApiError::Storage(_) => {
                "An unexpected server error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR && !matches!(self, ApiError::Processing { .. }) {
            error!("Unexpected error while handling request: {}", self);
        }

        let body = ErrorBody {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}
