//! JSON error responses for the API routes.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::providers::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    /// An upstream refused the call; its status is passed on.
    #[error("{message}")]
    Upstream { status: StatusCode, message: &'static str },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The route did not answer within `timeouts.request_secs`.
    #[error("Request timed out")]
    Timeout(Duration),

    #[error("yt-dlp execution failed.")]
    Extractor { details: String, video_id: String },

    #[error("Failed to parse yt-dlp output.")]
    ExtractorOutput { details: String },
}

impl ApiError {
    /// Classify a failed manifest extraction for `video_id`.
    pub fn extraction(error: ProviderError, video_id: &str) -> Self {
        match error {
            ProviderError::Extractor { stderr, .. } => ApiError::Extractor {
                details: stderr,
                video_id: video_id.to_string(),
            },
            ProviderError::Unparsable { output, .. } => ApiError::ExtractorOutput { details: output },
            other => ApiError::Extractor {
                details: other.to_string(),
                video_id: video_id.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Provider(_)
            | ApiError::Timeout(_)
            | ApiError::Extractor { .. }
            | ApiError::ExtractorOutput { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = match self {
            ApiError::Extractor { details, video_id } => {
                tracing::warn!(video_id = %video_id, "Extractor failed");
                json!({ "error": message, "details": details, "videoId": video_id })
            }
            ApiError::ExtractorOutput { details } => {
                tracing::warn!(bytes = details.len(), "Extractor output unparsable");
                json!({ "error": message, "details": details })
            }
            ApiError::Provider(e) => {
                tracing::warn!(error = %e, "Provider call failed");
                json!({ "error": message })
            }
            ApiError::Timeout(limit) => {
                tracing::warn!(limit_secs = limit.as_secs(), "Request deadline exceeded");
                json!({ "error": message })
            }
            ApiError::BadRequest(_) | ApiError::Upstream { .. } => json!({ "error": message }),
        };
        (status, Json(body)).into_response()
    }
}
