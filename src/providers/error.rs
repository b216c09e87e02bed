//! Errors raised by external collaborators.

use std::time::Duration;

use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(StatusCode),

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to start extractor: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("extractor exited with {status}")]
    Extractor { status: String, stderr: String },

    #[error("unparsable extractor output: {source}")]
    Unparsable {
        output: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("missing field in response: {0}")]
    Missing(&'static str),
}
