//! Proxy error taxonomy.
//!
//! Every variant here happens before the first body byte is written, so
//! each maps to a clean status response with an empty body. Failures after
//! that point live in [`crate::proxy::relay::RelayError`] and abort the
//! connection instead.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// `url` query parameter absent or empty.
    #[error("url parameter is missing")]
    MissingUrl,

    /// `url` present but not an absolute http(s) URL.
    #[error("invalid target url: {0}")]
    InvalidUrl(String),

    /// DNS, connect, TLS or redirect failure reaching the upstream.
    #[error("upstream request failed: {0}")]
    UpstreamConnect(#[source] reqwest::Error),

    /// Upstream accepted the request but sent no response head in time.
    #[error("upstream sent no response within {0:?}")]
    UpstreamTimeout(Duration),

    /// Upstream answered with a status outside 2xx.
    #[error("upstream returned status {0}")]
    UpstreamStatus(StatusCode),

    /// The upstream HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamStatus(status) => *status,
            ProxyError::UpstreamConnect(_)
            | ProxyError::UpstreamTimeout(_)
            | ProxyError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
