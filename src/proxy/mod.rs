//! Range-aware streaming proxy.
//!
//! # Data Flow
//! ```text
//! GET /api/video-proxy?url=..  (+ Range)
//!     → upstream.rs (validate target, build request, forward Range)
//!     → reqwest (fresh upstream connection, bounded wait for the head)
//!     → status check (non-2xx mirrored, no body)
//!     → upstream.rs (copy header allow-list)
//!     → relay.rs (pump task → bounded channel → response body)
//! ```
//!
//! # Design Decisions
//! - Nothing is buffered beyond a few chunks
//! - Nothing is retried: a resumed range would need the last delivered offset
//! - Client disconnect is a normal termination, not an error

pub mod error;
pub mod handler;
pub mod relay;
pub mod upstream;

use axum::{
    body::Body,
    http::HeaderValue,
    response::Response,
};
use tokio_util::sync::CancellationToken;

use crate::config::StreamProxyConfig;

pub use error::ProxyError;
pub use relay::{spawn_relay, ClientConnection, RelayBody, RelayError, RelayOutcome, RelaySettings, RelayStats};

/// Relays media byte ranges from arbitrary upstream URLs.
pub struct StreamProxy {
    client: reqwest::Client,
    config: StreamProxyConfig,
    shutdown: CancellationToken,
}

impl StreamProxy {
    /// `shutdown` parents every client connection, so cancelling it ends all
    /// in-flight transfers.
    pub fn new(config: StreamProxyConfig, shutdown: CancellationToken) -> Result<Self, ProxyError> {
        let client = upstream::build_client(&config)?;
        Ok(Self {
            client,
            config,
            shutdown,
        })
    }

    fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            channel_capacity: self.config.channel_capacity,
            idle_timeout: self.config.idle_read_timeout(),
        }
    }

    /// Open `target` upstream and return a response streaming its body.
    ///
    /// Every error returned here happens before any byte reaches the client.
    pub async fn forward(
        &self,
        target: Option<&str>,
        range: Option<&HeaderValue>,
    ) -> Result<Response, ProxyError> {
        let target = upstream::parse_target(target)?;
        let host = target.host_str().unwrap_or_default().to_string();

        let limit = self.config.response_timeout();
        let request = upstream::upstream_request(&self.client, &self.config, &target, range).send();
        let upstream = match tokio::time::timeout(limit, request).await {
            Ok(Ok(upstream)) => upstream,
            Ok(Err(e)) => {
                tracing::error!(upstream = %host, error = %e, "Upstream request failed");
                return Err(ProxyError::UpstreamConnect(e));
            }
            Err(_) => {
                tracing::error!(upstream = %host, limit_secs = limit.as_secs(), "Upstream response timed out");
                return Err(ProxyError::UpstreamTimeout(limit));
            }
        };

        let status = upstream.status();
        if !status.is_success() {
            tracing::warn!(upstream = %host, status = %status, "Upstream refused request");
            return Err(ProxyError::UpstreamStatus(status));
        }

        let headers = upstream::mirror_headers(upstream.headers());
        tracing::debug!(
            upstream = %host,
            status = %status,
            ranged = range.is_some(),
            "Streaming upstream body"
        );

        let connection = ClientConnection::new(&self.shutdown);
        let (body, _pump) = spawn_relay(
            Box::pin(upstream.bytes_stream()),
            connection,
            self.relay_settings(),
            &host,
        );

        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
