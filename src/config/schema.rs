//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the media gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Range streaming proxy settings.
    pub proxy: StreamProxyConfig,

    /// Metadata (innertube) client settings.
    pub metadata: MetadataConfig,

    /// External video-info API.
    pub video_info: VideoInfoConfig,

    /// Search suggestion endpoint.
    pub suggest: SuggestConfig,

    /// Command-line media extractor.
    pub extractor: ExtractorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a JSON API response, in seconds. Expiry answers 500
    /// with a JSON error. The proxy routes are bounded by
    /// `proxy.response_timeout_secs` instead.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Range streaming proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamProxyConfig {
    /// User-Agent sent on every upstream media request.
    pub user_agent: String,

    /// Referer sent upstream. `None` sends no Referer.
    pub referer: Option<String>,

    /// Upstream connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum wait for the upstream response head in seconds, connect
    /// included. Expiry is a transport failure (500).
    pub response_timeout_secs: u64,

    /// Maximum wait for a single upstream chunk in seconds (0 disables).
    pub idle_read_timeout_secs: u64,

    /// Chunks buffered between the upstream reader and the client writer.
    pub channel_capacity: usize,

    /// Redirects followed before giving up.
    pub max_redirects: usize,

    /// Route outbound requests through `HTTP_PROXY`/`HTTPS_PROXY` when set.
    pub use_env_proxy: bool,
}

impl StreamProxyConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn idle_read_timeout(&self) -> Option<Duration> {
        match self.idle_read_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for StreamProxyConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            referer: Some("https://www.youtube.com/".to_string()),
            connect_timeout_secs: 10,
            response_timeout_secs: 30,
            idle_read_timeout_secs: 30,
            channel_capacity: 4,
            max_redirects: 10,
            use_env_proxy: true,
        }
    }
}

/// Innertube metadata client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Base URL of the youtubei v1 API.
    pub innertube_base_url: String,

    /// Interface language (`hl`).
    pub language: String,

    /// Content location (`gl`).
    pub location: String,

    /// Videos per search page.
    pub search_page_size: usize,

    /// Continuation calls allowed when assembling one search page.
    pub max_continuations: usize,

    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            innertube_base_url: "https://www.youtube.com/youtubei/v1".to_string(),
            language: "ja".to_string(),
            location: "JP".to_string(),
            search_page_size: 40,
            max_continuations: 15,
            request_timeout_secs: 15,
        }
    }
}

/// External video-info API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoInfoConfig {
    /// Endpoint queried with `?videoId=<id>`.
    pub endpoint: String,
}

impl Default for VideoInfoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://xeroxdwapi.vercel.app/api/video-info".to_string(),
        }
    }
}

/// Search suggestion endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SuggestConfig {
    pub endpoint: String,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://suggestqueries.google.com/complete/search".to_string(),
        }
    }
}

/// Media extractor (yt-dlp) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Path to the extractor binary.
    pub binary: String,

    /// Proxy passed to the extractor with `--proxy`.
    pub proxy_url: Option<String>,

    /// Hard deadline for one extraction, in seconds.
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: "./yt-dlp_linux".to_string(),
            proxy_url: None,
            timeout_secs: 45,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
