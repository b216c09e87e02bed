//! Upstream request construction and response header hygiene.
//!
//! # Responsibilities
//! - Validate the client-supplied target URL
//! - Build the upstream client (fresh connection per request, no pooling)
//! - Attach User-Agent, Referer and the forwarded Range header
//! - Copy the fixed response header allow-list back to the client
//!
//! # Design Decisions
//! - Only four response headers ever cross the proxy; nothing else from the
//!   upstream leaks to the client
//! - The Range header is forwarded byte-for-byte, never reparsed

use axum::http::{
    header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE, REFERER, USER_AGENT},
    HeaderMap, HeaderName, HeaderValue,
};
use url::Url;

use crate::config::StreamProxyConfig;
use crate::proxy::error::ProxyError;

/// Response headers mirrored from upstream to client.
pub const MIRRORED_HEADERS: [HeaderName; 4] = [CONTENT_RANGE, CONTENT_LENGTH, CONTENT_TYPE, ACCEPT_RANGES];

/// Build the HTTP client used for media fetches.
///
/// Idle pooling is disabled so each proxied transfer owns its socket, and no
/// total timeout is set because transfers may legitimately run for hours.
pub fn build_client(config: &StreamProxyConfig) -> Result<reqwest::Client, ProxyError> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects));
    if !config.use_env_proxy {
        builder = builder.no_proxy();
    }
    builder.build().map_err(ProxyError::Client)
}

/// Parse the `url` query parameter into an absolute http(s) URL.
pub fn parse_target(raw: Option<&str>) -> Result<Url, ProxyError> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ProxyError::MissingUrl),
    };

    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        scheme => Err(ProxyError::InvalidUrl(format!("unsupported scheme or host: {scheme}"))),
    }
}

/// Build the upstream GET for `target`.
pub fn upstream_request(
    client: &reqwest::Client,
    config: &StreamProxyConfig,
    target: &Url,
    range: Option<&HeaderValue>,
) -> reqwest::RequestBuilder {
    let mut request = client
        .get(target.clone())
        .header(USER_AGENT, config.user_agent.as_str());

    if let Some(referer) = &config.referer {
        request = request.header(REFERER, referer.as_str());
    }

    if let Some(range) = range {
        request = request.header(RANGE, range.clone());
    }

    request
}

/// Copy the allow-listed headers present on `upstream`.
pub fn mirror_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut mirrored = HeaderMap::with_capacity(MIRRORED_HEADERS.len());
    for name in MIRRORED_HEADERS {
        if let Some(value) = upstream.get(&name) {
            mirrored.insert(name, value.clone());
        }
    }
    mirrored
}
