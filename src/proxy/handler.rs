//! Axum handler for the proxy endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header::RANGE, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::observability::metrics;
use crate::proxy::StreamProxy;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// `GET /api/video-proxy?url=<target>` (also `/proxy`).
pub async fn video_proxy(
    State(proxy): State<Arc<StreamProxy>>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();

    let response = match proxy.forward(query.url.as_deref(), headers.get(RANGE)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(error = %e, "Proxy request rejected");
            e.into_response()
        }
    };

    metrics::record_request("video_proxy", response.status().as_u16(), start_time);
    response
}
