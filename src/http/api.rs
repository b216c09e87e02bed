//! JSON API handlers.

use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::providers::{
    metadata::parse_page, search_page, summarize, video_response, ytdlp::watch_url, CommentSort,
    Paging, StreamInfo,
};

/// Record the outcome of `route` and render it.
fn respond<T: IntoResponse>(route: &'static str, start: Instant, result: Result<T, ApiError>) -> Response {
    let response = result.into_response();
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

fn required(value: Option<String>, missing: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::BadRequest(missing))
}

pub async fn index() -> &'static str {
    "API is running."
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub q: Option<String>,
}

pub async fn suggest(State(state): State<AppState>, Query(query): Query<SuggestQuery>) -> Response {
    let start = Instant::now();
    let suggestions = state
        .suggest
        .suggestions(query.q.as_deref().unwrap_or_default())
        .await;
    respond("suggest", start, Ok::<_, ApiError>(Json(suggestions)))
}

pub async fn stream_info(State(state): State<AppState>, Path(video_id): Path<String>) -> Response {
    let start = Instant::now();
    let result = match state.video_info.lookup(&video_id).await {
        Ok(StreamInfo::Found(info)) => Ok(Json(info)),
        Ok(StreamInfo::Rejected(status)) => Err(ApiError::Upstream {
            status,
            message: "Failed to fetch stream info",
        }),
        Err(e) => Err(ApiError::from(e)),
    };
    respond("stream_info", start, result)
}

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    pub id: Option<String>,
}

pub async fn video(State(state): State<AppState>, Query(query): Query<VideoQuery>) -> Response {
    let start = Instant::now();
    let result = async {
        let id = required(query.id, "Missing video id")?;
        let info = state.metadata.video_info(&id).await?;
        Ok::<_, ApiError>(Json(video_response(info)))
    }
    .await;
    respond("video", start, result)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    pub sort_by: Option<String>,
}

pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let start = Instant::now();
    let result = async {
        let q = required(query.q, "Missing search query")?;
        let paging = Paging {
            page: parse_page(query.page.as_deref()),
            page_size: state.config.metadata.search_page_size,
            max_continuations: state.config.metadata.max_continuations,
        };
        let page = search_page(state.metadata.as_ref(), &q, query.sort_by.as_deref(), paging).await?;
        Ok::<_, ApiError>(Json(page))
    }
    .await;
    respond("search", start, result)
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub id: Option<String>,
    pub sort_by: Option<String>,
}

pub async fn comments(State(state): State<AppState>, Query(query): Query<CommentsQuery>) -> Response {
    let start = Instant::now();
    let result = async {
        let id = required(query.id, "Missing video id")?;
        let sort = CommentSort::from_query(query.sort_by.as_deref());
        let page = state.metadata.comments(&id, sort).await?;
        Ok::<_, ApiError>(Json(page))
    }
    .await;
    respond("comments", start, result)
}

pub async fn home_feed(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let result = state
        .metadata
        .home_feed()
        .await
        .map(|videos| Json(json!({ "videos": videos })))
        .map_err(ApiError::from);
    respond("home_feed", start, result)
}

pub async fn ytdlp(State(state): State<AppState>, Query(query): Query<VideoQuery>) -> Response {
    let start = Instant::now();
    let result = async {
        let id = required(query.id, "A valid video id (id) is required.")?;
        let manifest = state
            .manifests
            .manifest(&watch_url(&id))
            .await
            .map_err(|e| ApiError::extraction(e, &id))?;
        tracing::debug!(video_id = %id, formats = manifest.formats.len(), "Manifest extracted");
        Ok::<_, ApiError>(Json(summarize(&manifest)))
    }
    .await;
    respond("ytdlp", start, result)
}
