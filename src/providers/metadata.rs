//! Video metadata provider interface and the response shaping built on it.
//!
//! The provider hands back plain JSON values; everything the front-end
//! contract promises (related-video dedup, fixed-size search pages) is
//! decided here, independent of the concrete client.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::providers::error::ProviderError;

/// Details of a single video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    /// Every other field the provider exposes, as a JSON object.
    pub details: Map<String, Value>,
    pub watch_next_feed: Vec<Value>,
    pub related_videos: Vec<Value>,
}

/// One batch of search results plus the token for the next batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBatch {
    pub videos: Vec<Value>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSort {
    Top,
    Newest,
}

impl CommentSort {
    /// `newest` selects newest-first; anything else means top comments.
    pub fn from_query(sort_by: Option<&str>) -> Self {
        match sort_by {
            Some("newest") => CommentSort::Newest,
            _ => CommentSort::Top,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentPage {
    pub comments: Vec<Value>,
    pub continuation: Option<String>,
}

/// Source of search results, video details, comments and the home feed.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn video_info(&self, id: &str) -> Result<VideoInfo, ProviderError>;

    async fn search(&self, query: &str, sort_by: Option<&str>) -> Result<SearchBatch, ProviderError>;

    async fn search_continuation(&self, token: &str) -> Result<SearchBatch, ProviderError>;

    async fn comments(&self, id: &str, sort: CommentSort) -> Result<CommentPage, ProviderError>;

    async fn home_feed(&self) -> Result<Vec<Value>, ProviderError>;
}

/// Keep the first occurrence of every video with a non-empty `id`.
pub fn dedup_by_id(candidates: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|video| match video.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => seen.insert(id.to_string()),
            _ => false,
        })
        .collect()
}

/// Flatten a [`VideoInfo`] into the `/api/video` response body.
///
/// Related videos from both feeds are merged into `watch_next_feed`; the
/// other related lists are emptied so the client reads a single list.
pub fn video_response(info: VideoInfo) -> Value {
    let related = dedup_by_id(info.watch_next_feed.into_iter().chain(info.related_videos));

    let mut body = info.details;
    body.insert("watch_next_feed".into(), Value::Array(related));
    body.insert("related_videos".into(), Value::Array(Vec::new()));
    body.insert("related".into(), Value::Array(Vec::new()));
    if let Some(Value::Object(secondary)) = body.get_mut("secondary_info") {
        secondary.insert("watch_next_feed".into(), Value::Array(Vec::new()));
    }
    Value::Object(body)
}

/// Body of `/api/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub videos: Vec<Value>,
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Limits for assembling one search page.
#[derive(Debug, Clone, Copy)]
pub struct Paging {
    pub page: usize,
    pub page_size: usize,
    pub max_continuations: usize,
}

/// Parse the `page` query value; anything unusable means page 1.
pub fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<usize>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Collect enough batches to fill `paging.page` and slice it out.
pub async fn search_page(
    provider: &dyn MetadataProvider,
    query: &str,
    sort_by: Option<&str>,
    paging: Paging,
) -> Result<SearchPage, ProviderError> {
    let wanted = paging.page.saturating_mul(paging.page_size);

    let mut batch = provider.search(query, sort_by).await?;
    let mut videos = std::mem::take(&mut batch.videos);
    let mut continuation = batch.continuation;
    let mut attempts = 0;

    while videos.len() < wanted && attempts < paging.max_continuations {
        let Some(token) = continuation.take() else {
            break;
        };
        let next = provider.search_continuation(&token).await?;
        videos.extend(next.videos);
        continuation = next.continuation;
        attempts += 1;
    }

    tracing::debug!(
        query = %query,
        page = paging.page,
        collected = videos.len(),
        continuations = attempts,
        "Search page assembled"
    );

    let start = (paging.page - 1).saturating_mul(paging.page_size);
    let end = start.saturating_add(paging.page_size);
    let next_page_token = (videos.len() > end).then(|| (paging.page + 1).to_string());
    let page = videos
        .into_iter()
        .skip(start)
        .take(paging.page_size)
        .collect();

    Ok(SearchPage {
        videos: page,
        next_page_token,
    })
}
