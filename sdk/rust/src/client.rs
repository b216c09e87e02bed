use std::fmt;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Non-success answer from the gateway, with its JSON body when there was one.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub body: Value,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.body.get("error").and_then(Value::as_str) {
            Some(message) => write!(f, "gateway returned {}: {}", self.status, message),
            None => write!(f, "gateway returned {}", self.status),
        }
    }
}

impl std::error::Error for ApiFailure {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    pub videos: Vec<Value>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPage {
    pub comments: Vec<Value>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatChoice {
    pub quality: String,
    pub container: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparateTracks {
    pub video: FormatChoice,
    pub audio: Option<FormatChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub streaming_url: Option<String>,
    pub combined_formats: Vec<FormatChoice>,
    pub audio_only_format: Option<FormatChoice>,
    #[serde(rename = "separate1080p")]
    pub separate_1080p: Option<SeparateTracks>,
}

#[derive(Debug, Deserialize)]
struct HomeFeed {
    videos: Vec<Value>,
}

/// Typed client for the gateway's routes.
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let resp = self.client.get(self.url(path)).query(query).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(ApiFailure { status, body }.into());
        }

        Ok(serde_json::from_str(&text)?)
    }

    pub async fn suggest(&self, query: &str) -> Result<Vec<String>> {
        self.get_json("/api/suggest", &[("q", query)]).await
    }

    pub async fn search(&self, query: &str, page: u32, sort_by: Option<&str>) -> Result<SearchPage> {
        let page = page.to_string();
        let mut params = vec![("q", query), ("page", page.as_str())];
        if let Some(sort_by) = sort_by {
            params.push(("sort_by", sort_by));
        }
        self.get_json("/api/search", &params).await
    }

    pub async fn video(&self, id: &str) -> Result<Value> {
        self.get_json("/api/video", &[("id", id)]).await
    }

    pub async fn comments(&self, id: &str, sort_by: Option<&str>) -> Result<CommentPage> {
        let mut params = vec![("id", id)];
        if let Some(sort_by) = sort_by {
            params.push(("sort_by", sort_by));
        }
        self.get_json("/api/comments", &params).await
    }

    pub async fn home_feed(&self) -> Result<Vec<Value>> {
        let feed: HomeFeed = self.get_json("/api/fvideo", &[]).await?;
        Ok(feed.videos)
    }

    pub async fn stream_info(&self, video_id: &str) -> Result<Value> {
        self.get_json(&format!("/api/stream/{video_id}"), &[]).await
    }

    pub async fn manifest(&self, video_id: &str) -> Result<StreamSummary> {
        self.get_json("/api/ytdlp", &[("id", video_id)]).await
    }

    /// Fetch `target` through the media proxy. The body is left unread so
    /// callers can stream it or drop it early.
    pub async fn proxy(&self, target: &str, range: Option<&str>) -> std::result::Result<Response, reqwest::Error> {
        let mut req = self
            .client
            .get(self.url("/api/video-proxy"))
            .query(&[("url", target)]);
        if let Some(range) = range {
            req = req.header(reqwest::header::RANGE, range);
        }
        req.send().await
    }
}
