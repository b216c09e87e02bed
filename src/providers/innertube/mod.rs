//! youtubei v1 client.
//!
//! Every call is a JSON POST to `<base>/<endpoint>` carrying a WEB client
//! context; [`parse`] turns the renderer trees into the flat shapes the
//! HTTP layer serves.

pub mod parse;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::MetadataConfig;
use crate::providers::error::ProviderError;
use crate::providers::metadata::{CommentPage, CommentSort, MetadataProvider, SearchBatch, VideoInfo};

const WEB_CLIENT_NAME: &str = "WEB";
const WEB_CLIENT_VERSION: &str = "2.20240726.00.00";
const HOME_BROWSE_ID: &str = "FEwhat_to_watch";

pub struct InnertubeClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
    location: String,
    timeout: Duration,
}

impl InnertubeClient {
    pub fn new(client: reqwest::Client, config: &MetadataConfig) -> Self {
        Self {
            client,
            base_url: config.innertube_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            location: config.location.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    fn context(&self) -> Value {
        json!({
            "client": {
                "clientName": WEB_CLIENT_NAME,
                "clientVersion": WEB_CLIENT_VERSION,
                "hl": self.language,
                "gl": self.location,
            }
        })
    }

    async fn call(&self, endpoint: &str, mut body: Value) -> Result<Value, ProviderError> {
        body["context"] = self.context();

        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .query(&[("prettyPrint", "false")])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "Innertube call rejected");
            return Err(ProviderError::Status(status));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn continue_with(&self, endpoint: &str, token: &str) -> Result<Value, ProviderError> {
        self.call(endpoint, json!({ "continuation": token })).await
    }
}

#[async_trait]
impl MetadataProvider for InnertubeClient {
    async fn video_info(&self, id: &str) -> Result<VideoInfo, ProviderError> {
        let (player, next) = tokio::try_join!(
            self.call("player", json!({ "videoId": id })),
            self.call("next", json!({ "videoId": id })),
        )?;
        Ok(parse::video_info(&player, &next))
    }

    async fn search(&self, query: &str, sort_by: Option<&str>) -> Result<SearchBatch, ProviderError> {
        let mut body = json!({ "query": query });
        if let Some(params) = parse::search_params(sort_by) {
            body["params"] = Value::from(params);
        }
        let response = self.call("search", body).await?;
        Ok(parse::search_batch(&response))
    }

    async fn search_continuation(&self, token: &str) -> Result<SearchBatch, ProviderError> {
        let response = self.continue_with("search", token).await?;
        Ok(parse::search_batch(&response))
    }

    async fn comments(&self, id: &str, sort: CommentSort) -> Result<CommentPage, ProviderError> {
        let watch = self.call("next", json!({ "videoId": id })).await?;
        let Some(token) = parse::comment_section_token(&watch) else {
            // Comments disabled or the section failed to render.
            return Ok(CommentPage::default());
        };

        let page = self.continue_with("next", &token).await?;
        if sort == CommentSort::Top {
            return Ok(parse::comment_page(&page));
        }

        match parse::comment_sort_token(&page, sort) {
            Some(sorted) => {
                let page = self.continue_with("next", &sorted).await?;
                Ok(parse::comment_page(&page))
            }
            None => Ok(parse::comment_page(&page)),
        }
    }

    async fn home_feed(&self) -> Result<Vec<Value>, ProviderError> {
        let response = self.call("browse", json!({ "browseId": HOME_BROWSE_ID })).await?;
        Ok(parse::collect_videos(&response))
    }
}
