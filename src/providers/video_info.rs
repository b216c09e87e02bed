//! Pass-through lookup against the external video-info service.

use axum::http::StatusCode;
use serde_json::Value;

use crate::config::VideoInfoConfig;
use crate::providers::error::ProviderError;

/// Result of one lookup: either the service's JSON or the status it refused with.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamInfo {
    Found(Value),
    Rejected(StatusCode),
}

pub struct VideoInfoClient {
    client: reqwest::Client,
    endpoint: String,
}

impl VideoInfoClient {
    pub fn new(client: reqwest::Client, config: &VideoInfoConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }

    pub async fn lookup(&self, video_id: &str) -> Result<StreamInfo, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("videoId", video_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(video_id = %video_id, status = status.as_u16(), "Video info rejected");
            return Ok(StreamInfo::Rejected(status));
        }

        let bytes = response.bytes().await?;
        Ok(StreamInfo::Found(serde_json::from_slice(&bytes)?))
    }
}
