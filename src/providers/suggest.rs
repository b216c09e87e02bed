//! Search-suggestion lookups.
//!
//! The suggest endpoint answers with JSONP
//! (`window.google.ac.h([...])`); the completions sit at `data[1][*][0]`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::config::SuggestConfig;
use crate::providers::error::ProviderError;

fn jsonp_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)window\.google\.ac\.h\((.*)\)").ok())
        .as_ref()
}

/// Extract completion strings from a JSONP body. Anything unexpected yields none.
pub fn parse_suggestions(body: &str) -> Vec<String> {
    let Some(payload) = jsonp_pattern()
        .and_then(|re| re.captures(body))
        .and_then(|c| c.get(1))
    else {
        return Vec::new();
    };
    let Ok(data) = serde_json::from_str::<Value>(payload.as_str()) else {
        return Vec::new();
    };

    data.get(1)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get(0).and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub struct SuggestClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SuggestClient {
    pub fn new(client: reqwest::Client, config: &SuggestConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
        }
    }

    async fn fetch(&self, query: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("client", "youtube"), ("ds", "yt"), ("q", query)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }
        Ok(response.text().await?)
    }

    /// Completions for `query`; failures are logged and answered with none.
    pub async fn suggestions(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }
        match self.fetch(query).await {
            Ok(body) => parse_suggestions(&body),
            Err(e) => {
                tracing::debug!(error = %e, "Suggest lookup failed");
                Vec::new()
            }
        }
    }
}
