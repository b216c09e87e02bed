//! `yt-dlp` backed [`MediaManifestProvider`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::ExtractorConfig;
use crate::providers::error::ProviderError;
use crate::providers::manifest::{MediaManifest, MediaManifestProvider};

/// Watch URL handed to the extractor for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Runs the extractor binary once per request.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    proxy_url: Option<String>,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            binary: PathBuf::from(&config.binary),
            proxy_url: config.proxy_url.clone().filter(|p| !p.is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Arguments passed before the URL.
    pub fn args(&self, video_url: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(proxy) = &self.proxy_url {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args.push("--dump-json".to_string());
        args.push(video_url.to_string());
        args
    }
}

#[async_trait]
impl MediaManifestProvider for YtDlp {
    async fn manifest(&self, video_url: &str) -> Result<MediaManifest, ProviderError> {
        tracing::debug!(binary = %self.binary.display(), url = %video_url, "Running extractor");

        let child = Command::new(&self.binary)
            .args(self.args(video_url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ProviderError::Spawn)?;

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
            .map_err(ProviderError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::warn!(status = %output.status, "Extractor failed");
            return Err(ProviderError::Extractor {
                status: output.status.to_string(),
                stderr,
            });
        }

        parse_manifest(&output.stdout)
    }
}

/// Decode `--dump-json` output.
pub fn parse_manifest(stdout: &[u8]) -> Result<MediaManifest, ProviderError> {
    serde_json::from_slice(stdout).map_err(|source| ProviderError::Unparsable {
        output: String::from_utf8_lossy(stdout).into_owned(),
        source,
    })
}
