//! Media manifest interface and stream selection.
//!
//! A manifest is the list of candidate media URLs an extractor found for a
//! video. [`summarize`] picks what the player needs from it: the best
//! progressive MP4, the best audio-only track and a separate 1080p video.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::providers::error::ProviderError;

/// Candidate media for one video.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaManifest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
}

/// One downloadable rendition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl MediaFormat {
    fn has_video(&self) -> bool {
        codec_present(self.vcodec.as_deref())
    }

    fn has_audio(&self) -> bool {
        codec_present(self.acodec.as_deref())
    }

    fn is_direct(&self) -> bool {
        matches!(self.protocol.as_deref(), Some("http" | "https"))
    }

    fn ext_is(&self, ext: &str) -> bool {
        self.ext.as_deref() == Some(ext)
    }

    fn abr_kbps(&self) -> i64 {
        self.abr.unwrap_or(0.0).round() as i64
    }
}

// Extractors write "none" for an absent stream; a missing key means unknown.
fn codec_present(codec: Option<&str>) -> bool {
    codec != Some("none")
}

/// Turns a video page URL into a [`MediaManifest`].
#[async_trait]
pub trait MediaManifestProvider: Send + Sync {
    async fn manifest(&self, video_url: &str) -> Result<MediaManifest, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatChoice {
    pub quality: String,
    pub container: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeparateTracks {
    pub video: FormatChoice,
    pub audio: Option<FormatChoice>,
}

/// Body of `/api/ytdlp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
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

/// Select playable streams from a manifest.
pub fn summarize(manifest: &MediaManifest) -> StreamSummary {
    let mut combined: Vec<&MediaFormat> = manifest
        .formats
        .iter()
        .filter(|f| f.has_video() && f.has_audio() && f.ext_is("mp4") && f.is_direct())
        .collect();
    combined.sort_by_key(|f| std::cmp::Reverse(f.height.unwrap_or(0)));

    let mut audio_only: Vec<&MediaFormat> = manifest
        .formats
        .iter()
        .filter(|f| !f.has_video() && f.has_audio() && f.is_direct())
        .collect();
    audio_only.sort_by(|a, b| {
        b.abr
            .unwrap_or(0.0)
            .partial_cmp(&a.abr.unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let best_audio = audio_only
        .iter()
        .find(|f| f.ext_is("m4a"))
        .or_else(|| audio_only.first())
        .copied();

    let video_1080p = manifest.formats.iter().find(|f| {
        f.height == Some(1080) && f.has_video() && !f.has_audio() && f.ext_is("mp4") && f.is_direct()
    });

    let audio_choice = |suffix: &str| {
        best_audio.map(|f| FormatChoice {
            quality: format!("{}kbps{suffix}", f.abr_kbps()),
            container: f.ext.clone().unwrap_or_default(),
            url: f.url.clone(),
        })
    };

    StreamSummary {
        title: manifest.title.clone(),
        thumbnail: manifest.thumbnail.clone(),
        streaming_url: combined.first().and_then(|f| f.url.clone()),
        combined_formats: combined
            .iter()
            .map(|f| FormatChoice {
                quality: f
                    .format_note
                    .clone()
                    .filter(|note| !note.is_empty())
                    .unwrap_or_else(|| format!("{}p", f.height.unwrap_or(0))),
                container: f.ext.clone().unwrap_or_default(),
                url: f.url.clone(),
            })
            .collect(),
        audio_only_format: audio_choice(""),
        separate_1080p: video_1080p.map(|f| SeparateTracks {
            video: FormatChoice {
                quality: "1080p (video only)".to_string(),
                container: "mp4".to_string(),
                url: f.url.clone(),
            },
            audio: audio_choice(" (audio only)"),
        }),
    }
}
