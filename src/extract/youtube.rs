//! YouTube transcript extraction.
//!
//! Caption tracks are discovered with yt-dlp and downloaded in YouTube's
//! `json3` timed-text format.

use super::{wrong_kind, Extractor, SourceDescriptor, SourceKind};
use crate::chunking::SourceText;
use crate::config::YoutubeSettings;
use crate::error::{DocqaError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?:https?://)?(?:www\.|m\.)?",
            r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|v/|shorts/|live/)|youtu\.be/)",
            r"([a-zA-Z0-9_-]{11})(?:[?&#/].*)?$",
        ))
        .expect("video URL pattern is valid")
    })
}

/// Validate a YouTube video URL and return its 11-character video ID.
pub fn parse_video_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let url = url::Url::parse(trimmed)
        .map_err(|e| DocqaError::InvalidSource(format!("malformed URL '{}': {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DocqaError::InvalidSource(format!(
            "unsupported URL scheme '{}': {}",
            url.scheme(),
            trimmed
        )));
    }

    video_id_regex()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            DocqaError::InvalidSource(format!("not a YouTube video URL: {}", trimmed))
        })
}

/// Pick a json3 caption URL from yt-dlp's metadata.
///
/// Languages are tried in order; within a language, uploaded subtitles win
/// over automatic captions. Regional variants ("en-US") match their base
/// language ("en").
pub fn select_caption_track(metadata: &serde_json::Value, languages: &[String]) -> Option<String> {
    for language in languages {
        for field in ["subtitles", "automatic_captions"] {
            let Some(tracks) = metadata[field].as_object() else {
                continue;
            };

            let mut candidates: Vec<(&String, &serde_json::Value)> = tracks
                .iter()
                .filter(|(code, _)| {
                    *code == language || code.starts_with(&format!("{}-", language))
                })
                .collect();
            // Exact language code before regional variants.
            candidates.sort_by_key(|(code, _)| (*code != language, code.as_str()));

            for (_, formats) in candidates {
                let url = formats.as_array().and_then(|formats| {
                    formats
                        .iter()
                        .find(|f| f["ext"].as_str() == Some("json3"))
                        .and_then(|f| f["url"].as_str())
                });
                if let Some(url) = url {
                    return Some(url.to_string());
                }
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Join the caption events of a json3 transcript into plain text.
pub fn parse_json3(body: &str) -> Result<String> {
    let transcript: Json3Transcript = serde_json::from_str(body)
        .map_err(|e| DocqaError::Extraction(format!("unreadable caption track: {}", e)))?;

    let lines: Vec<String> = transcript
        .events
        .iter()
        .map(|event| {
            event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect();

    Ok(lines.join(" "))
}

/// Fetches video transcripts through yt-dlp caption metadata.
pub struct YoutubeTranscriptExtractor {
    ytdlp_path: String,
    languages: Vec<String>,
    http: reqwest::Client,
}

impl YoutubeTranscriptExtractor {
    pub fn new(ytdlp_path: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            languages,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &YoutubeSettings) -> Self {
        Self::new(settings.ytdlp_path.clone(), settings.languages.clone())
    }

    /// Fetch video metadata (including caption tracks) using yt-dlp.
    async fn fetch_metadata(&self, url: &str) -> Result<serde_json::Value> {
        let output = tokio::process::Command::new(&self.ytdlp_path)
            .args(["--dump-json", "--skip-download", "--no-warnings", "--no-playlist", url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DocqaError::Extraction(format!(
                        "{} not found. Please install it and ensure it's in your PATH.",
                        self.ytdlp_path
                    ))
                } else {
                    DocqaError::Extraction(format!("Failed to run {}: {}", self.ytdlp_path, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocqaError::Extraction(format!(
                "Video {} not found or unavailable: {}",
                url,
                stderr.trim()
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&json_str)
            .map_err(|e| DocqaError::Extraction(format!("Failed to parse yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl Extractor for YoutubeTranscriptExtractor {
    #[instrument(skip(self, source), fields(source = %source.label()))]
    async fn extract(&self, source: &SourceDescriptor) -> Result<Vec<SourceText>> {
        let SourceDescriptor::Video { url } = source else {
            return Err(wrong_kind(SourceKind::Video, source));
        };

        let video_id = parse_video_url(url)?;
        info!("Fetching transcript for video {}", video_id);

        let metadata = self.fetch_metadata(url).await?;
        let track_url = select_caption_track(&metadata, &self.languages).ok_or_else(|| {
            DocqaError::TranscriptUnavailable(format!(
                "no captions in [{}] for {}",
                self.languages.join(", "),
                url
            ))
        })?;

        let body = self
            .http
            .get(&track_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let text = parse_json3(&body)?;
        if text.trim().is_empty() {
            return Err(DocqaError::TranscriptUnavailable(format!(
                "caption track for {} is empty",
                url
            )));
        }

        debug!("Transcript for {} has {} characters", video_id, text.len());
        Ok(vec![SourceText::new(text, Some(url.clone()))])
    }
}
