//! YouTube transcript source.
//!
//! Subtitles are fetched with yt-dlp in YouTube's `json3` format and converted to
//! timed lines. Manual subtitles win over auto-generated ones because yt-dlp
//! prefers them when both flags are given.

use super::{TranscriptLine, TranscriptSource};
use crate::error::{KikitoriError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Transcript source backed by yt-dlp subtitle downloads.
pub struct YoutubeTranscriptSource {
    languages: Vec<String>,
    video_id_regex: Regex,
}

impl YoutubeTranscriptSource {
    /// Create a source that tries the given subtitle languages in order.
    pub fn new(languages: Vec<String>) -> Self {
        Self {
            languages,
            video_id_regex: Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"),
        }
    }

    /// Extract a video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if self.video_id_regex.is_match(input) {
            return Some(input.to_string());
        }

        let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
            input.to_string()
        } else {
            format!("https://{}", input)
        };
        let url = url::Url::parse(&with_scheme).ok()?;
        let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

        let candidate = match host {
            "youtu.be" => url.path_segments()?.next().map(|s| s.to_string()),
            "youtube.com" => {
                let mut segments = url.path_segments()?;
                match segments.next() {
                    Some("watch") => url
                        .query_pairs()
                        .find(|(k, _)| k == "v")
                        .map(|(_, v)| v.into_owned()),
                    Some("embed") | Some("v") | Some("shorts") | Some("live") => {
                        segments.next().map(|s| s.to_string())
                    }
                    _ => None,
                }
            }
            _ => None,
        }?;

        self.video_id_regex
            .is_match(&candidate)
            .then_some(candidate)
    }

    /// Run yt-dlp to write subtitle files into `dir`.
    async fn download_subtitles(&self, video_id: &str, dir: &Path) -> Result<()> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = dir.join("%(id)s.%(ext)s");

        let result = Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .arg("--sub-langs").arg(self.languages.join(","))
            .arg("--sub-format").arg("json3")
            .arg("--output").arg(template.to_str().unwrap_or_default())
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KikitoriError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(KikitoriError::Transcript(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KikitoriError::TranscriptUnavailable(format!(
                "yt-dlp failed for {video_id}: {stderr}"
            )));
        }

        Ok(())
    }

    /// Pick the downloaded subtitle file for the most preferred language.
    fn find_subtitle_file(&self, dir: &Path, video_id: &str) -> Option<PathBuf> {
        for lang in &self.languages {
            let candidate = dir.join(format!("{}.{}.json3", video_id, lang));
            if candidate.exists() {
                info!("Found {} subtitles", lang);
                return Some(candidate);
            }
        }

        // Regional variants such as ja-JP
        let entries = std::fs::read_dir(dir).ok()?;
        entries
            .flatten()
            .map(|e| e.path())
            .find(|p| p.extension().is_some_and(|ext| ext == "json3"))
    }
}

impl Default for YoutubeTranscriptSource {
    fn default() -> Self {
        Self::new(vec!["ja".to_string(), "en".to_string()])
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(&self, input: &str) -> Result<Vec<TranscriptLine>> {
        let video_id = self.extract_video_id(input).ok_or_else(|| {
            KikitoriError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        let temp_dir = tempfile::tempdir()?;
        self.download_subtitles(&video_id, temp_dir.path()).await?;

        let path = self.find_subtitle_file(temp_dir.path(), &video_id).ok_or_else(|| {
            KikitoriError::TranscriptUnavailable(format!(
                "No {} subtitles for {}",
                self.languages.join("/"),
                video_id
            ))
        })?;

        let content = tokio::fs::read_to_string(&path).await?;
        let lines = parse_json3(&content)?;

        if lines.is_empty() {
            warn!("No valid lines found in transcript for {}", video_id);
        } else {
            debug!("Parsed {} transcript lines", lines.len());
        }

        Ok(lines)
    }
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Convert a YouTube `json3` subtitle document into timed lines.
///
/// Events without text (window styling, line breaks) are dropped.
pub fn parse_json3(content: &str) -> Result<Vec<TranscriptLine>> {
    let doc: Json3Document = serde_json::from_str(content)
        .map_err(|e| KikitoriError::Transcript(format!("Invalid json3 subtitles: {}", e)))?;

    let lines = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ").trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptLine::new(
                text,
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect();

    Ok(lines)
}
