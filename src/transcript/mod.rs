//! Timed transcripts: models, sources, and on-disk storage.

mod models;
mod youtube;

pub use models::{format_timestamp, join_text, total_duration, Transcript, TranscriptLine};
pub use youtube::{parse_json3, YoutubeTranscriptSource};

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A provider of timed transcript lines for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the ordered lines for a video ID or URL.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptLine>>;
}

/// Fetch a transcript, degrading to `None` when the source fails or returns nothing.
pub async fn fetch_or_none(source: &dyn TranscriptSource, video_id: &str) -> Option<Transcript> {
    match source.fetch(video_id).await {
        Ok(lines) if !lines.is_empty() => Some(Transcript::new(video_id, lines)),
        Ok(_) => {
            warn!("Transcript for {} is empty", video_id);
            None
        }
        Err(e) => {
            warn!("Could not fetch transcript for {}: {}", video_id, e);
            None
        }
    }
}

/// Stores transcripts as pretty-printed JSON arrays of lines, one file per video.
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the JSON file for a video.
    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", video_id))
    }

    /// Save a transcript, creating the directory if needed.
    pub fn save(&self, transcript: &Transcript) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&transcript.video_id);
        let json = serde_json::to_string_pretty(&transcript.lines)?;
        std::fs::write(&path, json)?;
        info!("Saved transcript to {:?}", path);
        Ok(path)
    }

    /// Load a previously saved transcript, if present.
    pub fn load(&self, video_id: &str) -> Result<Option<Transcript>> {
        let path = self.path_for(video_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Transcript::new(video_id, load_lines(&path)?)))
    }
}

/// Read a JSON array of transcript lines from a file.
pub fn load_lines(path: &Path) -> Result<Vec<TranscriptLine>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KikitoriError;

    struct FixedSource(Result<Vec<TranscriptLine>>);

    #[async_trait]
    impl TranscriptSource for FixedSource {
        async fn fetch(&self, _video_id: &str) -> Result<Vec<TranscriptLine>> {
            match &self.0 {
                Ok(lines) => Ok(lines.clone()),
                Err(e) => Err(KikitoriError::TranscriptUnavailable(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_or_none_degrades() {
        let failing = FixedSource(Err(KikitoriError::ToolNotFound("yt-dlp".into())));
        assert!(fetch_or_none(&failing, "vid").await.is_none());

        let empty = FixedSource(Ok(vec![]));
        assert!(fetch_or_none(&empty, "vid").await.is_none());

        let ok = FixedSource(Ok(vec![TranscriptLine::new("はい", 0.0, 1.0)]));
        let transcript = fetch_or_none(&ok, "vid").await.unwrap();
        assert_eq!(transcript.video_id, "vid");
        assert_eq!(transcript.lines.len(), 1);
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path().join("transcripts"));

        assert!(store.load("vid").unwrap().is_none());

        let transcript = Transcript::new("vid", vec![TranscriptLine::new("駅はどこですか", 1.0, 2.0)]);
        let path = store.save(&transcript).unwrap();
        assert!(path.ends_with("vid.json"));

        let loaded = store.load("vid").unwrap().unwrap();
        assert_eq!(loaded.lines, transcript.lines);
    }
}
