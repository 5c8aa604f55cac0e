//! On-disk quiz cache, one `<video_id>_quiz.json` per video.

use super::QuizQuestion;
use crate::error::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct QuizCache {
    dir: PathBuf,
}

impl QuizCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}_quiz.json", video_id))
    }

    pub fn save(&self, video_id: &str, questions: &[QuizQuestion]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(video_id);
        std::fs::write(&path, serde_json::to_string_pretty(questions)?)?;
        info!("Cached {} questions at {:?}", questions.len(), path);
        Ok(path)
    }

    /// Cached questions, or `None` when nothing is cached.
    ///
    /// A file with an invalid question fails to load as a whole.
    pub fn load(&self, video_id: &str) -> Result<Option<Vec<QuizQuestion>>> {
        let path = self.path_for(video_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let questions: Vec<QuizQuestion> = serde_json::from_str(&content)?;
        debug!("Loaded {} cached questions from {:?}", questions.len(), path);
        Ok(Some(questions))
    }

    /// Remove the cached quiz. Returns whether a file was removed.
    pub fn remove(&self, video_id: &str) -> Result<bool> {
        let path = self.path_for(video_id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}
