//! Data models for timed transcripts.

use serde::{Deserialize, Serialize};

/// A single timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: f64,
}

impl TranscriptLine {
    /// Create a new transcript line.
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A complete transcript for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Lines in playback order.
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    /// Create a new transcript from lines.
    pub fn new(video_id: impl Into<String>, lines: Vec<TranscriptLine>) -> Self {
        Self {
            video_id: video_id.into(),
            lines,
        }
    }

    /// Total duration, measured to the end of the last line.
    pub fn total_duration(&self) -> f64 {
        total_duration(&self.lines)
    }

    /// Full transcript text (lines joined by a space).
    pub fn full_text(&self) -> String {
        join_text(&self.lines)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Format the transcript with timestamps for display.
    pub fn format_with_timestamps(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("[{}] {}", format_timestamp(l.start), l.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// End of the last line, or zero for an empty slice.
pub fn total_duration(lines: &[TranscriptLine]) -> f64 {
    lines.last().map(|l| l.end()).unwrap_or(0.0)
}

/// Join line texts with a single space.
pub fn join_text(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
