//! Two-speaker dialogues built from transcript lines.
//!
//! Consecutive lines are grouped into windows of roughly `window_secs`
//! seconds. Each window is split into sentences on `。` and the sentences are
//! voiced alternately by speakers A and B.

use crate::transcript::TranscriptLine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimated speaking time per character, in seconds.
const SECONDS_PER_CHAR: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    A,
    B,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::A => write!(f, "A"),
            Speaker::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: Speaker,
    pub text: String,
    /// Estimated duration in seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dialogue {
    pub lines: Vec<DialogueLine>,
    /// First transcript line of the window.
    pub source: Option<TranscriptLine>,
}

impl Dialogue {
    /// Speaker-labelled text, one blank line between turns.
    pub fn format(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("{}: {}", l.speaker, l.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Split text into sentences ending in `。`, `？` or `！`.
///
/// A missing terminator is added as `。`.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split_inclusive('。')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "。")
        .map(|s| {
            if s.ends_with(['。', '？', '！', '?', '!']) {
                s.to_string()
            } else {
                format!("{}。", s)
            }
        })
        .collect()
}

/// Group consecutive lines until their durations reach `window_secs`.
///
/// A trailing short group is kept.
pub fn group_lines(lines: &[TranscriptLine], window_secs: f64) -> Vec<Vec<TranscriptLine>> {
    let mut groups = Vec::new();
    let mut current: Vec<TranscriptLine> = Vec::new();
    let mut current_duration = 0.0;

    for line in lines {
        current.push(line.clone());
        current_duration += line.duration;

        if current_duration >= window_secs {
            groups.push(std::mem::take(&mut current));
            current_duration = 0.0;
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}

/// Voice a group of lines as an alternating dialogue of about `window_secs`.
pub fn build_dialogue(lines: &[TranscriptLine], window_secs: f64) -> Dialogue {
    let mut dialogue_lines = Vec::new();
    let mut elapsed = 0.0;

    'outer: for line in lines {
        for sentence in split_sentences(&line.text) {
            if elapsed >= window_secs {
                break 'outer;
            }

            let speaker = if dialogue_lines.len() % 2 == 0 {
                Speaker::A
            } else {
                Speaker::B
            };
            let duration = (sentence.chars().count() as f64 * SECONDS_PER_CHAR).max(1.0);
            elapsed += duration;

            dialogue_lines.push(DialogueLine {
                speaker,
                text: sentence,
                duration,
            });
        }
    }

    Dialogue {
        lines: dialogue_lines,
        source: lines.first().cloned(),
    }
}
