//! Semantic index over transcript sections.
//!
//! Section text is embedded and stored per section kind. Backends implement
//! [`SegmentStore`]; [`SemanticIndex`] pairs a store with an [`Embedder`](crate::embedding::Embedder).

mod memory;
mod semantic;
mod sqlite;

pub use memory::MemorySegmentStore;
pub use semantic::{SemanticIndex, StructuredTranscript};
pub use sqlite::SqliteSegmentStore;

#[cfg(test)]
pub(crate) use semantic::test_support as semantic_test_support;

use crate::error::Result;
use crate::segmentation::SectionKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Metadata attached to every indexed segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Video the text came from.
    pub video_id: String,
    /// JLPT level or other difficulty label.
    pub level: Option<String>,
}

impl SegmentMetadata {
    pub fn new(video_id: impl Into<String>, level: Option<String>) -> Self {
        Self {
            video_id: video_id.into(),
            level,
        }
    }
}

/// A section's text stored with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSegment {
    pub id: Uuid,
    pub section: SectionKind,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: SegmentMetadata,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedSegment {
    pub fn new(
        section: SectionKind,
        text: String,
        embedding: Vec<f32>,
        metadata: SegmentMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            section,
            text,
            embedding,
            metadata,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub segment: IndexedSegment,
    /// Cosine similarity to the query (higher is better).
    pub similarity: f32,
    /// Insertion order within the store.
    pub sequence: u64,
}

/// Summary information about an indexed video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedVideo {
    pub video_id: String,
    pub level: Option<String>,
    pub segment_count: u32,
    pub indexed_at: DateTime<Utc>,
}

/// Which sections a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionFilter {
    #[default]
    All,
    Only(SectionKind),
}

impl SectionFilter {
    /// Section kinds covered by this filter.
    pub fn kinds(&self) -> Vec<SectionKind> {
        match self {
            SectionFilter::All => SectionKind::ALL.to_vec(),
            SectionFilter::Only(kind) => vec![*kind],
        }
    }
}

impl std::str::FromStr for SectionFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(SectionFilter::All);
        }
        s.parse::<SectionKind>().map(SectionFilter::Only)
    }
}

/// Trait for segment store implementations.
#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Store a segment and return its insertion sequence number.
    async fn insert(&self, segment: &IndexedSegment) -> Result<u64>;

    /// The `limit` most similar segments of one section kind.
    async fn nearest(
        &self,
        section: SectionKind,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>>;

    /// All segments for a video in insertion order.
    async fn segments_for_video(&self, video_id: &str) -> Result<Vec<IndexedSegment>>;

    /// List all indexed videos, most recent first.
    async fn list_videos(&self) -> Result<Vec<IndexedVideo>>;

    /// Remove every segment. Returns the number removed.
    async fn clear(&self) -> Result<usize>;

    /// Total segment count.
    async fn len(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by similarity descending, earlier insertions first on ties, and keep `top_k`.
pub fn rank_hits(mut hits: Vec<SearchHit>, top_k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
            .then(a.sequence.cmp(&b.sequence))
    });
    hits.truncate(top_k);
    hits
}

#[cfg(test)]
pub(crate) fn segment(section: SectionKind, text: &str, embedding: Vec<f32>, video_id: &str) -> IndexedSegment {
    IndexedSegment::new(
        section,
        text.to_string(),
        embedding,
        SegmentMetadata::new(video_id, Some("N3".to_string())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_hits_breaks_ties_by_insertion() {
        let hit = |similarity: f32, sequence: u64| SearchHit {
            segment: segment(SectionKind::Conversation, "x", vec![], "v"),
            similarity,
            sequence,
        };

        let ranked = rank_hits(vec![hit(0.5, 3), hit(0.9, 7), hit(0.5, 1), hit(0.1, 2)], 3);
        let order: Vec<u64> = ranked.iter().map(|h| h.sequence).collect();
        assert_eq!(order, vec![7, 1, 3]);
    }

    #[test]
    fn test_section_filter_parse() {
        assert_eq!("all".parse::<SectionFilter>().unwrap(), SectionFilter::All);
        assert_eq!(
            "conversation".parse::<SectionFilter>().unwrap(),
            SectionFilter::Only(SectionKind::Conversation)
        );
        assert_eq!(SectionFilter::All.kinds().len(), 3);
        assert!("bogus".parse::<SectionFilter>().is_err());
    }
}
