//! Embedding-backed insert and search over a segment store.

use super::{rank_hits, IndexedSegment, IndexedVideo, SearchHit, SectionFilter, SegmentMetadata, SegmentStore};
use crate::embedding::Embedder;
use crate::error::{KikitoriError, Result};
use crate::segmentation::{Section, SectionKind};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Section texts stored for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredTranscript {
    pub video_id: String,
    pub level: Option<String>,
    pub introduction: String,
    pub conversation: String,
    pub questions: String,
}

/// Semantic search over transcript sections.
pub struct SemanticIndex {
    store: Arc<dyn SegmentStore>,
    embedder: Arc<dyn Embedder>,
}

impl SemanticIndex {
    pub fn new(store: Arc<dyn SegmentStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Embed and store one piece of text. Duplicates are not checked.
    #[instrument(skip(self, text, metadata), fields(video_id = %metadata.video_id))]
    pub async fn insert(
        &self,
        section: SectionKind,
        text: &str,
        metadata: SegmentMetadata,
    ) -> Result<IndexedSegment> {
        if text.trim().is_empty() {
            return Err(KikitoriError::InvalidInput(format!(
                "Refusing to index empty {} text",
                section
            )));
        }

        let embedding = self.embedder.embed(text).await?;
        let segment = IndexedSegment::new(section, text.to_string(), embedding, metadata);
        let sequence = self.store.insert(&segment).await?;
        debug!("Indexed {} segment #{}", section, sequence);
        Ok(segment)
    }

    /// Index every non-empty section, one segment per section.
    #[instrument(skip(self, sections, metadata), fields(video_id = %metadata.video_id))]
    pub async fn insert_sections(
        &self,
        sections: &[Section],
        metadata: &SegmentMetadata,
    ) -> Result<Vec<IndexedSegment>> {
        let (kinds, texts): (Vec<SectionKind>, Vec<String>) = sections
            .iter()
            .filter(|s| !s.text().trim().is_empty())
            .map(|s| (s.kind, s.text()))
            .unzip();

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(&texts).await?;

        let mut indexed = Vec::with_capacity(texts.len());
        for ((kind, text), embedding) in kinds.into_iter().zip(texts).zip(embeddings) {
            let segment = IndexedSegment::new(kind, text, embedding, metadata.clone());
            self.store.insert(&segment).await?;
            indexed.push(segment);
        }

        info!("Indexed {} sections for {}", indexed.len(), metadata.video_id);
        Ok(indexed)
    }

    /// Nearest segments to `query` across the filtered sections.
    ///
    /// Each section contributes up to `top_k` candidates; the merged list is
    /// re-sorted by similarity and cut to `top_k`.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        filter: SectionFilter,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        if top_k == 0 || self.store.len().await? == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let kinds = filter.kinds();
        let lookups = kinds
            .iter()
            .map(|kind| self.store.nearest(*kind, &query_embedding, top_k));
        let per_section = try_join_all(lookups).await?;

        let hits = rank_hits(per_section.into_iter().flatten().collect(), top_k);
        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }

    /// The first stored introduction, conversation, and questions for a video.
    ///
    /// Returns `None` unless all three are present.
    pub async fn structured_transcript(&self, video_id: &str) -> Result<Option<StructuredTranscript>> {
        let segments = self.store.segments_for_video(video_id).await?;

        let first = |kind: SectionKind| segments.iter().find(|s| s.section == kind);

        let (Some(intro), Some(conversation), Some(questions)) = (
            first(SectionKind::Introduction),
            first(SectionKind::Conversation),
            first(SectionKind::Questions),
        ) else {
            return Ok(None);
        };

        Ok(Some(StructuredTranscript {
            video_id: video_id.to_string(),
            level: intro.metadata.level.clone(),
            introduction: intro.text.clone(),
            conversation: conversation.text.clone(),
            questions: questions.text.clone(),
        }))
    }

    /// Whether any segment exists for the video.
    pub async fn contains_video(&self, video_id: &str) -> Result<bool> {
        Ok(!self.store.segments_for_video(video_id).await?.is_empty())
    }

    pub async fn list_videos(&self) -> Result<Vec<IndexedVideo>> {
        self.store.list_videos().await
    }

    /// Drop every segment so the index can be rebuilt.
    pub async fn clear(&self) -> Result<usize> {
        self.store.clear().await
    }

    pub async fn len(&self) -> Result<usize> {
        self.store.len().await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::embedding::Embedder;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: counts a few marker characters.
    #[derive(Default)]
    pub struct KeywordEmbedder {
        pub calls: AtomicUsize,
    }

    const MARKERS: [char; 4] = ['駅', '店', '本', '?'];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MARKERS
                .iter()
                .map(|m| text.chars().filter(|c| c == m).count() as f32)
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            MARKERS.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::KeywordEmbedder;
    use super::*;
    use crate::index::MemorySegmentStore;
    use crate::segmentation::{Segmenter, TimeRatioSegmenter};
    use crate::transcript::TranscriptLine;
    use std::sync::atomic::Ordering;

    fn index() -> (SemanticIndex, Arc<KeywordEmbedder>) {
        let embedder = Arc::new(KeywordEmbedder::default());
        let index = SemanticIndex::new(Arc::new(MemorySegmentStore::new()), embedder.clone());
        (index, embedder)
    }

    fn meta(video_id: &str) -> SegmentMetadata {
        SegmentMetadata::new(video_id, Some("N4".to_string()))
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing_without_embedding() {
        let (index, embedder) = index();
        let hits = index.search("駅", SectionFilter::All, 5).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_respects_top_k_and_order() {
        let (index, _) = index();
        index.insert(SectionKind::Introduction, "駅", meta("a")).await.unwrap();
        index.insert(SectionKind::Conversation, "駅駅店", meta("a")).await.unwrap();
        index.insert(SectionKind::Conversation, "店店", meta("b")).await.unwrap();
        index.insert(SectionKind::Questions, "本?", meta("b")).await.unwrap();

        for k in 1..=5 {
            let hits = index.search("駅", SectionFilter::All, k).await.unwrap();
            assert!(hits.len() <= k);
            for pair in hits.windows(2) {
                assert!(pair[0].similarity >= pair[1].similarity);
            }
        }

        let hits = index.search("駅", SectionFilter::All, 1).await.unwrap();
        assert_eq!(hits[0].segment.text, "駅");

        let hits = index
            .search("店", SectionFilter::Only(SectionKind::Conversation), 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.segment.section == SectionKind::Conversation));
        assert_eq!(hits[0].segment.text, "店店");
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order_across_sections() {
        let (index, _) = index();
        index.insert(SectionKind::Questions, "駅", meta("first")).await.unwrap();
        index.insert(SectionKind::Introduction, "駅", meta("second")).await.unwrap();
        index.insert(SectionKind::Introduction, "駅", meta("third")).await.unwrap();

        let hits = index.search("駅", SectionFilter::All, 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.segment.metadata.video_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_insert_sections_and_structured_transcript() {
        let (index, _) = index();
        let lines: Vec<TranscriptLine> = (0..10)
            .map(|i| TranscriptLine::new(format!("駅 {}", i), i as f64 * 10.0, 10.0))
            .collect();
        let sections = TimeRatioSegmenter::default().segment(&lines);

        let indexed = index.insert_sections(&sections, &meta("vid")).await.unwrap();
        assert_eq!(indexed.len(), 3);
        assert!(index.contains_video("vid").await.unwrap());

        let structured = index.structured_transcript("vid").await.unwrap().unwrap();
        assert_eq!(structured.introduction, "駅 0 駅 1");
        assert_eq!(structured.questions, "駅 7 駅 8 駅 9");
        assert_eq!(structured.level.as_deref(), Some("N4"));

        assert!(index.structured_transcript("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let (index, _) = index();
        let result = index.insert(SectionKind::Questions, "  ", meta("v")).await;
        assert!(matches!(result, Err(KikitoriError::InvalidInput(_))));
        assert_eq!(index.len().await.unwrap(), 0);
    }
}
