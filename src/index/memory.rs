//! In-memory segment store.
//!
//! Useful for testing and one-off sessions that do not need persistence.

use super::{cosine_similarity, IndexedSegment, IndexedVideo, SearchHit, SegmentStore};
use crate::error::{KikitoriError, Result};
use crate::segmentation::SectionKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Inner {
    next_sequence: u64,
    segments: Vec<(u64, IndexedSegment)>,
}

/// In-memory segment store. Segments are kept in insertion order.
#[derive(Default)]
pub struct MemorySegmentStore {
    inner: RwLock<Inner>,
}

impl MemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| KikitoriError::Index(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| KikitoriError::Index(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl SegmentStore for MemorySegmentStore {
    async fn insert(&self, segment: &IndexedSegment) -> Result<u64> {
        let mut inner = self.write()?;
        inner.next_sequence += 1;
        let sequence = inner.next_sequence;
        inner.segments.push((sequence, segment.clone()));
        Ok(sequence)
    }

    async fn nearest(
        &self,
        section: SectionKind,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let inner = self.read()?;

        let hits: Vec<SearchHit> = inner
            .segments
            .iter()
            .filter(|(_, s)| s.section == section)
            .map(|(sequence, s)| SearchHit {
                similarity: cosine_similarity(query_embedding, &s.embedding),
                segment: s.clone(),
                sequence: *sequence,
            })
            .collect();

        Ok(super::rank_hits(hits, limit))
    }

    async fn segments_for_video(&self, video_id: &str) -> Result<Vec<IndexedSegment>> {
        let inner = self.read()?;
        Ok(inner
            .segments
            .iter()
            .filter(|(_, s)| s.metadata.video_id == video_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn list_videos(&self) -> Result<Vec<IndexedVideo>> {
        let inner = self.read()?;
        let mut video_map: HashMap<String, IndexedVideo> = HashMap::new();

        for (_, segment) in &inner.segments {
            let entry = video_map
                .entry(segment.metadata.video_id.clone())
                .or_insert_with(|| IndexedVideo {
                    video_id: segment.metadata.video_id.clone(),
                    level: segment.metadata.level.clone(),
                    segment_count: 0,
                    indexed_at: segment.indexed_at,
                });

            entry.segment_count += 1;
            if segment.indexed_at > entry.indexed_at {
                entry.indexed_at = segment.indexed_at;
            }
        }

        let mut videos: Vec<IndexedVideo> = video_map.into_values().collect();
        videos.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));
        Ok(videos)
    }

    async fn clear(&self) -> Result<usize> {
        let mut inner = self.write()?;
        let removed = inner.segments.len();
        inner.segments.clear();
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read()?.segments.len())
    }
}
