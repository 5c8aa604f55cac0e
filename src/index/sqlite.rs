//! SQLite-based segment store.
//!
//! Embeddings are stored as little-endian f32 blobs and similarity is computed
//! in Rust. The `seq` rowid is the insertion order used to break ties.

use super::{
    cosine_similarity, rank_hits, IndexedSegment, IndexedVideo, SearchHit, SegmentMetadata,
    SegmentStore,
};
use crate::error::{KikitoriError, Result};
use crate::segmentation::SectionKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS segments (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL,
        section TEXT NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        video_id TEXT NOT NULL,
        level TEXT,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_segments_section ON segments(section);
    CREATE INDEX IF NOT EXISTS idx_segments_video_id ON segments(video_id);
"#;

const SELECT_COLUMNS: &str =
    "SELECT seq, id, section, content, embedding, video_id, level, indexed_at FROM segments";

/// SQLite-based segment store.
pub struct SqliteSegmentStore {
    conn: Mutex<Connection>,
}

impl SqliteSegmentStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| KikitoriError::Index(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    /// Map a row selected with `SELECT_COLUMNS`.
    fn row_to_segment(row: &Row<'_>) -> rusqlite::Result<(u64, IndexedSegment)> {
        let seq: i64 = row.get(0)?;
        let id_str: String = row.get(1)?;
        let section_str: String = row.get(2)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let indexed_at_str: String = row.get(7)?;

        let section = section_str.parse::<SectionKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;

        let segment = IndexedSegment {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            section,
            text: row.get(3)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            metadata: SegmentMetadata {
                video_id: row.get(5)?,
                level: row.get(6)?,
            },
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        };

        Ok((seq as u64, segment))
    }
}

#[async_trait]
impl SegmentStore for SqliteSegmentStore {
    #[instrument(skip(self, segment), fields(section = %segment.section))]
    async fn insert(&self, segment: &IndexedSegment) -> Result<u64> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO segments (id, section, content, embedding, video_id, level, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                segment.id.to_string(),
                segment.section.as_str(),
                segment.text,
                Self::embedding_to_bytes(&segment.embedding),
                segment.metadata.video_id,
                segment.metadata.level,
                segment.indexed_at.to_rfc3339(),
            ],
        )?;

        let seq = conn.last_insert_rowid() as u64;
        debug!("Inserted segment {} as #{}", segment.id, seq);
        Ok(seq)
    }

    #[instrument(skip(self, query_embedding))]
    async fn nearest(
        &self,
        section: SectionKind,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!("{} WHERE section = ?1 ORDER BY seq", SELECT_COLUMNS))?;
        let rows = stmt.query_map(params![section.as_str()], Self::row_to_segment)?;

        let hits: Vec<SearchHit> = rows
            .filter_map(|r| r.ok())
            .map(|(sequence, segment)| SearchHit {
                similarity: cosine_similarity(query_embedding, &segment.embedding),
                segment,
                sequence,
            })
            .collect();

        let hits = rank_hits(hits, limit);
        debug!("Found {} {} segments", hits.len(), section);
        Ok(hits)
    }

    #[instrument(skip(self))]
    async fn segments_for_video(&self, video_id: &str) -> Result<Vec<IndexedSegment>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!("{} WHERE video_id = ?1 ORDER BY seq", SELECT_COLUMNS))?;
        let rows = stmt.query_map(params![video_id], Self::row_to_segment)?;

        let segments: Vec<IndexedSegment> = rows.filter_map(|r| r.ok()).map(|(_, s)| s).collect();
        Ok(segments)
    }

    #[instrument(skip(self))]
    async fn list_videos(&self) -> Result<Vec<IndexedVideo>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT video_id, MAX(level), COUNT(*) AS segment_count, MAX(indexed_at) AS indexed_at
            FROM segments
            GROUP BY video_id
            ORDER BY indexed_at DESC
            "#,
        )?;

        let videos = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedVideo {
                video_id: row.get(0)?,
                level: row.get(1)?,
                segment_count: row.get(2)?,
                indexed_at: Self::parse_timestamp(&indexed_at_str),
            })
        })?;

        let result: Vec<IndexedVideo> = videos.filter_map(|v| v.ok()).collect();
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM segments", [])?;
        info!("Cleared {} segments from the index", deleted);
        Ok(deleted)
    }

    async fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM segments", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::segment;

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteSegmentStore::in_memory().unwrap();

        let seg = segment(SectionKind::Introduction, "男の人と女の人が話しています。", vec![1.0, 0.0, 0.0], "video1");
        let seq = store.insert(&seg).await.unwrap();
        assert_eq!(seq, 1);

        let videos = store.list_videos().await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "video1");
        assert_eq!(videos[0].level.as_deref(), Some("N3"));

        let hits = store.nearest(SectionKind::Introduction, &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 0.001);
        assert_eq!(hits[0].segment.id, seg.id);
        assert_eq!(hits[0].segment.embedding, vec![1.0, 0.0, 0.0]);

        let other = store.nearest(SectionKind::Questions, &[1.0, 0.0, 0.0], 10).await.unwrap();
        assert!(other.is_empty());

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.list_videos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");

        {
            let store = SqliteSegmentStore::new(&path).unwrap();
            store
                .insert(&segment(SectionKind::Questions, "何を買いますか", vec![0.5, 0.5], "v"))
                .await
                .unwrap();
        }

        let reopened = SqliteSegmentStore::new(&path).unwrap();
        assert_eq!(tokio_test::assert_ok!(reopened.len().await), 1);
        let segments = reopened.segments_for_video("v").await.unwrap();
        assert_eq!(segments[0].section, SectionKind::Questions);
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let embedding = vec![0.25, -1.5, 3.0];
        let bytes = SqliteSegmentStore::embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(SqliteSegmentStore::bytes_to_embedding(&bytes), embedding);
    }
}
