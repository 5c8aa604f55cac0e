//! Pipeline orchestrator for Kikitori.
//!
//! Coordinates transcript fetching, segmentation, indexing, extraction, and
//! quiz building for one video at a time.

use crate::config::{Prompts, QuizStrategy, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KikitoriError, Result};
use crate::extraction::{ExtractionOutcome, StructuredExtractor};
use crate::generation::{create_generator, TextGenerator};
use crate::index::{
    MemorySegmentStore, SearchHit, SectionFilter, SegmentMetadata, SegmentStore, SemanticIndex,
    SqliteSegmentStore,
};
use crate::quiz::{placeholder_questions, QuizBuilder, QuizCache, QuizQuestion};
use crate::segmentation::{create_segmenter, Section, Segmenter};
use crate::session::StudySession;
use crate::transcript::{fetch_or_none, Transcript, TranscriptSource, TranscriptStore, YoutubeTranscriptSource};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A video reference resolved to an ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub video_id: String,
    /// JLPT level, when the video is a library preset.
    pub level: Option<String>,
}

/// Result of indexing a video.
#[derive(Debug, Clone)]
pub struct IndexResult {
    pub video_id: String,
    pub sections_indexed: usize,
    pub skipped: bool,
}

/// A built or cached quiz.
#[derive(Debug, Clone)]
pub struct QuizResult {
    pub video_id: String,
    pub questions: Vec<QuizQuestion>,
    pub from_cache: bool,
}

/// The main orchestrator for the Kikitori pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    id_parser: YoutubeTranscriptSource,
    source: Arc<dyn TranscriptSource>,
    transcripts: TranscriptStore,
    index: SemanticIndex,
    generator: Option<Arc<dyn TextGenerator>>,
    quiz_cache: QuizCache,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    ///
    /// A missing generation API key is not an error here; extraction and quiz
    /// building degrade instead.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let source: Arc<dyn TranscriptSource> =
            Arc::new(YoutubeTranscriptSource::new(settings.transcript.languages.clone()));

        let store: Arc<dyn SegmentStore> = match settings.index.provider.as_str() {
            "memory" => Arc::new(MemorySegmentStore::new()),
            "sqlite" => Arc::new(SqliteSegmentStore::new(&settings.sqlite_path())?),
            other => {
                return Err(KikitoriError::Config(format!("Unknown index provider: {}", other)));
            }
        };

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding));

        let generator = match create_generator(&settings.generation) {
            Ok(generator) => {
                info!("Using {} for generation", generator.model());
                Some(generator)
            }
            Err(e) => {
                warn!("Generation unavailable: {}", e);
                None
            }
        };

        Ok(Self::with_components(settings, prompts, source, store, embedder, generator))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        source: Arc<dyn TranscriptSource>,
        store: Arc<dyn SegmentStore>,
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            id_parser: YoutubeTranscriptSource::new(settings.transcript.languages.clone()),
            transcripts: TranscriptStore::new(settings.transcripts_dir()),
            quiz_cache: QuizCache::new(settings.quizzes_dir()),
            index: SemanticIndex::new(store, embedder),
            settings,
            prompts,
            source,
            generator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &SemanticIndex {
        &self.index
    }

    pub fn transcripts(&self) -> &TranscriptStore {
        &self.transcripts
    }

    pub fn quiz_cache(&self) -> &QuizCache {
        &self.quiz_cache
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// The segmenter selected by configuration.
    pub fn segmenter(&self) -> Box<dyn Segmenter> {
        create_segmenter(&self.settings.segmentation)
    }

    /// Resolve a JLPT level preset, URL, or bare ID.
    pub fn resolve_video(&self, input: &str) -> Result<VideoRef> {
        let video_id = match self.settings.library.video_for_level(input) {
            Some(video_id) => video_id.to_string(),
            None => self.id_parser.extract_video_id(input).ok_or_else(|| {
                KikitoriError::InvalidInput(format!("Not a JLPT level or YouTube video: {}", input))
            })?,
        };

        Ok(VideoRef {
            level: self.settings.library.level_for_video(&video_id).map(String::from),
            video_id,
        })
    }

    /// Load the saved transcript, or fetch and save it.
    #[instrument(skip(self))]
    pub async fn load_transcript(&self, video_id: &str, refresh: bool) -> Result<Transcript> {
        if !refresh {
            if let Some(transcript) = self.transcripts.load(video_id)? {
                info!("Using saved transcript for {}", video_id);
                return Ok(transcript);
            }
        }

        let transcript = fetch_or_none(self.source.as_ref(), video_id)
            .await
            .ok_or_else(|| KikitoriError::TranscriptUnavailable(video_id.to_string()))?;

        if let Err(e) = self.transcripts.save(&transcript) {
            warn!("Failed to save transcript: {}", e);
        }

        Ok(transcript)
    }

    pub fn segment(&self, transcript: &Transcript) -> Vec<Section> {
        self.segmenter().segment(&transcript.lines)
    }

    /// Fetch, segment, and index a video's sections.
    #[instrument(skip(self))]
    pub async fn index_video(&self, video: &VideoRef, force: bool) -> Result<IndexResult> {
        if !force && self.index.contains_video(&video.video_id).await? {
            info!("Video {} is already indexed, skipping", video.video_id);
            return Ok(IndexResult {
                video_id: video.video_id.clone(),
                sections_indexed: 0,
                skipped: true,
            });
        }

        let transcript = self.load_transcript(&video.video_id, false).await?;
        let sections = self.segment(&transcript);
        let metadata = SegmentMetadata::new(&video.video_id, video.level.clone());
        let indexed = self.index.insert_sections(&sections, &metadata).await?;

        Ok(IndexResult {
            video_id: video.video_id.clone(),
            sections_indexed: indexed.len(),
            skipped: false,
        })
    }

    pub async fn search(&self, query: &str, filter: SectionFilter, top_k: usize) -> Result<Vec<SearchHit>> {
        self.index.search(query, filter, top_k).await
    }

    /// Search and keep the hits on the session.
    pub async fn search_in_session<'s>(
        &self,
        session: &'s mut StudySession,
        query: &str,
        filter: SectionFilter,
        top_k: usize,
    ) -> Result<&'s [SearchHit]> {
        let hits = self.search(query, filter, top_k).await?;
        session.record_search(hits);
        Ok(session.last_search())
    }

    fn extractor(&self, generator: Arc<dyn TextGenerator>) -> StructuredExtractor {
        StructuredExtractor::new(generator).with_prompts(self.prompts.clone())
    }

    /// Extract listening cases from a transcript.
    pub async fn extract(&self, transcript: &Transcript) -> ExtractionOutcome {
        match &self.generator {
            Some(generator) => self.extractor(generator.clone()).extract(&transcript.full_text()).await,
            None => {
                warn!("No generative model configured, skipping extraction");
                ExtractionOutcome::unavailable()
            }
        }
    }

    /// Load the cached quiz for a video, or build and cache a new one.
    #[instrument(skip(self, transcript), fields(video_id = %transcript.video_id))]
    pub async fn build_quiz(&self, transcript: &Transcript, rebuild: bool) -> Result<QuizResult> {
        let video_id = transcript.video_id.clone();
        let use_cache = self.settings.quiz.cache;

        if rebuild {
            match self.quiz_cache.remove(&video_id) {
                Ok(true) => info!("Removed cached quiz for {}", video_id),
                Ok(false) => {}
                Err(e) => warn!("Failed to remove cached quiz: {}", e),
            }
        } else if use_cache {
            match self.quiz_cache.load(&video_id) {
                Ok(Some(questions)) if !questions.is_empty() => {
                    return Ok(QuizResult {
                        video_id,
                        questions,
                        from_cache: true,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!("Ignoring unreadable quiz cache: {}", e),
            }
        }

        let questions = self.generate_questions(transcript).await;
        if questions.is_empty() {
            return Err(KikitoriError::Quiz(format!("No questions could be built for {}", video_id)));
        }

        if use_cache {
            if let Err(e) = self.quiz_cache.save(&video_id, &questions) {
                warn!("Failed to cache quiz: {}", e);
            }
        }

        Ok(QuizResult {
            video_id,
            questions,
            from_cache: false,
        })
    }

    async fn generate_questions(&self, transcript: &Transcript) -> Vec<QuizQuestion> {
        let quiz = &self.settings.quiz;

        let Some(generator) = &self.generator else {
            warn!("No generative model configured, using placeholder questions");
            return placeholder_questions(&transcript.lines, quiz.dialogue_seconds, quiz.max_questions);
        };

        let builder = QuizBuilder::new(generator.clone())
            .with_prompts(self.prompts.clone())
            .with_max_questions(quiz.max_questions);

        if quiz.strategy == QuizStrategy::Cases {
            let outcome = self.extractor(generator.clone()).extract(&transcript.full_text()).await;
            if !outcome.cases.is_empty() {
                return builder.from_cases(&outcome.cases).await;
            }
            warn!("No cases extracted, building questions from dialogues");
        }

        builder.from_dialogues(&transcript.lines, quiz.dialogue_seconds).await
    }

    /// Load a video into the session and start its quiz.
    pub async fn prepare_session(&self, session: &mut StudySession, video: &VideoRef, rebuild: bool) -> Result<QuizResult> {
        let transcript = self.load_transcript(&video.video_id, false).await?;
        let result = self.build_quiz(&transcript, rebuild).await?;

        let segmenter = self.segmenter();
        session.load_transcript(transcript, video.level.clone(), segmenter.as_ref());
        session.start_quiz(result.questions.clone());
        Ok(result)
    }
}
