//! OpenAI embeddings for section text and search queries.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{KikitoriError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, Embedding, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Inputs per embeddings request.
const REQUEST_BATCH: usize = 100;

/// Embeds transcript sections and queries with an OpenAI embedding model.
///
/// Every vector must have the configured dimensions, since stored sections and
/// queries are compared by cosine similarity.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: u32,
}

impl OpenAIEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
        }
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Embedding>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(input))
            .dimensions(self.dimensions)
            .build()
            .map_err(|e| KikitoriError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| KikitoriError::OpenAI(format!("Embedding API error: {}", e)))?;

        Ok(response.data)
    }
}

/// Order one response by input index and check its shape.
fn collect_vectors(mut data: Vec<Embedding>, expected: usize, dimensions: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(KikitoriError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|e| e.index);
    data.into_iter()
        .map(|e| {
            if e.embedding.len() == dimensions {
                Ok(e.embedding)
            } else {
                Err(KikitoriError::Embedding(format!(
                    "Embedding has {} dimensions, index expects {}",
                    e.embedding.len(),
                    dimensions
                )))
            }
        })
        .collect()
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(KikitoriError::Embedding("Cannot embed empty text".to_string()));
        }

        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| KikitoriError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(REQUEST_BATCH) {
            let data = self.request(chunk.to_vec()).await?;
            vectors.extend(collect_vectors(data, chunk.len(), self.dimensions())?);
        }

        debug!("Embedded {} texts", vectors.len());
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(index: u32, vector: Vec<f32>) -> Embedding {
        Embedding {
            index,
            object: "embedding".to_string(),
            embedding: vector,
        }
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            model: "text-embedding-3-large".to_string(),
            dimensions: 256,
        };
        let embedder = OpenAIEmbedder::from_settings(&settings);
        assert_eq!(embedder.dimensions(), 256);
        assert_eq!(embedder.model, "text-embedding-3-large");
    }

    #[test]
    fn test_vectors_follow_input_order() {
        let data = vec![embedding(1, vec![0.0, 1.0]), embedding(0, vec![1.0, 0.0])];
        let vectors = collect_vectors(data, 2, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_mismatched_responses_are_rejected() {
        let short = collect_vectors(vec![embedding(0, vec![1.0, 0.0])], 2, 2);
        assert!(matches!(short, Err(KikitoriError::Embedding(_))));

        let wrong_width = collect_vectors(vec![embedding(0, vec![1.0, 0.0, 0.0])], 1, 2);
        assert!(matches!(wrong_width, Err(KikitoriError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_api_call() {
        let embedder = OpenAIEmbedder::from_settings(&EmbeddingSettings::default());
        let result = embedder.embed("   ").await;
        assert!(matches!(result, Err(KikitoriError::Embedding(_))));

        let batch = embedder.embed_batch(&[]).await.unwrap();
        assert!(batch.is_empty());
    }
}
