//! OpenAI chat completions.

use super::TextGenerator;
use crate::config::GenerationSettings;
use crate::error::{KikitoriError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI chat generator.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl OpenAIGenerator {
    pub fn new(settings: &GenerationSettings) -> Self {
        // The default Gemini model name means nothing to OpenAI.
        let model = if settings.model.starts_with("gemini") {
            "gpt-4o-mini".to_string()
        } else {
            settings.model.clone()
        };

        Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_seconds)),
            model,
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIGenerator {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| KikitoriError::Generation(e.to_string()))?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| KikitoriError::Generation(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_output_tokens)
            .build()
            .map_err(|e| KikitoriError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| KikitoriError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| KikitoriError::Generation("Empty response from LLM".to_string()))?;

        debug!("OpenAI returned {} characters", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
