//! Google Gemini via the `generateContent` REST endpoint.

use super::TextGenerator;
use crate::config::GenerationSettings;
use crate::error::{KikitoriError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Gemini text generator.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            client: crate::http_client(Duration::from_secs(settings.timeout_seconds)),
            api_key: api_key.into(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", API_BASE, self.model)
    }

    fn request<'a>(&self, system: Option<&'a str>, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    #[instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request(system, prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KikitoriError::Generation(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .into_text()
            .ok_or_else(|| KikitoriError::Generation("Empty response from Gemini".to_string()))?;

        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let generator = GeminiGenerator::new("key", &GenerationSettings::default());
        let value = serde_json::to_value(generator.request(Some("be brief"), "hello")).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 2048);

        let value = serde_json::to_value(generator.request(None, "hi")).unwrap();
        assert!(value.get("systemInstruction").is_none());

        assert!(generator.endpoint().ends_with("/gemini-2.0-flash:generateContent"));
    }

    #[test]
    fn test_response_text() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"situation\":"},{"text":"\"x\"}]"}],"role":"model"}}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), r#"[{"situation":"x"}]"#);

        let blocked: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(blocked.into_text().is_none());
    }
}
