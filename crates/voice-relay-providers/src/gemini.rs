//! Google Generative AI (Gemini) provider.
//!
//! Uses the non-streaming `generateContent` endpoint. Auth is via API key in
//! query parameter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use voice_relay_core::config::GenerationConfig;
use voice_relay_core::error::ProviderError;
use voice_relay_core::session::Turn;

use crate::{TextGenerator, render_prompt};

pub struct GeminiGenerator {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            api_key: config.resolve_api_key(),
            client,
        })
    }
}

// --- Gemini request/response types ---

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn llm_error(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::Generation(e.to_string())
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, history: &[Turn]) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::CredentialMissing { provider: "Gemini" })?;

        let body = GeminiRequest {
            contents: vec![json!({
                "role": "user",
                "parts": [{ "text": render_prompt(history) }],
            })],
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        debug!(model = %self.model, turns = history.len(), "Calling Gemini API");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(llm_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(llm_error(format!("Gemini API error {status}: {body}")));
        }

        let parsed: GeminiResponse = resp.json().await.map_err(llm_error)?;
        let text = parsed.text().trim().to_string();
        if text.is_empty() {
            return Err(llm_error("empty response"));
        }

        info!(model = %self.model, chars = text.chars().count(), "Generated reply");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello, " }, { "text": "world." }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(resp.text(), "Hello, world.");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert_eq!(resp.text(), "");
    }

    #[tokio::test]
    async fn test_missing_key_is_credential_error() {
        let config = GenerationConfig {
            api_key_env: Some("NONEXISTENT_VAR_VR_GEMINI".into()),
            ..GenerationConfig::default()
        };
        let llm = GeminiGenerator::new(&config, Duration::from_secs(5)).unwrap();
        let err = llm.generate(&[Turn::user("hi")]).await.unwrap_err();
        assert_eq!(err, ProviderError::CredentialMissing { provider: "Gemini" });
    }
}
