//! Murf text-to-speech client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use voice_relay_core::config::TtsConfig;
use voice_relay_core::error::ProviderError;

use crate::{SpeechSynthesizer, extract_audio_url, split_chunks};

pub struct MurfSynthesizer {
    base_url: String,
    api_key: Option<String>,
    voice_id: String,
    format: String,
    style: Option<String>,
    max_chars: usize,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MurfRequest<'a> {
    voice_id: &'a str,
    text: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
}

fn tts_error(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::Synthesis(e.to_string())
}

impl MurfSynthesizer {
    pub fn new(config: &TtsConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            voice_id: config.voice_id().to_string(),
            format: config.format().to_string(),
            style: config.style.clone(),
            max_chars: config.max_chars(),
            client,
        })
    }

    async fn synthesize_chunk(&self, api_key: &str, text: &str) -> Result<String, ProviderError> {
        let body = MurfRequest {
            voice_id: &self.voice_id,
            text,
            format: &self.format,
            style: self.style.as_deref(),
        };

        let resp = self
            .client
            .post(format!("{}/v1/speech/generate-with-key", self.base_url))
            .header("api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(tts_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(tts_error(format!("Murf API error {status}: {body}")));
        }

        let result: serde_json::Value = resp.json().await.map_err(tts_error)?;
        extract_audio_url(&result).ok_or_else(|| tts_error("audio URL missing in Murf response"))
    }
}

#[async_trait]
impl SpeechSynthesizer for MurfSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<String>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::CredentialMissing { provider: "Murf" })?;

        let chunks = split_chunks(text, self.max_chars);
        debug!(
            voice = %self.voice_id,
            chars = text.chars().count(),
            chunks = chunks.len(),
            "Synthesizing speech"
        );

        let mut urls = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let url = self
                .synthesize_chunk(api_key, chunk)
                .await
                .map_err(|e| match e {
                    ProviderError::Synthesis(msg) => ProviderError::Synthesis(format!(
                        "chunk {}/{}: {msg}",
                        i + 1,
                        chunks.len()
                    )),
                    other => other,
                })?;
            urls.push(url);
        }

        info!(clips = urls.len(), "Speech synthesized");
        Ok(urls)
    }
}
