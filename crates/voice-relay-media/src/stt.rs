//! Speech-to-text from uploaded audio bytes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use voice_relay_core::config::TranscriptionConfig;
use voice_relay_core::error::ProviderError;

/// Turns raw audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`, returning the trimmed transcript.
    ///
    /// An empty transcript is an error, not an empty success.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ProviderError>;
}

/// AssemblyAI client: upload, create a transcript job, poll until done.
pub struct AssemblyAiTranscriber {
    base_url: String,
    api_key: Option<String>,
    poll_interval: Duration,
    poll_timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptJob {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn stt_error(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::Transcription(e.to_string())
}

impl AssemblyAiTranscriber {
    pub fn new(config: &TranscriptionConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.resolve_api_key(),
            poll_interval: config.poll_interval(),
            poll_timeout: config.poll_timeout(),
            client,
        })
    }

    async fn upload(&self, api_key: &str, audio: &[u8]) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", api_key)
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(stt_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(stt_error(format!("upload error {status}: {body}")));
        }

        let upload: UploadResponse = resp.json().await.map_err(stt_error)?;
        Ok(upload.upload_url)
    }

    async fn fetch_job(
        &self,
        api_key: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<TranscriptJob, ProviderError> {
        let resp = request
            .header("authorization", api_key)
            .send()
            .await
            .map_err(stt_error)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(stt_error(format!("transcript API error {status}: {body}")));
        }

        resp.json().await.map_err(stt_error)
    }
}

#[async_trait]
impl Transcriber for AssemblyAiTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::CredentialMissing {
                provider: "AssemblyAI",
            })?;

        debug!(audio_bytes = audio.len(), "Uploading audio for transcription");
        let audio_url = self.upload(api_key, audio).await?;

        let mut job = self
            .fetch_job(
                api_key,
                self.client
                    .post(format!("{}/v2/transcript", self.base_url))
                    .json(&json!({ "audio_url": audio_url })),
            )
            .await?;

        let deadline = tokio::time::Instant::now() + self.poll_timeout;
        loop {
            match job.status.as_str() {
                "completed" => break,
                "error" => {
                    let reason = job.error.unwrap_or_else(|| "unknown error".into());
                    return Err(stt_error(reason));
                }
                _ => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(stt_error(format!(
                    "transcript {} not ready after {}s",
                    job.id,
                    self.poll_timeout.as_secs()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
            job = self
                .fetch_job(
                    api_key,
                    self.client
                        .get(format!("{}/v2/transcript/{}", self.base_url, job.id)),
                )
                .await?;
        }

        let text = job.text.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(stt_error("no speech recognized"));
        }

        info!(chars = text.chars().count(), "Audio transcribed");
        Ok(text)
    }
}
