//! STT → generate → TTS orchestration with per-stage fallback.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use voice_relay_core::config::Config;
use voice_relay_core::error::ProviderError;
use voice_relay_core::session::{SessionStore, Turn};
use voice_relay_core::types::Stage;
use voice_relay_media::{AssemblyAiTranscriber, Transcriber};
use voice_relay_providers::{GeminiGenerator, TextGenerator};
use voice_relay_tts::{MurfSynthesizer, SpeechSynthesizer};

use crate::ChatResponse;

pub struct VoicePipeline {
    sessions: Arc<dyn SessionStore>,
    stt: Arc<dyn Transcriber>,
    llm: Arc<dyn TextGenerator>,
    tts: Arc<dyn SpeechSynthesizer>,
    fallback_text: String,
}

impl VoicePipeline {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        stt: Arc<dyn Transcriber>,
        llm: Arc<dyn TextGenerator>,
        tts: Arc<dyn SpeechSynthesizer>,
        fallback_text: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            stt,
            llm,
            tts,
            fallback_text: fallback_text.into(),
        }
    }

    /// Wire the AssemblyAI, Gemini and Murf clients from config.
    pub fn from_config(config: &Config, sessions: Arc<dyn SessionStore>) -> anyhow::Result<Self> {
        let timeout = config.request_timeout();
        Ok(Self::new(
            sessions,
            Arc::new(AssemblyAiTranscriber::new(&config.transcription(), timeout)?),
            Arc::new(GeminiGenerator::new(&config.generation(), timeout)?),
            Arc::new(MurfSynthesizer::new(&config.tts(), timeout)?),
            config.fallback_text(),
        ))
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn stt(&self) -> &Arc<dyn Transcriber> {
        &self.stt
    }

    pub fn llm(&self) -> &Arc<dyn TextGenerator> {
        &self.llm
    }

    pub fn tts(&self) -> &Arc<dyn SpeechSynthesizer> {
        &self.tts
    }

    pub fn fallback_text(&self) -> &str {
        &self.fallback_text
    }

    /// Run one voice turn for `session_id`. Never fails; stage errors become
    /// a fallback envelope.
    ///
    /// Runs for the same session are serialised. A user turn is recorded
    /// after transcription succeeds and an assistant turn after generation
    /// succeeds; a later TTS failure does not remove them.
    pub async fn run(&self, session_id: &str, audio: &[u8]) -> ChatResponse {
        let _guard = self.sessions.acquire(session_id).await;
        let started = Instant::now();

        // STT
        let transcript = if audio.is_empty() {
            Err(ProviderError::Transcription("empty audio upload".into()))
        } else {
            self.stt.transcribe(audio).await
        };
        let transcript = match require_text(transcript, || {
            ProviderError::Transcription("no speech recognized".into())
        }) {
            Ok(text) => text,
            Err(e) => return self.fallback(session_id, Stage::Stt, String::new(), e).await,
        };
        self.sessions
            .append(session_id, Turn::user(transcript.clone()))
            .await;

        // GENERATE
        let history = self.sessions.get(session_id).await;
        let generated = self.llm.generate(&history).await;
        let llm_text = match require_text(generated, || {
            ProviderError::Generation("empty response".into())
        }) {
            Ok(text) => text,
            Err(e) => return self.fallback(session_id, Stage::Generate, transcript, e).await,
        };
        self.sessions
            .append(session_id, Turn::assistant(llm_text.clone()))
            .await;
        let history = self.sessions.get(session_id).await;

        // TTS
        let audio_urls = match self.tts.synthesize(&llm_text).await {
            Ok(urls) => urls,
            Err(e) => return self.fallback(session_id, Stage::Tts, transcript, e).await,
        };

        info!(
            session = %session_id,
            clips = audio_urls.len(),
            turns = history.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Voice turn completed"
        );

        ChatResponse {
            audio_urls,
            transcript,
            llm_text,
            history,
            fallback: false,
            failure_stage: None,
        }
    }

    async fn fallback(
        &self,
        session_id: &str,
        stage: Stage,
        transcript_hint: String,
        cause: ProviderError,
    ) -> ChatResponse {
        error!(session = %session_id, %stage, error = %cause, "Pipeline stage failed, using fallback");

        let audio_urls = match self.tts.synthesize_fallback(&self.fallback_text).await {
            Ok(url) => vec![url],
            Err(e) => {
                warn!(session = %session_id, error = %e, "Fallback speech unavailable, replying without audio");
                Vec::new()
            }
        };

        if !transcript_hint.is_empty() {
            self.sessions
                .append(session_id, Turn::user(transcript_hint.clone()))
                .await;
        }
        self.sessions
            .append(session_id, Turn::assistant(self.fallback_text.clone()))
            .await;

        ChatResponse {
            audio_urls,
            transcript: transcript_hint,
            llm_text: self.fallback_text.clone(),
            history: self.sessions.get(session_id).await,
            fallback: true,
            failure_stage: Some(stage),
        }
    }
}

/// Blank adapter output counts as a stage failure.
fn require_text(
    result: Result<String, ProviderError>,
    on_empty: impl FnOnce() -> ProviderError,
) -> Result<String, ProviderError> {
    match result {
        Ok(text) if text.trim().is_empty() => Err(on_empty()),
        other => other,
    }
}
