//! Voice pipeline: turns one audio upload into a spoken reply.
//!
//! [`VoicePipeline::run`] drives speech-to-text, text generation and
//! text-to-speech in order, recording each successful turn in the session
//! store. Any stage failure short-circuits to a canned fallback reply; the
//! caller always receives a [`ChatResponse`].

use serde::{Deserialize, Serialize};

use voice_relay_core::session::Turn;
use voice_relay_core::types::Stage;

pub mod pipeline;

pub use pipeline::VoicePipeline;

/// Envelope returned for every chat request, success or fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub audio_urls: Vec<String>,
    pub transcript: String,
    pub llm_text: String,
    pub history: Vec<Turn>,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_stage: Option<Stage>,
}
