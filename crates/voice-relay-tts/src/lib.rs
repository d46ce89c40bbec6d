//! Text-to-speech integration.
//!
//! Providers cap the characters accepted per call, so [`split_chunks`] cuts
//! long replies into ordered pieces and a [`SpeechSynthesizer`] returns one
//! audio URL per piece.

use async_trait::async_trait;

use voice_relay_core::error::ProviderError;

pub mod murf;

pub use murf::MurfSynthesizer;

/// Response fields that may carry the audio location, in lookup order.
///
/// Field names drift between provider API versions; add aliases here.
pub const AUDIO_URL_FIELDS: &[&str] = &["audioUrl", "audioFile", "audio_url"];

/// Converts text into hosted audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning audio URLs in playback order.
    ///
    /// All-or-nothing: if any chunk fails, no URLs are returned.
    async fn synthesize(&self, text: &str) -> Result<Vec<String>, ProviderError>;

    /// Synthesize a short fixed reply as a single clip.
    ///
    /// Only the first clip is kept, so text longer than one chunk is cut;
    /// `Config::validate` rejects a fallback text over `tts.max_chars`.
    async fn synthesize_fallback(&self, text: &str) -> Result<String, ProviderError> {
        self.synthesize(text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Synthesis("no audio for fallback text".into()))
    }
}

/// Split `text` into contiguous pieces of at most `limit` characters.
///
/// Cuts fall on character counts only, with no regard for words. Empty text
/// yields no chunks. A zero limit disables splitting.
pub fn split_chunks(text: &str, limit: usize) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    if limit == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == limit {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&text[start..]);
    chunks
}

/// First non-empty string among [`AUDIO_URL_FIELDS`] in a provider response.
pub fn extract_audio_url(response: &serde_json::Value) -> Option<String> {
    AUDIO_URL_FIELDS
        .iter()
        .filter_map(|field| response.get(*field).and_then(|v| v.as_str()))
        .find(|url| !url.is_empty())
        .map(str::to_string)
}
