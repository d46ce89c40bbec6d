//! Text-generation provider abstraction.
//!
//! A [`TextGenerator`] receives the full conversation history and returns
//! the next assistant reply. History is flattened into a single role-labelled
//! prompt by [`render_prompt`].

use async_trait::async_trait;

use voice_relay_core::error::ProviderError;
use voice_relay_core::session::Turn;

pub mod gemini;

pub use gemini::GeminiGenerator;

/// Produces the next assistant turn for a conversation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a trimmed, non-empty reply to `history`.
    async fn generate(&self, history: &[Turn]) -> Result<String, ProviderError>;
}

/// Render turns as `User: ...` / `Assistant: ...` lines ending with an
/// `Assistant:` cue.
pub fn render_prompt(history: &[Turn]) -> String {
    let mut prompt = history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str("\nAssistant:");
    prompt
}
