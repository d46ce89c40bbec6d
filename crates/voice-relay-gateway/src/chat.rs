//! `POST /agent/chat/{session_id}`: the voice pipeline endpoint.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
};
use bytes::Bytes;
use tracing::{debug, warn};

use voice_relay_agent::ChatResponse;

use crate::state::AppState;
use crate::uploads::read_form;

/// Always answers 200; failures are reported inside the envelope.
///
/// A missing or unreadable `file` part runs the pipeline with no audio,
/// which ends in the STT fallback.
pub async fn agent_chat(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<ChatResponse> {
    let audio = match multipart {
        Ok(multipart) => match read_form(multipart).await {
            Ok(form) => form.file.map(|f| f.data).unwrap_or_default(),
            Err(e) => {
                warn!(session = %session_id, error = ?e, "Unreadable chat upload");
                Bytes::new()
            }
        },
        Err(e) => {
            warn!(session = %session_id, error = %e, "Chat request is not multipart");
            Bytes::new()
        }
    };

    debug!(session = %session_id, audio_bytes = audio.len(), "Chat request");

    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();

    let response = state.pipeline.run(&session_id, &audio).await;

    #[cfg(feature = "metrics")]
    crate::metrics::record_chat(response.failure_stage, started.elapsed().as_secs_f64());

    Json(response)
}
