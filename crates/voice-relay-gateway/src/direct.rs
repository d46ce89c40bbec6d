//! Single-stage endpoints that call one or two providers without touching
//! session history.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use serde::{Deserialize, Serialize};

use voice_relay_core::session::Turn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::uploads::{read_form, save_upload};

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAudioResponse {
    pub audio_url: String,
    pub audio_urls: Vec<String>,
}

/// `POST /generate-audio`: speak the given text.
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextRequest>,
) -> Result<Json<GenerateAudioResponse>, ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("text must not be empty"));
    }

    let audio_urls = state.pipeline.tts().synthesize(text).await?;
    let audio_url = audio_urls
        .first()
        .cloned()
        .ok_or_else(|| ApiError::internal("no audio returned"))?;

    Ok(Json(GenerateAudioResponse {
        audio_url,
        audio_urls,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub filename: String,
    pub content_type: Option<String>,
    pub size: usize,
}

/// `POST /upload-audio`: persist the uploaded file.
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let file = read_form(multipart).await?.require_file()?;
    let path = save_upload(&state.uploads_dir, &file).await?;

    Ok(Json(UploadResponse {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content_type: file.content_type,
        size: file.data.len(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

/// `POST /transcribe/file`: audio to text.
pub async fn transcribe_file(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let file = read_form(multipart).await?.require_file()?;
    let transcript = state.pipeline.stt().transcribe(&file.data).await?;
    Ok(Json(TranscribeResponse { transcript }))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoResponse {
    pub transcript: String,
    pub audio_urls: Vec<String>,
}

/// `POST /tts/echo`: transcribe, then speak the transcript back.
pub async fn tts_echo(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<EchoResponse>, ApiError> {
    let file = read_form(multipart).await?.require_file()?;
    let transcript = state.pipeline.stt().transcribe(&file.data).await?;
    let audio_urls = state.pipeline.tts().synthesize(&transcript).await?;
    Ok(Json(EchoResponse {
        transcript,
        audio_urls,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LlmQueryParams {
    pub speak: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmQueryResponse {
    pub query: String,
    pub llm_text: String,
    pub audio_urls: Vec<String>,
}

/// `POST /llm/query`: one-shot question from a `text` field or a `file`
/// recording; the answer is spoken unless `speak=false`.
pub async fn llm_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LlmQueryParams>,
    multipart: Multipart,
) -> Result<Json<LlmQueryResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let query = match form.text("text") {
        Some(text) => text.to_string(),
        None => {
            let file = form
                .require_file()
                .map_err(|_| ApiError::bad_request("either 'text' or 'file' is required"))?;
            state.pipeline.stt().transcribe(&file.data).await?
        }
    };

    let llm_text = state
        .pipeline
        .llm()
        .generate(&[Turn::user(query.clone())])
        .await?;

    let audio_urls = if params.speak.unwrap_or(true) {
        state.pipeline.tts().synthesize(&llm_text).await?
    } else {
        Vec::new()
    };

    Ok(Json(LlmQueryResponse {
        query,
        llm_text,
        audio_urls,
    }))
}
