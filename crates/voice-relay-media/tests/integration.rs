//! Transcriber integration tests against a local mock of the AssemblyAI API.
//!
//! Run with: `cargo test -p voice-relay-media --test integration`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

use voice_relay_core::config::TranscriptionConfig;
use voice_relay_core::error::ProviderError;
use voice_relay_media::{AssemblyAiTranscriber, Transcriber};

#[derive(Clone)]
struct MockAssembly {
    /// Polls answered with "processing" before the job completes.
    pending_polls: usize,
    polls: Arc<AtomicUsize>,
    final_status: &'static str,
    final_text: Option<&'static str>,
}

async fn upload(headers: HeaderMap, body: axum::body::Bytes) -> (StatusCode, Json<Value>) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    assert!(!body.is_empty());
    (
        StatusCode::OK,
        Json(json!({"upload_url": "https://cdn.example/upload/abc"})),
    )
}

async fn create(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["audio_url"], "https://cdn.example/upload/abc");
    Json(json!({"id": "t1", "status": "queued"}))
}

async fn poll(State(mock): State<MockAssembly>, Path(id): Path<String>) -> Json<Value> {
    assert_eq!(id, "t1");
    let n = mock.polls.fetch_add(1, Ordering::SeqCst);
    if n < mock.pending_polls {
        return Json(json!({"id": "t1", "status": "processing"}));
    }
    Json(json!({
        "id": "t1",
        "status": mock.final_status,
        "text": mock.final_text,
        "error": if mock.final_status == "error" { Some("audio too short") } else { None },
    }))
}

async fn start_mock(mock: MockAssembly) -> String {
    let app = Router::new()
        .route("/v2/upload", post(upload))
        .route("/v2/transcript", post(create))
        .route("/v2/transcript/{id}", get(poll))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn transcriber(base_url: String, key: &str) -> AssemblyAiTranscriber {
    let config = TranscriptionConfig {
        api_key: Some(key.into()),
        base_url: Some(base_url),
        poll_interval_ms: Some(5),
        poll_timeout_secs: Some(5),
        ..TranscriptionConfig::default()
    };
    AssemblyAiTranscriber::new(&config, Duration::from_secs(5)).unwrap()
}

fn mock(pending_polls: usize, final_status: &'static str, final_text: Option<&'static str>) -> MockAssembly {
    MockAssembly {
        pending_polls,
        polls: Arc::new(AtomicUsize::new(0)),
        final_status,
        final_text,
    }
}

#[tokio::test]
async fn test_transcribe_polls_until_completed() {
    let m = mock(2, "completed", Some("  hello world \n"));
    let polls = m.polls.clone();
    let base = start_mock(m).await;

    let text = transcriber(base, "test-key").transcribe(b"fake-wav").await.unwrap();
    assert_eq!(text, "hello world");
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_transcript_is_failure() {
    let base = start_mock(mock(0, "completed", Some("   "))).await;
    let err = transcriber(base, "test-key").transcribe(b"silence").await.unwrap_err();
    assert_eq!(
        err,
        ProviderError::Transcription("no speech recognized".into())
    );
}

#[tokio::test]
async fn test_provider_error_status_surfaces_reason() {
    let base = start_mock(mock(0, "error", None)).await;
    let err = transcriber(base, "test-key").transcribe(b"x").await.unwrap_err();
    match err {
        ProviderError::Transcription(msg) => assert!(msg.contains("audio too short")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rejected_key_is_transcription_error() {
    let base = start_mock(mock(0, "completed", Some("hi"))).await;
    let err = transcriber(base, "wrong-key").transcribe(b"x").await.unwrap_err();
    match err {
        ProviderError::Transcription(msg) => assert!(msg.contains("401")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_poll_deadline_is_transcription_error() {
    let m = mock(usize::MAX, "completed", Some("never"));
    let polls = m.polls.clone();
    let base = start_mock(m).await;

    let config = TranscriptionConfig {
        api_key: Some("test-key".into()),
        base_url: Some(base),
        poll_interval_ms: Some(10),
        poll_timeout_secs: Some(1),
        ..TranscriptionConfig::default()
    };
    let stt = AssemblyAiTranscriber::new(&config, Duration::from_secs(5)).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(10), stt.transcribe(b"x"))
        .await
        .expect("deadline should end polling")
        .unwrap_err();
    match err {
        ProviderError::Transcription(msg) => {
            assert!(msg.contains("not ready"), "got: {msg}");
            assert!(msg.contains("t1"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(polls.load(Ordering::SeqCst) > 0);
}
