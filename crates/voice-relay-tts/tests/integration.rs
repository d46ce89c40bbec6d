//! Murf synthesizer tests against a local mock of the generate endpoint.
//!
//! Run with: `cargo test -p voice-relay-tts --test integration`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use serde_json::{Value, json};

use voice_relay_core::config::TtsConfig;
use voice_relay_core::error::ProviderError;
use voice_relay_tts::{MurfSynthesizer, SpeechSynthesizer};

#[derive(Clone, Default)]
struct MockMurf {
    /// Texts received, in call order.
    calls: Arc<Mutex<Vec<String>>>,
    /// 1-based call number that fails with HTTP 500.
    fail_on: Option<usize>,
    /// Field name the mock uses for the audio location.
    field: &'static str,
}

async fn generate(
    State(mock): State<MockMurf>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    assert_eq!(
        headers.get("api-key").and_then(|v| v.to_str().ok()),
        Some("murf-key")
    );
    assert_eq!(body["voiceId"], "en-US-natalie");
    assert_eq!(body["format"], "MP3");

    let n = {
        let mut calls = mock.calls.lock().unwrap();
        calls.push(body["text"].as_str().unwrap_or_default().to_string());
        calls.len()
    };

    if mock.fail_on == Some(n) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"errorMessage": "voice unavailable"})),
        );
    }

    let mut resp = serde_json::Map::new();
    resp.insert(
        mock.field.to_string(),
        json!(format!("http://x/{n}.mp3")),
    );
    (StatusCode::OK, Json(Value::Object(resp)))
}

async fn start_mock(mock: MockMurf) -> String {
    let app = Router::new()
        .route("/v1/speech/generate-with-key", post(generate))
        .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn synthesizer(base_url: String, max_chars: usize) -> MurfSynthesizer {
    let config = TtsConfig {
        api_key: Some("murf-key".into()),
        base_url: Some(base_url),
        max_chars: Some(max_chars),
        ..TtsConfig::default()
    };
    MurfSynthesizer::new(&config, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_short_text_single_call() {
    let mock = MockMurf {
        field: "audioFile",
        ..MockMurf::default()
    };
    let calls = mock.calls.clone();
    let base = start_mock(mock).await;

    let urls = synthesizer(base, 3000).synthesize("hi there").await.unwrap();
    assert_eq!(urls, vec!["http://x/1.mp3"]);
    assert_eq!(*calls.lock().unwrap(), vec!["hi there".to_string()]);
}

#[tokio::test]
async fn test_long_text_chunks_in_order() {
    let mock = MockMurf {
        field: "audioUrl",
        ..MockMurf::default()
    };
    let calls = mock.calls.clone();
    let base = start_mock(mock).await;

    let text = format!("{}{}{}", "a".repeat(3000), "b".repeat(3000), "c".repeat(10));
    let urls = synthesizer(base, 3000).synthesize(&text).await.unwrap();

    assert_eq!(
        urls,
        vec!["http://x/1.mp3", "http://x/2.mp3", "http://x/3.mp3"]
    );
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.chars().count() <= 3000));
    assert_eq!(calls.concat(), text);
}

#[tokio::test]
async fn test_empty_text_makes_no_calls() {
    let mock = MockMurf {
        field: "audioUrl",
        ..MockMurf::default()
    };
    let calls = mock.calls.clone();
    let base = start_mock(mock).await;

    let urls = synthesizer(base, 3000).synthesize("").await.unwrap();
    assert!(urls.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mid_batch_failure_discards_all_urls() {
    let mock = MockMurf {
        field: "audio_url",
        fail_on: Some(2),
        ..MockMurf::default()
    };
    let calls = mock.calls.clone();
    let base = start_mock(mock).await;

    let err = synthesizer(base, 5)
        .synthesize("0123456789abcde")
        .await
        .unwrap_err();
    match err {
        ProviderError::Synthesis(msg) => {
            assert!(msg.contains("chunk 2/3"), "got: {msg}");
            assert!(msg.contains("voice unavailable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // The third chunk is never attempted.
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_audio_field_is_synthesis_error() {
    let mock = MockMurf {
        field: "encodedAudio",
        ..MockMurf::default()
    };
    let base = start_mock(mock).await;

    let err = synthesizer(base, 3000).synthesize("hello").await.unwrap_err();
    assert!(matches!(err, ProviderError::Synthesis(ref m) if m.contains("audio URL missing")));
}

#[tokio::test]
async fn test_fallback_returns_single_url() {
    let mock = MockMurf {
        field: "audioUrl",
        ..MockMurf::default()
    };
    let base = start_mock(mock).await;

    let url = synthesizer(base, 3000)
        .synthesize_fallback("I'm having trouble connecting right now.")
        .await
        .unwrap();
    assert_eq!(url, "http://x/1.mp3");
}
