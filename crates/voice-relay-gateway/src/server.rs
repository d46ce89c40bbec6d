//! Axum-based HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use voice_relay_core::session::SessionStore;

use crate::state::AppState;
use crate::{chat, direct};

/// Build the gateway router.
///
/// When `ui_enabled` is true, the embedded UI is served at `/` and `/static/*`.
pub fn router(state: Arc<AppState>, ui_enabled: bool) -> Router {
    let body_limit = state.config.max_upload_bytes();

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/agent/chat/{session_id}", post(chat::agent_chat))
        .route("/generate-audio", post(direct::generate_audio))
        .route("/upload-audio", post(direct::upload_audio))
        .route("/transcribe/file", post(direct::transcribe_file))
        .route("/tts/echo", post(direct::tts_echo))
        .route("/llm/query", post(direct::llm_query));

    #[cfg(feature = "metrics")]
    let app = if state.metrics.is_some() {
        app.route("/metrics", get(metrics_handler))
    } else {
        app
    };

    let mut app = app.with_state(state);

    if ui_enabled {
        app = app.merge(voice_relay_web::ui_router());
    }

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the gateway and block until Ctrl+C.
pub async fn start_gateway(
    state: Arc<AppState>,
    port: u16,
    ui_enabled: bool,
) -> anyhow::Result<()> {
    let bind_addr = state.config.gateway_bind();
    let cancel = CancellationToken::new();
    let sweeper = spawn_session_sweeper(
        state.sessions().clone(),
        state.config.sweep_interval(),
        cancel.clone(),
    );

    let app = router(state, ui_enabled);
    if ui_enabled {
        info!("Voice chat UI available at http://{bind_addr}:{port}/");
    }

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    cancel.cancel();
    let _ = sweeper.await;
    served?;
    Ok(())
}

/// Periodically drop idle sessions until `cancel` fires.
pub fn spawn_session_sweeper(
    sessions: Arc<dyn SessionStore>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let interval = interval.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = sessions.evict_expired().await;
                    if evicted > 0 {
                        info!(evicted, "Swept idle sessions");
                    }
                }
            }
        }
        debug!("Session sweeper stopped");
    })
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let sessions = state.sessions().len().await;

    axum::Json(json!({
        "status": "ok",
        "version": version,
        "sessions": sessions,
    }))
}

#[cfg(feature = "metrics")]
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(%e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
