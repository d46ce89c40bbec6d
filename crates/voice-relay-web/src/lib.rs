//! Voice chat UI: embedded static assets served by the gateway.
//!
//! The `ui/` directory is baked into the binary with `rust-embed`; the
//! `debug-embed` feature embeds it in debug builds as well.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;
use tracing::debug;

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

/// Build an axum `Router` that serves the recorder page at `/` and its
/// assets under `/static/`.
pub fn ui_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/static/{*path}", get(static_handler))
}

async fn index_handler() -> Response {
    serve_file("index.html")
}

async fn static_handler(Path(path): Path<String>) -> Response {
    serve_file(&path)
}

fn serve_file(path: &str) -> Response {
    match UiAssets::get(path) {
        Some(asset) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => {
            debug!(path, "UI asset not found");
            (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response()
        }
    }
}
