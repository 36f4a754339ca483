use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        DefaultBodyLimit, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures::stream::StreamExt;
use serde_json::{json, Value};
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use flatframe_core::{StateView, Status, VideoFile, DOWNLOAD_FILE_NAME};
use flatframe_media::{is_video, media_router, HandleRegistry};
use flatframe_studio::Studio;

/// Where display-handle URLs are served.
pub const MEDIA_BASE_PATH: &str = "/media";

/// Header carrying the original file name on upload.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Shared application state for API handlers.
pub struct AppState {
    pub studio: Studio,
    pub handles: Arc<HandleRegistry>,
}

/// Build the Axum router with all API routes and the media previews.
pub fn build_router(state: Arc<AppState>) -> Router {
    let media = media_router(state.handles.clone());

    Router::new()
        .route("/api/health", get(health))
        .route("/api/state", get(get_state))
        .route(
            "/api/file",
            post(select_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/generate", post(generate))
        .route("/api/reset", post(reset))
        .route("/api/download", get(download))
        .route("/api/ws", get(ws_handler))
        .with_state(state)
        .nest(MEDIA_BASE_PATH, media)
}

/// WebSocket handler pushing a fresh state view on every transition.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut stream = WatchStream::new(state.studio.subscribe());

    while let Some(view) = stream.next().await {
        if let Ok(json) = serde_json::to_string(&view) {
            if socket.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    }
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "flatframe",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateView> {
    Json(state.studio.view().await)
}

/// Select a video. The raw body is the file; `Content-Type` must be `video/*`.
async fn select_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_video(&content_type) {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "error": format!("expected a video, got '{content_type}'") })),
        )
            .into_response();
    }
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "empty upload" })),
        )
            .into_response();
    }

    let name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("upload")
        .to_string();

    if !state
        .studio
        .select_file(VideoFile::new(name, content_type, body))
        .await
    {
        return conflict(&state, "a generation is in progress").await;
    }
    Json(state.studio.view().await).into_response()
}

async fn generate(State(state): State<Arc<AppState>>) -> Response {
    match state.studio.generate().await {
        Some(_) => {
            info!("Generation requested");
            (StatusCode::ACCEPTED, Json(state.studio.view().await)).into_response()
        }
        None => conflict(&state, "generate is only available with a selected file").await,
    }
}

/// Back to idle. Repeating it is harmless; refused while generating.
async fn reset(State(state): State<Arc<AppState>>) -> Response {
    if !state.studio.reset().await && state.studio.status().await == Status::Generating {
        return conflict(&state, "cannot reset while generating").await;
    }
    Json(state.studio.view().await).into_response()
}

/// The generated video as an attachment.
async fn download(State(state): State<Arc<AppState>>) -> Response {
    let Some(video) = state.studio.result_video().await else {
        return conflict(&state, "no generated video is available").await;
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, video.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        video.bytes,
    )
        .into_response()
}

async fn conflict(state: &AppState, message: &str) -> Response {
    let view = state.studio.view().await;
    warn!(status = %view.status, reason = message, "Request conflicts with current state");
    (
        StatusCode::CONFLICT,
        Json(json!({ "error": message, "state": view })),
    )
        .into_response()
}
