//! Media server: resolves display-handle URLs over HTTP.
//!
//! Mount at the registry's base path (`/media` by default):
//!   GET /media/:handle  serves the media registered under a live handle

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::handles::HandleRegistry;

/// Build the media router over a shared handle registry.
pub fn media_router(registry: Arc<HandleRegistry>) -> Router {
    Router::new()
        .route("/:handle", get(serve_media))
        .with_state(registry)
}

async fn serve_media(
    Path(handle): Path<String>,
    State(registry): State<Arc<HandleRegistry>>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&handle) else {
        return (StatusCode::BAD_REQUEST, "Invalid handle").into_response();
    };

    let Some(media) = registry.get(&id) else {
        debug!(handle = %id, "Media handle not found or revoked");
        return (StatusCode::NOT_FOUND, "Media handle not found").into_response();
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, media.content_type),
            (header::CONTENT_DISPOSITION, "inline".to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        media.data,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use flatframe_core::DisplayHandles;
    use tokio::net::TcpListener;

    async fn serve(registry: Arc<HandleRegistry>) -> String {
        let app = Router::new().nest("/media", media_router(registry));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn serves_live_handle_and_404s_after_revoke() {
        let registry = Arc::new(HandleRegistry::default());
        let base = serve(Arc::clone(&registry)).await;
        let handle = registry.create(Bytes::from_static(b"fake-mp4"), "video/mp4");
        let url = format!("{base}{}", handle.url());

        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "video/mp4");
        assert_eq!(resp.bytes().await.unwrap().as_ref(), b"fake-mp4");

        registry.revoke(handle);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn rejects_malformed_handle() {
        let base = serve(Arc::new(HandleRegistry::default())).await;
        let resp = reqwest::get(format!("{base}/media/not-a-uuid")).await.unwrap();
        assert_eq!(resp.status(), 400);
    }
}
