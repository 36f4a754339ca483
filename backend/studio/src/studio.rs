//! Async orchestrator around [`Session`].
//!
//! `generate` moves the session into `Generating` under the lock, then runs
//! extraction and generation on a spawned task. Every applied transition is
//! published on a watch channel for the view layer.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use flatframe_core::{
    DisplayHandles, FrameExtractor, StateView, Status, StudioError, VideoFile, VideoGenerator,
    VideoPayload,
};

use crate::session::{GenerationOutcome, GenerationTicket, Session};

#[derive(Clone)]
pub struct Studio {
    session: Arc<Mutex<Session>>,
    extractor: Arc<dyn FrameExtractor>,
    generator: Arc<dyn VideoGenerator>,
    view_tx: Arc<watch::Sender<StateView>>,
    cancel: CancellationToken,
}

impl Studio {
    pub fn new(
        extractor: Arc<dyn FrameExtractor>,
        generator: Arc<dyn VideoGenerator>,
        handles: Arc<dyn DisplayHandles>,
    ) -> Self {
        let (view_tx, _) = watch::channel(StateView::default());
        Self {
            session: Arc::new(Mutex::new(Session::new(handles))),
            extractor,
            generator,
            view_tx: Arc::new(view_tx),
            cancel: CancellationToken::new(),
        }
    }

    /// Receives a fresh view after every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<StateView> {
        self.view_tx.subscribe()
    }

    pub async fn view(&self) -> StateView {
        self.session.lock().await.view()
    }

    pub async fn status(&self) -> Status {
        self.session.lock().await.status()
    }

    pub async fn result_video(&self) -> Option<VideoPayload> {
        self.session.lock().await.result_video()
    }

    pub async fn select_file(&self, file: VideoFile) -> bool {
        let mut session = self.session.lock().await;
        let applied = session.select_file(file);
        if applied {
            self.publish(&session);
        }
        applied
    }

    /// Start an attempt. `None` unless a file is selected and no attempt is
    /// running.
    pub async fn generate(&self) -> Option<JoinHandle<()>> {
        if self.cancel.is_cancelled() {
            warn!("Generate ignored after shutdown");
            return None;
        }

        let ticket = {
            let mut session = self.session.lock().await;
            let ticket = session.begin_generation()?;
            self.publish(&session);
            ticket
        };

        let studio = self.clone();
        Some(tokio::spawn(async move { studio.run_attempt(ticket).await }))
    }

    pub async fn reset(&self) -> bool {
        let mut session = self.session.lock().await;
        let applied = session.reset();
        if applied {
            self.publish(&session);
        }
        applied
    }

    /// Wait until no attempt is running and return the settled view.
    pub async fn wait_until_settled(&self) -> StateView {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|view| view.status != Status::Generating)
            .await
            .map(|view| view.clone());
        match settled {
            Ok(view) => view,
            Err(_) => self.view().await,
        }
    }

    /// Cancel the running attempt, if any. The attempt settles in `Failed`.
    pub fn shutdown(&self) {
        info!("Studio shutting down");
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn publish(&self, session: &Session) {
        self.view_tx.send_replace(session.view());
    }

    async fn run_attempt(self, ticket: GenerationTicket) {
        let outcome = self.produce(&ticket.file).await;
        let mut session = self.session.lock().await;
        if session.finish_generation(ticket.attempt, outcome) {
            self.publish(&session);
        }
    }

    async fn produce(&self, file: &VideoFile) -> GenerationOutcome {
        let snapshot = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(StudioError::Generation("generation cancelled".into()));
            }
            snapshot = self.extractor.extract_first_frame(file) => snapshot?,
        };
        info!(
            generator = self.generator.name(),
            snapshot_bytes = snapshot.image_bytes.len(),
            "First frame extracted"
        );
        self.generator
            .generate_styled_video(&snapshot, &self.cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use flatframe_core::Snapshot;
    use flatframe_media::HandleRegistry;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct MockExtractor {
        fail: bool,
    }

    #[async_trait]
    impl FrameExtractor for MockExtractor {
        async fn extract_first_frame(&self, video: &VideoFile) -> Result<Snapshot, StudioError> {
            if self.fail {
                return Err(StudioError::Decode(format!("cannot decode {}", video.name)));
            }
            Ok(Snapshot {
                image_bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
                content_type: "image/jpeg".into(),
            })
        }
    }

    /// Finishes after `delay`, or never when `delay` is `None`.
    struct MockGenerator {
        delay: Option<Duration>,
        result: Result<&'static [u8], &'static str>,
        calls: AtomicU32,
    }

    impl MockGenerator {
        fn ok(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                result: Ok(&b"styled-video"[..]),
                calls: AtomicU32::new(0),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                delay: Some(Duration::from_millis(5)),
                result: Err(message),
                calls: AtomicU32::new(0),
            }
        }

        fn stuck() -> Self {
            Self {
                delay: None,
                result: Ok(&b""[..]),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl VideoGenerator for MockGenerator {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate_styled_video(
            &self,
            _snapshot: &Snapshot,
            cancel: &CancellationToken,
        ) -> Result<VideoPayload, StudioError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let wait = async {
                match self.delay {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => Err(StudioError::Generation("generation cancelled".into())),
                _ = wait => match self.result {
                    Ok(bytes) => Ok(VideoPayload {
                        bytes: Bytes::from_static(bytes),
                        content_type: "video/mp4".into(),
                    }),
                    Err(message) => Err(StudioError::Generation(message.into())),
                },
            }
        }
    }

    fn clip() -> VideoFile {
        VideoFile::new("clip.mp4", "video/mp4", vec![1u8; 2 * 1024 * 1024])
    }

    fn studio(
        extractor: MockExtractor,
        generator: Arc<MockGenerator>,
    ) -> (Studio, Arc<HandleRegistry>) {
        let registry = Arc::new(HandleRegistry::default());
        let studio = Studio::new(Arc::new(extractor), generator, registry.clone());
        (studio, registry)
    }

    #[tokio::test]
    async fn select_generate_complete() {
        let generator = Arc::new(MockGenerator::ok(Duration::from_millis(20)));
        let (studio, registry) = studio(MockExtractor { fail: false }, generator.clone());

        assert!(studio.select_file(clip()).await);
        assert_eq!(studio.subscribe().borrow().file.as_ref().unwrap().size_label, "2.00 MB");

        let task = studio.generate().await.unwrap();
        let view = studio.view().await;
        assert_eq!(view.status, Status::Generating);
        assert!(view.progress_message.is_some());

        task.await.unwrap();
        let view = studio.wait_until_settled().await;
        assert_eq!(view.status, Status::Completed);
        assert!(view.original_url.is_some());
        assert!(view.result_url.is_some());
        assert_eq!(registry.live_count(), 2);
        assert_eq!(studio.result_video().await.unwrap().bytes.as_ref(), b"styled-video");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_generate_is_refused_while_running() {
        let generator = Arc::new(MockGenerator::ok(Duration::from_millis(30)));
        let (studio, _) = studio(MockExtractor { fail: false }, generator.clone());
        studio.select_file(clip()).await;

        let first = studio.generate().await;
        let second = studio.generate().await;
        assert!(first.is_some());
        assert!(second.is_none());

        studio.wait_until_settled().await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn extraction_failure_lands_in_failed() {
        let generator = Arc::new(MockGenerator::ok(Duration::from_millis(1)));
        let (studio, registry) = studio(MockExtractor { fail: true }, generator.clone());
        studio.select_file(clip()).await;
        studio.generate().await.unwrap();

        let view = studio.wait_until_settled().await;
        assert_eq!(view.status, Status::Failed);
        assert!(view.error.unwrap().contains("cannot decode clip.mp4"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.live_count(), 1);
    }

    #[tokio::test]
    async fn download_failure_then_reset() {
        let generator = Arc::new(MockGenerator::failing(
            "Failed to download the generated video. Status: 500. Body: boom",
        ));
        let (studio, registry) = studio(MockExtractor { fail: false }, generator);
        studio.select_file(clip()).await;
        studio.generate().await.unwrap();

        let view = studio.wait_until_settled().await;
        assert_eq!(view.status, Status::Failed);
        assert!(view.error.unwrap().contains("Status: 500"));

        assert!(studio.reset().await);
        assert!(!studio.reset().await);
        assert_eq!(studio.status().await, Status::Idle);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.revoked_count(), 1);
    }

    #[tokio::test]
    async fn reset_from_completed_revokes_both() {
        let generator = Arc::new(MockGenerator::ok(Duration::from_millis(1)));
        let (studio, registry) = studio(MockExtractor { fail: false }, generator);
        studio.select_file(clip()).await;
        studio.generate().await.unwrap();
        studio.wait_until_settled().await;

        let rx = studio.subscribe();
        assert!(studio.reset().await);
        assert_eq!(rx.borrow().status, Status::Idle);
        assert!(rx.borrow().original_url.is_none());
        assert_eq!(registry.revoked_count(), 2);
        assert_eq!(registry.live_count(), 0);
        assert!(studio.result_video().await.is_none());
    }

    #[tokio::test]
    async fn shutdown_cancels_running_attempt() {
        let generator = Arc::new(MockGenerator::stuck());
        let (studio, _) = studio(MockExtractor { fail: false }, generator);
        studio.select_file(clip()).await;
        let task = studio.generate().await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        studio.shutdown();
        task.await.unwrap();

        let view = studio.view().await;
        assert_eq!(view.status, Status::Failed);
        assert!(view.error.unwrap().contains("generation cancelled"));
        assert!(studio.generate().await.is_none());
    }

    mod against_mock_service {
        use super::*;
        use axum::extract::State;
        use axum::http::StatusCode;
        use axum::response::IntoResponse;
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use flatframe_generation::{GenerationClient, PollPolicy};
        use serde_json::{json, Value};

        struct Service {
            base: String,
            polls: AtomicU32,
            download_status: StatusCode,
        }

        async fn submit(Json(_body): Json<Value>) -> Json<Value> {
            Json(json!({ "name": "operations/job-7" }))
        }

        async fn status(State(svc): State<Arc<Service>>) -> Json<Value> {
            let polls = svc.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if polls < 2 {
                return Json(json!({ "name": "operations/job-7" }));
            }
            Json(json!({
                "name": "operations/job-7",
                "done": true,
                "response": { "generateVideoResponse": { "generatedSamples": [
                    { "video": { "uri": format!("{}/files/out", svc.base) } }
                ]}}
            }))
        }

        async fn fetch(State(svc): State<Arc<Service>>) -> axum::response::Response {
            if svc.download_status == StatusCode::OK {
                Bytes::from_static(b"mp4-bytes").into_response()
            } else {
                (svc.download_status, "storage unavailable").into_response()
            }
        }

        async fn start(download_status: StatusCode) -> (Studio, Arc<Service>, Arc<HandleRegistry>) {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let svc = Arc::new(Service {
                base: base.clone(),
                polls: AtomicU32::new(0),
                download_status,
            });
            let app = Router::new()
                .route("/models/:action", post(submit))
                .route("/operations/:id", get(status))
                .route("/files/:id", get(fetch))
                .with_state(svc.clone());
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let client = GenerationClient::new("k-test")
                .with_base_url(base)
                .with_poll_policy(PollPolicy::fixed(Duration::from_millis(10)));
            let registry = Arc::new(HandleRegistry::default());
            let studio = Studio::new(
                Arc::new(MockExtractor { fail: false }),
                Arc::new(client),
                registry.clone(),
            );
            (studio, svc, registry)
        }

        #[tokio::test]
        async fn completes_after_two_polls() {
            let (studio, svc, registry) = start(StatusCode::OK).await;
            studio.select_file(clip()).await;
            assert_eq!(studio.view().await.file.unwrap().size_label, "2.00 MB");

            studio.generate().await.unwrap();
            assert_eq!(studio.status().await, Status::Generating);

            let view = studio.wait_until_settled().await;
            assert_eq!(view.status, Status::Completed);
            assert!(view.original_url.is_some() && view.result_url.is_some());
            assert_eq!(svc.polls.load(Ordering::SeqCst), 2);
            assert_eq!(studio.result_video().await.unwrap().bytes.as_ref(), b"mp4-bytes");

            studio.reset().await;
            assert_eq!(registry.created_count(), registry.revoked_count());
            assert_eq!(registry.live_count(), 0);
        }

        #[tokio::test]
        async fn server_error_on_download_fails_attempt() {
            let (studio, _, _) = start(StatusCode::INTERNAL_SERVER_ERROR).await;
            studio.select_file(clip()).await;
            studio.generate().await.unwrap();

            let view = studio.wait_until_settled().await;
            assert_eq!(view.status, Status::Failed);
            let message = view.error.unwrap();
            assert!(message.contains("Status: 500"), "{message}");
            assert!(message.contains("storage unavailable"));
        }
    }
}
