//! HTTP client for the long-running video generation service.
//!
//! One call to [`VideoGenerator::generate_styled_video`] makes three kinds of
//! request: submit the job, poll its status, download the finished video.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use flatframe_config::schema::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use flatframe_config::{redact_url, StudioConfig};
use flatframe_core::{Snapshot, StudioError, VideoGenerator, VideoPayload};

use crate::poll::{poll_until, PollPolicy};
use crate::prompt::STYLE_PROMPT;
use crate::wire::{InlineImage, Instance, Operation, Parameters, PredictRequest};

const FALLBACK_VIDEO_TYPE: &str = "video/mp4";

/// Video generation client.
pub struct GenerationClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    prompt: String,
    policy: PollPolicy,
}

impl GenerationClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            prompt: STYLE_PROMPT.to_string(),
            policy: PollPolicy::default(),
        }
    }

    /// Build a client from validated runtime config.
    pub fn from_config(config: &StudioConfig) -> Result<Self, StudioError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| StudioError::Config("apiKey is not set".into()))?;
        Ok(Self::new(api_key)
            .with_base_url(&config.api_base_url)
            .with_model(&config.model)
            .with_poll_policy(PollPolicy::from_config(config)))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Start a job seeded with `snapshot`.
    pub async fn submit(&self, snapshot: &Snapshot) -> Result<Operation> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, self.model);
        let body = PredictRequest {
            instances: vec![Instance {
                prompt: self.prompt.clone(),
                image: InlineImage {
                    bytes_base64_encoded: BASE64.encode(&snapshot.image_bytes),
                    mime_type: snapshot.content_type.clone(),
                },
            }],
            parameters: Parameters { sample_count: 1 },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to reach video generation service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("job submission rejected {status}: {body}");
        }

        let operation: Operation = response
            .json()
            .await
            .context("failed to parse job submission response")?;
        if operation.name.is_empty() && !operation.done {
            bail!("job submission response carried no job name");
        }
        Ok(operation)
    }

    /// Fetch the current state of job `name`.
    pub async fn get_operation(&self, name: &str) -> Result<Operation> {
        let url = format!("{}/{}", self.base_url, name.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("job status request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("job status request returned {status}: {body}");
        }

        response
            .json()
            .await
            .context("failed to parse job status response")
    }

    /// Fetch the finished video. The credential goes in the `key` query parameter.
    pub async fn download(&self, uri: &str) -> Result<VideoPayload> {
        let response = self
            .client
            .get(uri)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("video download request failed")?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                url = %redact_url(response.url().as_str()),
                status = status.as_u16(),
                "Video download failed"
            );
            let body = response.text().await.unwrap_or_default();
            bail!(
                "Failed to download the generated video. Status: {}. Body: {}",
                status.as_u16(),
                body
            );
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("video/"))
            .unwrap_or(FALLBACK_VIDEO_TYPE)
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to read generated video body")?;

        Ok(VideoPayload {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl VideoGenerator for GenerationClient {
    fn name(&self) -> &str {
        "veo"
    }

    async fn generate_styled_video(
        &self,
        snapshot: &Snapshot,
        cancel: &CancellationToken,
    ) -> Result<VideoPayload, StudioError> {
        let start = Instant::now();
        info!(
            model = %self.model,
            snapshot_bytes = snapshot.image_bytes.len(),
            "Submitting generation job"
        );

        let submitted = tokio::select! {
            _ = cancel.cancelled() => return Err(StudioError::Generation("generation cancelled".into())),
            op = self.submit(snapshot) => op.map_err(StudioError::generation)?,
        };
        let name = submitted.name.clone();
        info!(job = %name, "Generation job accepted");

        let finished = poll_until(
            &self.policy,
            cancel,
            submitted,
            |op| op.done,
            || self.get_operation(&name),
        )
        .await
        .map_err(|e| StudioError::Generation(e.to_string()))?;

        if let Some(error) = &finished.error {
            return Err(StudioError::Generation(format!(
                "job {name} failed (code {}): {}",
                error.code, error.message
            )));
        }

        let uri = match finished.first_video_uri() {
            Some(uri) => uri.to_string(),
            None => {
                let reasons = finished.filtered_reasons();
                let mut message =
                    "Video generation succeeded, but no download link was provided.".to_string();
                if !reasons.is_empty() {
                    message.push_str(&format!(" Filtered: {}", reasons.join("; ")));
                }
                return Err(StudioError::Integrity(message));
            }
        };
        debug!(job = %name, "Downloading generated video");

        let payload = tokio::select! {
            _ = cancel.cancelled() => return Err(StudioError::Generation("generation cancelled".into())),
            payload = self.download(&uri) => payload.map_err(StudioError::generation)?,
        };

        info!(
            job = %name,
            bytes = payload.bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generated video downloaded"
        );
        Ok(payload)
    }
}
