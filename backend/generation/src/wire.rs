//! Request and response bodies of the long-running video generation API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<Instance>,
    pub parameters: Parameters,
}

#[derive(Debug, Serialize)]
pub struct Instance {
    pub prompt: String,
    pub image: InlineImage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    pub sample_count: u32,
}

/// A job handle and, once `done`, its outcome.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<OperationError>,
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    /// Present when the service's safety filter dropped the output.
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoRef {
    pub uri: Option<String>,
}

impl Operation {
    /// URI of the first generated video, if the job produced one.
    pub fn first_video_uri(&self) -> Option<&str> {
        self.video_response()?
            .generated_samples
            .iter()
            .filter_map(|s| s.video.as_ref()?.uri.as_deref())
            .find(|uri| !uri.is_empty())
    }

    pub fn filtered_reasons(&self) -> &[String] {
        self.video_response()
            .map(|r| r.rai_media_filtered_reasons.as_slice())
            .unwrap_or_default()
    }

    fn video_response(&self) -> Option<&GenerateVideoResponse> {
        self.response.as_ref()?.generate_video_response.as_ref()
    }
}
