//! HTTP client for the text-detection service.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use verstbot_auth::{AuthError, TokenCache};

use crate::schema;

const RECOGNITION_TIMEOUT: Duration = Duration::from_secs(25);
const LANGUAGE_HINTS: &[&str] = &["ru", "en"];

/// Recognition unavailable: the detection call failed outright.
///
/// Shape mismatches in an otherwise successful response are not errors; they
/// fail closed to empty text.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("recognition service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("recognition service returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchAnalyzeRequest<'a> {
    folder_id: &'a str,
    analyze_specs: Vec<AnalyzeSpec>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeSpec {
    content: String,
    features: Vec<Feature>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    r#type: &'static str,
    text_detection_config: TextDetectionConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TextDetectionConfig {
    language_codes: Vec<&'static str>,
}

impl Feature {
    fn text_detection() -> Self {
        Self {
            r#type: "TEXT_DETECTION",
            text_detection_config: TextDetectionConfig {
                language_codes: LANGUAGE_HINTS.to_vec(),
            },
        }
    }
}

/// Client for the batch-analyze endpoint, authorized through the shared
/// token cache.
pub struct OcrClient {
    http: Client,
    tokens: Arc<TokenCache>,
    endpoint: String,
    folder_id: String,
}

impl OcrClient {
    pub fn new(
        tokens: Arc<TokenCache>,
        endpoint: impl Into<String>,
        folder_id: impl Into<String>,
    ) -> Result<Self, OcrError> {
        let http = Client::builder().timeout(RECOGNITION_TIMEOUT).build()?;
        Ok(Self {
            http,
            tokens,
            endpoint: endpoint.into(),
            folder_id: folder_id.into(),
        })
    }

    /// Submit `image` for text detection and return the flattened text.
    ///
    /// Empty text means the service saw nothing readable (or answered with an
    /// unexpected shape); transport and status failures are returned as
    /// [`OcrError`].
    pub async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let token = self.tokens.bearer_token().await?;

        let request = BatchAnalyzeRequest {
            folder_id: &self.folder_id,
            analyze_specs: vec![AnalyzeSpec {
                content: BASE64.encode(image),
                features: vec![Feature::text_detection()],
            }],
        };

        debug!(bytes = image.len(), "submitting image for text detection");
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let text = schema::flatten_text(&body);
        if text.is_empty() {
            warn!(raw = %body, "detection response had no readable text");
        } else {
            debug!(chars = text.chars().count(), "text recognized");
        }
        Ok(text)
    }
}
