//! Leaf disease classifier HTTP client.

use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::PanelConfig;
use crate::models::{ClassificationError, ClassificationResult, ImageData};

pub const DETECT_PATH: &str = "/api/detect-disease";
pub const GENERIC_FAILURE: &str = "Failed to detect disease. Please try again.";
const UNREADABLE_RESPONSE: &str = "Classifier returned an unreadable response";

/// Error body sent by the classifier on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Client for the remote classifier.
///
/// One call to `classify` is one request; nothing is retried.
#[derive(Debug, Clone)]
pub struct ClassifierClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl ClassifierClient {
    pub fn new(config: &PanelConfig) -> Result<Self, ClassificationError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClassificationError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: config.endpoint(DETECT_PATH),
            timeout: config.request_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submit one image for classification.
    ///
    /// Without an image this fails with a client-validation error and no
    /// request is made.
    pub async fn classify(
        &self,
        image: Option<&ImageData>,
    ) -> Result<ClassificationResult, ClassificationError> {
        let image = image.ok_or_else(ClassificationError::no_image_selected)?;

        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime)
            .map_err(|e| {
                ClassificationError::client_validation(format!("invalid image type {}: {}", image.mime, e))
            })?;
        let form = Form::new().part("file", part);

        debug!(url = %self.url, file = %image.file_name, bytes = image.len(), "submitting image");

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = server_detail(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            warn!(%status, "classifier rejected image: {}", message);
            return Err(ClassificationError::server(message));
        }

        let result: ClassificationResult = serde_json::from_slice(&body).map_err(|e| {
            warn!("unreadable classifier response: {}", e);
            ClassificationError::server(UNREADABLE_RESPONSE)
        })?;

        debug!(
            label = %result.label,
            confidence = result.confidence_percent,
            "classification received"
        );
        Ok(result)
    }

    fn transport_error(&self, err: reqwest::Error) -> ClassificationError {
        warn!("classifier request failed: {}", err);
        if err.is_timeout() {
            ClassificationError::network(format!(
                "Classifier did not respond within {} seconds",
                self.timeout.as_secs()
            ))
        } else {
            ClassificationError::network(GENERIC_FAILURE)
        }
    }
}

/// The server's human-readable `detail`, when it sent a plain string
fn server_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
