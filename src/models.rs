use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::preview::PreviewHandle;

/// Raw image bytes as they will be uploaded to the classifier
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Arc<[u8]>,
    pub mime: String,
    pub file_name: String,
}

impl ImageData {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
            file_name: file_name.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The currently selected image: upload bytes plus the preview used to display them.
///
/// Dropping a payload releases its preview handle.
#[derive(Debug)]
pub struct ImagePayload {
    data: ImageData,
    preview: PreviewHandle,
}

impl ImagePayload {
    pub fn new(data: ImageData, preview: PreviewHandle) -> Self {
        Self { data, preview }
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

/// One alternative label from the classifier, with its confidence in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    pub confidence: f64,
}

/// Successful classifier response.
///
/// Field names follow the `/api/detect-disease` wire format. The ranking of
/// `top_predictions` is taken as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "disease")]
    pub label: String,
    pub is_healthy: bool,
    #[serde(rename = "confidence")]
    pub confidence_percent: f64,
    #[serde(default)]
    pub top_predictions: Vec<Prediction>,
}

/// Where a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCause {
    ClientValidation,
    Device,
    Network,
    Server,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientValidation => write!(f, "client-validation"),
            Self::Device => write!(f, "device"),
            Self::Network => write!(f, "network"),
            Self::Server => write!(f, "server"),
        }
    }
}

/// A user-visible failure of the acquisition or classification steps.
/// The message is shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClassificationError {
    pub message: String,
    pub cause: ErrorCause,
}

impl ClassificationError {
    pub fn new(cause: ErrorCause, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn client_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::ClientValidation, message)
    }

    pub fn device(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::Device, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorCause::Server, message)
    }

    /// The precondition failure for submitting without a selected image
    pub fn no_image_selected() -> Self {
        Self::client_validation("no image selected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_uses_wire_names() {
        let body = r#"{
            "disease": "Early Blight",
            "is_healthy": false,
            "confidence": 82,
            "top_predictions": [
                {"name": "Early Blight", "confidence": 82},
                {"name": "Late Blight", "confidence": 12.5}
            ]
        }"#;
        let result: ClassificationResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.label, "Early Blight");
        assert!(!result.is_healthy);
        assert_eq!(result.confidence_percent, 82.0);
        assert_eq!(result.top_predictions.len(), 2);
        assert_eq!(result.top_predictions[1].confidence, 12.5);
    }

    #[test]
    fn test_missing_top_predictions_is_empty() {
        let body = r#"{"disease": "Healthy", "is_healthy": true, "confidence": 97.1}"#;
        let result: ClassificationResult = serde_json::from_str(body).unwrap();
        assert!(result.top_predictions.is_empty());
    }

    #[test]
    fn test_error_displays_message_verbatim() {
        let err = ClassificationError::server("corrupt image");
        assert_eq!(err.to_string(), "corrupt image");
        assert_eq!(err.cause.to_string(), "server");
    }
}
