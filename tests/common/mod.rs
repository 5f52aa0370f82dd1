#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from agrirobo for tests
pub use agrirobo::{
    ClassificationError, ClassificationResult, ClassifierClient, DetectionPipeline, ErrorCause,
    PanelConfig, SelectedFile, UiState,
    camera::{CameraBackend, CameraDescriptor, CameraRequest, CameraStream, DeviceError},
};
