pub mod acquisition;
pub mod camera;
pub mod classifier;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod presenter;
pub mod preview;
pub mod robot;

pub use acquisition::{AcquisitionController, SelectedFile};
pub use camera::{CameraBackend, CameraRequest, CameraStream, DeviceError, Facing};
pub use classifier::ClassifierClient;
pub use config::PanelConfig;
pub use models::{
    ClassificationError, ClassificationResult, ErrorCause, ImageData, ImagePayload, Prediction,
};
pub use pipeline::{DetectionPipeline, Submission, SubmissionId, UiState};
pub use presenter::{PanelView, ResultView, present};
pub use robot::{Direction, RobotClient, RobotError, ServoAction};

#[cfg(feature = "gui")]
pub mod gui;
