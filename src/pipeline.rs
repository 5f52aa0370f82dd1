use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbImage;

use crate::acquisition::{AcquisitionController, SelectedFile};
use crate::camera::{CameraBackend, CameraRequest};
use crate::models::{ClassificationError, ClassificationResult, ErrorCause, ImageData, ImagePayload};

/// Process-wide so that a rebuilt panel never matches a response meant for an old one
static NEXT_SUBMISSION: AtomicU64 = AtomicU64::new(1);

/// Identifies one classification request in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(u64);

impl SubmissionId {
    fn next() -> Self {
        Self(NEXT_SUBMISSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// A request the caller must run and report back with `complete`
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: SubmissionId,
    pub image: ImageData,
}

/// What the detection panel currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum UiState {
    Idle,
    Previewing,
    Submitting,
    Succeeded(ClassificationResult),
    Failed(ClassificationError),
}

impl UiState {
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Previewing => "previewing",
            UiState::Submitting => "submitting",
            UiState::Succeeded(_) => "succeeded",
            UiState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Default)]
enum Outcome {
    #[default]
    None,
    Submitting(SubmissionId),
    Succeeded(ClassificationResult),
    Failed(ClassificationError),
}

/// Acquisition plus classification state for one detection panel.
///
/// Everything runs on the caller's event loop. The network call itself is
/// performed by the caller between `begin_submit` and `complete`.
pub struct DetectionPipeline<B: CameraBackend> {
    acquisition: AcquisitionController<B>,
    outcome: Outcome,
    /// Device failure raised while a request is in flight; kept apart from
    /// the outcome so the submission is not orphaned
    device_notice: Option<ClassificationError>,
    torn_down: bool,
}

impl<B: CameraBackend> DetectionPipeline<B> {
    pub fn new(backend: B, request: CameraRequest) -> Self {
        Self {
            acquisition: AcquisitionController::new(backend, request),
            outcome: Outcome::None,
            device_notice: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> UiState {
        match &self.outcome {
            Outcome::Submitting(_) => UiState::Submitting,
            Outcome::Succeeded(result) => UiState::Succeeded(result.clone()),
            Outcome::Failed(err) => UiState::Failed(err.clone()),
            Outcome::None if self.acquisition.payload().is_some() => UiState::Previewing,
            Outcome::None => UiState::Idle,
        }
    }

    pub fn acquisition(&self) -> &AcquisitionController<B> {
        &self.acquisition
    }

    pub fn payload(&self) -> Option<&ImagePayload> {
        self.acquisition.payload()
    }

    pub fn camera_active(&self) -> bool {
        self.acquisition.camera_active()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.outcome, Outcome::Submitting(_))
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        !self.torn_down && !self.is_submitting() && self.payload().is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Camera error that arrived while a classification was running
    pub fn device_notice(&self) -> Option<&ClassificationError> {
        self.device_notice.as_ref()
    }

    pub fn select_file(&mut self, file: Option<SelectedFile>) {
        if self.acquisition.select_file(file) {
            self.reset_outcome();
        }
    }

    pub fn open_camera(&mut self) {
        self.torn_down = false;
        match self.acquisition.open_camera() {
            Ok(()) => {
                self.device_notice = None;
                if matches!(&self.outcome, Outcome::Failed(err) if err.cause == ErrorCause::Device) {
                    self.outcome = Outcome::None;
                }
            }
            Err(e) => self.device_failed(ClassificationError::device(format!(
                "Unable to access camera. Please check permissions. ({})",
                e
            ))),
        }
    }

    /// Next live frame, if the camera is open. A stream failure becomes a device error.
    pub fn poll_frame(&mut self) -> Option<RgbImage> {
        match self.acquisition.poll_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.device_failed(ClassificationError::device(e.to_string()));
                None
            }
        }
    }

    /// Capture the current frame. Without an open camera this keeps an
    /// earlier device failure rather than masking it.
    pub fn capture(&mut self) {
        if !self.acquisition.camera_active() && self.has_device_failure() {
            return;
        }
        match self.acquisition.capture() {
            Ok(()) => self.reset_outcome(),
            Err(e) if e.cause == ErrorCause::Device => self.device_failed(e),
            Err(e) if self.is_submitting() => {
                tracing::warn!("capture rejected while submitting: {}", e);
                self.device_notice = Some(e);
            }
            Err(e) => self.outcome = Outcome::Failed(e),
        }
    }

    pub fn close_camera(&mut self) {
        self.acquisition.close_camera();
    }

    /// Start a classification of the selected image.
    ///
    /// Returns `None` when nothing should be sent: a request is already in
    /// flight (no-op), or no image is selected (state becomes a
    /// client-validation failure).
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if self.torn_down || self.is_submitting() {
            return None;
        }
        let Some(payload) = self.acquisition.payload() else {
            self.outcome = Outcome::Failed(ClassificationError::no_image_selected());
            return None;
        };
        let submission = Submission {
            id: SubmissionId::next(),
            image: payload.data().clone(),
        };
        tracing::debug!(id = submission.id.0, "submission started");
        self.outcome = Outcome::Submitting(submission.id);
        Some(submission)
    }

    /// Apply the outcome of a submission. Returns false when the response is
    /// stale (superseded, or the panel was torn down) and was dropped.
    pub fn complete(
        &mut self,
        id: SubmissionId,
        result: Result<ClassificationResult, ClassificationError>,
    ) -> bool {
        let in_flight = matches!(self.outcome, Outcome::Submitting(current) if current == id);
        if self.torn_down || !in_flight {
            tracing::debug!(id = id.0, "discarding stale classification response");
            return false;
        }
        self.outcome = match result {
            Ok(result) => Outcome::Succeeded(result),
            Err(err) => Outcome::Failed(err),
        };
        true
    }

    /// Release the camera and preview; later completions are discarded.
    pub fn teardown(&mut self) {
        self.acquisition.teardown();
        self.outcome = Outcome::None;
        self.device_notice = None;
        self.torn_down = true;
    }

    fn reset_outcome(&mut self) {
        // A new acquisition also orphans any in-flight submission
        self.outcome = Outcome::None;
        self.device_notice = None;
        self.torn_down = false;
    }

    fn has_device_failure(&self) -> bool {
        self.device_notice.is_some()
            || matches!(&self.outcome, Outcome::Failed(err) if err.cause == ErrorCause::Device)
    }

    /// Record a camera failure without disturbing a request in flight
    fn device_failed(&mut self, err: ClassificationError) {
        if self.is_submitting() {
            tracing::warn!("camera failed during submission: {}", err.message);
            self.device_notice = Some(err);
        } else {
            self.outcome = Outcome::Failed(err);
        }
    }
}

impl<B: CameraBackend> Drop for DetectionPipeline<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
