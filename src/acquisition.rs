//! Acquisition controller: turns a picked file or a camera frame into the
//! single selected `ImagePayload`, and owns the camera session while it is open.

use std::io::Cursor;
use std::path::Path;

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

use crate::camera::{CameraBackend, CameraRequest, CameraSession, DeviceError};
use crate::models::{ClassificationError, ImageData, ImagePayload};
use crate::preview::{PreviewRegistry, PreviewHandle};

pub const CAPTURE_FILE_NAME: &str = "capture.jpg";
pub const CAPTURE_MIME: &str = "image/jpeg";
const JPEG_QUALITY: u8 = 90;

/// Extensions offered by the file picker
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// A file handed over by the host's file picker
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read a file from disk. Only the `image/*` type filter is applied here,
    /// the contents are not inspected.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClassificationError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        let selected = Self::new(file_name, Vec::new());
        if !selected.is_image() {
            return Err(ClassificationError::client_validation(format!(
                "{} is not an image file",
                path.display()
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            ClassificationError::client_validation(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self { bytes, ..selected })
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Owns the camera session and the selected payload.
///
/// At most one session and one payload (and so one live preview) exist at a
/// time. Clearing a previous classification is the caller's business; every
/// method that produces a payload returns `true`/`Ok` so the caller knows.
pub struct AcquisitionController<B: CameraBackend> {
    backend: B,
    request: CameraRequest,
    session: Option<CameraSession>,
    payload: Option<ImagePayload>,
    previews: PreviewRegistry,
}

impl<B: CameraBackend> AcquisitionController<B> {
    pub fn new(backend: B, request: CameraRequest) -> Self {
        Self {
            backend,
            request,
            session: None,
            payload: None,
            previews: PreviewRegistry::new(),
        }
    }

    pub fn payload(&self) -> Option<&ImagePayload> {
        self.payload.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.payload.as_ref().map(ImagePayload::preview)
    }

    pub fn camera_active(&self) -> bool {
        self.session.as_ref().is_some_and(CameraSession::is_active)
    }

    pub fn camera_name(&self) -> Option<&str> {
        self.session.as_ref().map(CameraSession::name)
    }

    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replace the payload with a picked file. `None` (picker dismissed) is a no-op.
    pub fn select_file(&mut self, file: Option<SelectedFile>) -> bool {
        let Some(file) = file else {
            return false;
        };
        tracing::info!(file = %file.file_name, bytes = file.bytes.len(), "image selected");
        self.replace_payload(ImageData::new(file.bytes, file.mime, file.file_name));
        true
    }

    /// Open the camera, closing any session that is already open first.
    pub fn open_camera(&mut self) -> Result<(), DeviceError> {
        if self.session.is_some() {
            tracing::debug!("camera already open, reopening");
            self.close_camera();
        }
        match self.backend.open(&self.request) {
            Ok(stream) => {
                let session = CameraSession::new(stream);
                tracing::info!(camera = session.name(), "camera opened");
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("unable to open camera: {}", e);
                Err(e)
            }
        }
    }

    /// Latest frame for the live preview surface.
    ///
    /// A failing stream is closed before the error is returned.
    pub fn poll_frame(&mut self) -> Result<Option<RgbImage>, DeviceError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        match session.frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(e) => {
                tracing::warn!("camera stream failed: {}", e);
                self.close_camera();
                Err(e)
            }
        }
    }

    /// Grab one frame as a JPEG payload. The session is closed afterwards
    /// whether or not the capture worked.
    pub fn capture(&mut self) -> Result<(), ClassificationError> {
        let Some(mut session) = self.session.take() else {
            return Err(ClassificationError::client_validation("camera is not active"));
        };
        let frame = session.frame();
        session.close();
        drop(session);

        let frame = frame.map_err(|e| ClassificationError::device(e.to_string()))?;
        let jpeg = encode_jpeg(&frame).map_err(|e| ClassificationError::client_validation(e.to_string()))?;
        tracing::info!(
            width = frame.width(),
            height = frame.height(),
            bytes = jpeg.len(),
            "frame captured"
        );
        self.replace_payload(ImageData::new(jpeg, CAPTURE_MIME, CAPTURE_FILE_NAME));
        Ok(())
    }

    pub fn close_camera(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    /// Release everything the controller owns
    pub fn teardown(&mut self) {
        self.close_camera();
        self.payload = None;
    }

    fn replace_payload(&mut self, data: ImageData) {
        // Release the old preview before allocating the new one
        self.payload = None;
        let preview = self.previews.allocate(data.bytes.clone());
        self.payload = Some(ImagePayload::new(data, preview));
    }
}

impl<B: CameraBackend> Drop for AcquisitionController<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, DeviceError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(frame)
        .map_err(|e| DeviceError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}
