//! Camera device boundary.
//!
//! The acquisition controller only talks to `CameraBackend`/`CameraStream`.
//! With the `camera` feature the backend is `nokhwa`, otherwise every open
//! attempt fails with `DeviceError::Unavailable`.

use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("camera access was denied")]
    PermissionDenied,

    #[error("no camera device found")]
    NotFound,

    #[error("camera support is unavailable: {0}")]
    Unavailable(String),

    #[error("camera stream failed: {0}")]
    Stream(String),

    #[error("failed to encode captured frame: {0}")]
    Encode(String),
}

/// Which physical sensor to prefer when several are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Rear / world-facing sensor, the one pointed at the plants
    #[default]
    Environment,
    User,
    Any,
}

#[derive(Debug, Clone, Default)]
pub struct CameraRequest {
    pub facing: Facing,
    /// Explicit device index, used when no device matches `facing`
    pub index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDescriptor {
    pub index: u32,
    pub name: String,
    pub description: String,
}

impl CameraDescriptor {
    pub fn looks_like(&self, facing: Facing) -> bool {
        let text = format!("{} {}", self.name, self.description).to_lowercase();
        match facing {
            Facing::Environment => ["back", "rear", "environment", "world"]
                .iter()
                .any(|k| text.contains(k)),
            Facing::User => ["front", "user", "facetime", "integrated"]
                .iter()
                .any(|k| text.contains(k)),
            Facing::Any => true,
        }
    }
}

/// Pick the device to open: a facing match first, then the requested index,
/// then whatever comes first.
pub fn choose_device<'a>(
    devices: &'a [CameraDescriptor],
    request: &CameraRequest,
) -> Option<&'a CameraDescriptor> {
    if request.facing != Facing::Any {
        if let Some(found) = devices.iter().find(|d| d.looks_like(request.facing)) {
            return Some(found);
        }
    }
    if let Some(index) = request.index {
        if let Some(found) = devices.iter().find(|d| d.index == index) {
            return Some(found);
        }
    }
    devices.first()
}

/// An open, streaming device
pub trait CameraStream {
    fn name(&self) -> &str;

    /// Block until the next frame is available
    fn frame(&mut self) -> Result<RgbImage, DeviceError>;

    /// Stop streaming and release the device. Must be safe to call twice.
    fn stop(&mut self);
}

pub trait CameraBackend {
    fn list(&self) -> Result<Vec<CameraDescriptor>, DeviceError>;

    fn open(&self, request: &CameraRequest) -> Result<Box<dyn CameraStream>, DeviceError>;
}

impl<B: CameraBackend + ?Sized> CameraBackend for Box<B> {
    fn list(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        (**self).list()
    }

    fn open(&self, request: &CameraRequest) -> Result<Box<dyn CameraStream>, DeviceError> {
        (**self).open(request)
    }
}

/// Exclusive ownership of an open stream.
///
/// Dropping the session stops the stream, so every exit path of the
/// controller releases the device.
pub struct CameraSession {
    stream: Box<dyn CameraStream>,
    active: bool,
}

impl CameraSession {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self {
            stream,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn name(&self) -> &str {
        self.stream.name()
    }

    pub fn frame(&mut self) -> Result<RgbImage, DeviceError> {
        if !self.active {
            return Err(DeviceError::Stream("session is closed".to_string()));
        }
        self.stream.frame()
    }

    pub fn close(&mut self) {
        if self.active {
            self.stream.stop();
            self.active = false;
            tracing::debug!(camera = self.stream.name(), "camera session closed");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("name", &self.stream.name())
            .field("active", &self.active)
            .finish()
    }
}

/// Backend used when the crate is built without the `camera` feature
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBackend;

impl CameraBackend for UnavailableBackend {
    fn list(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        Ok(Vec::new())
    }

    fn open(&self, _request: &CameraRequest) -> Result<Box<dyn CameraStream>, DeviceError> {
        Err(DeviceError::Unavailable(
            "built without the `camera` feature".to_string(),
        ))
    }
}

#[cfg(feature = "camera")]
pub use native::NokhwaBackend;

/// The backend the binary uses by default
pub fn default_backend() -> Box<dyn CameraBackend> {
    #[cfg(feature = "camera")]
    {
        Box::new(NokhwaBackend::new())
    }
    #[cfg(not(feature = "camera"))]
    {
        Box::new(UnavailableBackend)
    }
}

#[cfg(feature = "camera")]
mod native {
    use image::RgbImage;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{ApiBackend, CameraIndex, CameraInfo, RequestedFormat, RequestedFormatType};
    use nokhwa::{Camera, NokhwaError};

    use super::{CameraBackend, CameraDescriptor, CameraRequest, CameraStream, DeviceError, choose_device};

    #[derive(Debug, Default, Clone, Copy)]
    pub struct NokhwaBackend;

    impl NokhwaBackend {
        pub fn new() -> Self {
            Self
        }
    }

    fn map_error(err: NokhwaError) -> DeviceError {
        let text = err.to_string();
        let lower = text.to_lowercase();
        if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
            DeviceError::PermissionDenied
        } else {
            DeviceError::Stream(text)
        }
    }

    /// Devices addressed by a string (IP cameras and the like) cannot be
    /// opened by index and are skipped
    fn describe(info: &CameraInfo) -> Option<CameraDescriptor> {
        let index = info.index().as_index().ok()?;
        Some(CameraDescriptor {
            index,
            name: info.human_name(),
            description: info.description().to_string(),
        })
    }

    impl CameraBackend for NokhwaBackend {
        fn list(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
            let cameras = nokhwa::query(ApiBackend::Auto).map_err(map_error)?;
            Ok(cameras.iter().filter_map(describe).collect())
        }

        fn open(&self, request: &CameraRequest) -> Result<Box<dyn CameraStream>, DeviceError> {
            let devices = self.list()?;
            let device = choose_device(&devices, request).ok_or(DeviceError::NotFound)?;
            tracing::info!(index = device.index, name = %device.name, "opening camera");

            let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
            let mut camera = Camera::new(CameraIndex::Index(device.index), format).map_err(map_error)?;
            camera.open_stream().map_err(map_error)?;

            Ok(Box::new(NokhwaStream {
                camera,
                name: device.name.clone(),
                streaming: true,
            }))
        }
    }

    struct NokhwaStream {
        camera: Camera,
        name: String,
        streaming: bool,
    }

    impl CameraStream for NokhwaStream {
        fn name(&self) -> &str {
            &self.name
        }

        fn frame(&mut self) -> Result<RgbImage, DeviceError> {
            let buffer = self.camera.frame().map_err(map_error)?;
            let decoded = buffer.decode_image::<RgbFormat>().map_err(map_error)?;
            let (width, height) = (decoded.width(), decoded.height());
            // Rebuild with our own `image` version in case nokhwa pins another
            RgbImage::from_raw(width, height, decoded.into_raw())
                .ok_or_else(|| DeviceError::Stream("frame buffer size mismatch".to_string()))
        }

        fn stop(&mut self) {
            if self.streaming {
                if let Err(e) = self.camera.stop_stream() {
                    tracing::warn!(camera = %self.name, "failed to stop camera stream: {}", e);
                }
                self.streaming = false;
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(index: u32, name: &str) -> CameraDescriptor {
        CameraDescriptor {
            index,
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_prefers_rear_camera() {
        let devices = vec![device(0, "Front Camera"), device(1, "Back Camera")];
        let chosen = choose_device(&devices, &CameraRequest::default()).unwrap();
        assert_eq!(chosen.index, 1);
    }

    #[test]
    fn test_falls_back_to_index_then_first() {
        let devices = vec![device(0, "USB Cam A"), device(3, "USB Cam B")];
        let request = CameraRequest {
            facing: Facing::Environment,
            index: Some(3),
        };
        assert_eq!(choose_device(&devices, &request).unwrap().index, 3);

        let request = CameraRequest {
            facing: Facing::Environment,
            index: Some(7),
        };
        assert_eq!(choose_device(&devices, &request).unwrap().index, 0);
        assert!(choose_device(&[], &request).is_none());
    }

    #[test]
    fn test_unavailable_backend_never_opens() {
        let err = UnavailableBackend.open(&CameraRequest::default()).err().unwrap();
        assert!(matches!(err, DeviceError::Unavailable(_)));
    }
}
