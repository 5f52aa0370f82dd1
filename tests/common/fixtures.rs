use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use agrirobo::PanelConfig;
use agrirobo::camera::{CameraBackend, CameraDescriptor, CameraRequest, CameraStream, DeviceError};
use image::{ImageBuffer, Rgb, RgbImage};
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::MockServer;

/// Creates a 64x48 leaf-green test image with the given extension and
/// returns the temp file. The file is removed when dropped.
pub fn create_test_image(extension: &str) -> NamedTempFile {
    let img = ImageBuffer::from_fn(64, 48, |x, _| Rgb([30u8, 120 + (x % 100) as u8, 40u8]));
    let file = tempfile::Builder::new()
        .suffix(&format!(".{}", extension))
        .tempfile()
        .expect("Failed to create temp image file");
    let format = image::ImageFormat::from_extension(extension).expect("Unknown image extension");
    img.save_with_format(file.path(), format)
        .expect("Failed to save test image");
    file
}

/// Config pointing every client at the mock server
pub fn config_for(server: &MockServer) -> PanelConfig {
    PanelConfig {
        server_url: server.uri(),
        request_timeout: Duration::from_secs(5),
        ..PanelConfig::default()
    }
}

/// Config pointing at a local port nothing listens on
pub fn unreachable_config() -> PanelConfig {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe port");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    PanelConfig {
        server_url: format!("http://127.0.0.1:{}", port),
        request_timeout: Duration::from_secs(2),
        ..PanelConfig::default()
    }
}

/// Classifier reply for a confident Early Blight diagnosis
pub fn early_blight_response() -> serde_json::Value {
    json!({
        "disease": "Early Blight",
        "is_healthy": false,
        "confidence": 82.0,
        "top_predictions": [
            { "name": "Early Blight", "confidence": 82.0 },
            { "name": "Late Blight", "confidence": 11.5 },
            { "name": "Healthy", "confidence": 4.25 }
        ]
    })
}

/// Open/stop counts observed by `FakeCamera`
#[derive(Debug, Default)]
pub struct CameraCounters {
    pub opened: AtomicUsize,
    pub stopped: AtomicUsize,
}

impl CameraCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// In-memory camera producing solid frames
#[derive(Debug, Default)]
pub struct FakeCamera {
    pub counters: Arc<CameraCounters>,
    pub deny: bool,
}

impl FakeCamera {
    pub fn new() -> (Self, Arc<CameraCounters>) {
        let camera = Self::default();
        let counters = Arc::clone(&camera.counters);
        (camera, counters)
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }
}

struct FakeStream {
    counters: Arc<CameraCounters>,
}

impl CameraStream for FakeStream {
    fn name(&self) -> &str {
        "Fake Rear Camera"
    }

    fn frame(&mut self) -> Result<RgbImage, DeviceError> {
        Ok(RgbImage::from_pixel(32, 24, Rgb([40, 150, 60])))
    }

    fn stop(&mut self) {
        self.counters.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

impl CameraBackend for FakeCamera {
    fn list(&self) -> Result<Vec<CameraDescriptor>, DeviceError> {
        Ok(vec![CameraDescriptor {
            index: 0,
            name: "Fake Rear Camera".to_string(),
            description: "test".to_string(),
        }])
    }

    fn open(&self, _request: &CameraRequest) -> Result<Box<dyn CameraStream>, DeviceError> {
        if self.deny {
            return Err(DeviceError::PermissionDenied);
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            counters: Arc::clone(&self.counters),
        }))
    }
}
