//! Panel configuration.

use std::time::Duration;

use crate::camera::{CameraRequest, Facing};

const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_FRAME_INTERVAL_MS: u64 = 66;

/// Operator panel configuration.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Base URL of the robot backend (classifier, motor and servo endpoints)
    pub server_url: String,
    /// Upper bound for one classification round trip
    pub request_timeout: Duration,
    /// Camera index to use when no rear-facing device is found
    pub camera_index: Option<u32>,
    /// Live preview refresh interval
    pub frame_interval: Duration,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            camera_index: None,
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
        }
    }
}

impl PanelConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server_url: lookup("AGRIROBO_SERVER_URL")
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            request_timeout: Duration::from_secs(
                lookup("AGRIROBO_TIMEOUT_SECS")
                    .and_then(|s| positive(&s))
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            camera_index: lookup("AGRIROBO_CAMERA_INDEX").and_then(|s| s.parse().ok()),
            frame_interval: Duration::from_millis(
                lookup("AGRIROBO_FRAME_INTERVAL_MS")
                    .and_then(|s| positive(&s))
                    .unwrap_or(DEFAULT_FRAME_INTERVAL_MS),
            ),
        }
    }

    /// Build an endpoint URL under the server base, e.g. `/api/detect-disease`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }

    pub fn camera_request(&self) -> CameraRequest {
        CameraRequest {
            facing: Facing::Environment,
            index: self.camera_index,
        }
    }
}

/// Durations of zero are rejected so the default applies instead
fn positive(value: &str) -> Option<u64> {
    value.trim().parse().ok().filter(|v| *v > 0)
}
