//! Motor and fertilizer servo commands.
//!
//! Both endpoints are fire-and-forget: any 2xx response counts as done and the
//! body is only logged.

use std::fmt;
use std::str::FromStr;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PanelConfig;

pub const MOTOR_PATH: &str = "/api/motor/control";
pub const SERVO_PATH: &str = "/api/servo/control";

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Robot returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Front,
    Back,
    Left,
    Right,
    Stop,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
        Direction::Stop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Front => "Forward",
            Direction::Back => "Backward",
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::Stop => "Stop",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown direction '{}', expected front|back|left|right|stop", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoAction {
    Start,
    Stop,
}

impl ServoAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ServoAction::Start => "start",
            ServoAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ServoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServoAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(ServoAction::Start),
            "stop" => Ok(ServoAction::Stop),
            _ => Err(format!("unknown servo action '{}', expected start|stop", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RobotClient {
    http: Client,
    motor_url: String,
    servo_url: String,
}

impl RobotClient {
    pub fn new(config: &PanelConfig) -> Result<Self, RobotError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            motor_url: config.endpoint(MOTOR_PATH),
            servo_url: config.endpoint(SERVO_PATH),
        })
    }

    pub async fn drive(&self, direction: Direction) -> Result<(), RobotError> {
        info!(%direction, "motor command");
        self.post(&self.motor_url, "direction", direction.as_str()).await
    }

    pub async fn servo(&self, action: ServoAction) -> Result<(), RobotError> {
        info!(%action, "servo command");
        self.post(&self.servo_url, "action", action.as_str()).await
    }

    async fn post(&self, url: &str, key: &str, value: &str) -> Result<(), RobotError> {
        let response = self.http.post(url).query(&[(key, value)]).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(RobotError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(url, "robot replied: {}", body);
        Ok(())
    }
}
