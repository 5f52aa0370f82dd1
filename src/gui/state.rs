use crate::classifier::ClassifierClient;
use crate::config::PanelConfig;
use crate::robot::RobotClient;

/// Shared by every panel: configuration and the HTTP clients
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: PanelConfig,
    pub classifier: ClassifierClient,
    pub robot: RobotClient,
}

impl AppState {
    pub fn new(config: PanelConfig) -> anyhow::Result<Self> {
        Ok(Self {
            classifier: ClassifierClient::new(&config)?,
            robot: RobotClient::new(&config)?,
            config,
        })
    }
}
